//! Offset based cursor pagination over in-memory lists.
//! See: https://relay.dev/graphql/connections.htm#sec-Pagination-algorithm

use crate::connection::{Connection, Edge};
use crate::shape::Output;
use async_graphql_value::ConstValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use std::num::IntErrorKind;

pub type Cursor = String;

const CURSOR_PREFIX: &str = "arrayconnection:";

pub const PAGING_ARGUMENTS: [&str; 4] = ["first", "after", "last", "before"];

pub type PagingResult<T> = core::result::Result<T, PagingError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PagingError {
    #[error("Argument `first` must be a non-negative integer, got {0}")]
    NegativeFirst(i64),
    #[error("Argument `last` must be a non-negative integer, got {0}")]
    NegativeLast(i64),
    #[error("Invalid cursor: {0:?}")]
    InvalidCursor(String),
    #[error("Argument `{0}` has an unexpected type")]
    InvalidArgument(&'static str),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<Cursor>,
    pub end_cursor: Option<Cursor>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PagingArgs {
    pub first: Option<i64>,
    pub after: Option<Cursor>,
    pub last: Option<i64>,
    pub before: Option<Cursor>,
}

impl PagingArgs {
    pub fn forward(first: i64) -> Self {
        Self {
            first: Some(first),
            ..Self::default()
        }
    }

    pub fn backward(last: i64) -> Self {
        Self {
            last: Some(last),
            ..Self::default()
        }
    }

    /// Read the pagination arguments out of a field's argument map.
    pub fn from_args(args: &IndexMap<String, ConstValue>) -> PagingResult<Self> {
        Ok(Self {
            first: int_arg(args, "first")?,
            after: string_arg(args, "after")?,
            last: int_arg(args, "last")?,
            before: string_arg(args, "before")?,
        })
    }
}

fn int_arg(args: &IndexMap<String, ConstValue>, name: &'static str) -> PagingResult<Option<i64>> {
    match args.get(name) {
        None | Some(ConstValue::Null) => Ok(None),
        Some(ConstValue::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or(PagingError::InvalidArgument(name)),
        Some(_) => Err(PagingError::InvalidArgument(name)),
    }
}

fn string_arg(
    args: &IndexMap<String, ConstValue>,
    name: &'static str,
) -> PagingResult<Option<Cursor>> {
    match args.get(name) {
        None | Some(ConstValue::Null) => Ok(None),
        Some(ConstValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(PagingError::InvalidArgument(name)),
    }
}

pub fn cursor_for_offset(offset: usize) -> Cursor {
    STANDARD.encode(format!("{CURSOR_PREFIX}{offset}"))
}

pub fn offset_from_cursor(cursor: &str) -> PagingResult<usize> {
    let invalid = || PagingError::InvalidCursor(cursor.to_string());
    let bytes = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    let digits = text.strip_prefix(CURSOR_PREFIX).ok_or_else(invalid)?;
    match digits.parse::<usize>() {
        Ok(offset) => Ok(offset),
        // Offsets beyond the address space can only point past the end.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(usize::MAX),
        Err(_) => Err(invalid()),
    }
}

/// Slice `items` into a page of edges according to `args`.
///
/// Cursor offsets at or beyond the end of `items` select an empty window
/// instead of failing.
pub fn connection_from_slice(items: Vec<Output>, args: &PagingArgs) -> PagingResult<Connection> {
    let length = items.len();

    let after_offset = args
        .after
        .as_deref()
        .map(offset_from_cursor)
        .transpose()?;
    let before_offset = args
        .before
        .as_deref()
        .map(offset_from_cursor)
        .transpose()?;

    let lower_bound = after_offset
        .map_or(0, |after| after.saturating_add(1))
        .min(length);
    let upper_bound = before_offset.map_or(length, |before| before.min(length));

    let mut start = lower_bound;
    let mut end = upper_bound;

    if let Some(first) = args.first {
        let count = usize::try_from(first).map_err(|_| PagingError::NegativeFirst(first))?;
        end = end.min(start.saturating_add(count));
    }
    if let Some(last) = args.last {
        let count = usize::try_from(last).map_err(|_| PagingError::NegativeLast(last))?;
        start = start.max(end.saturating_sub(count));
    }

    let edges = if start < end {
        items
            .into_iter()
            .enumerate()
            .skip(start)
            .take(end - start)
            .map(|(offset, node)| Edge::at(offset, node))
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };

    let page_info = PageInfo {
        has_previous_page: args.last.is_some() && start > lower_bound,
        has_next_page: args.first.is_some() && end < upper_bound,
        start_cursor: edges.first().map(|edge| edge.cursor.clone()),
        end_cursor: edges.last().map(|edge| edge.cursor.clone()),
    };

    Ok(Connection {
        total_count: length,
        edges,
        page_info,
    })
}
