//! Output type classification.
//!
//! [`classify`] is a pure function of the static shape, the field name and an
//! optional element annotation, checked against the set of registered type
//! names.

use crate::naming::strip_wrapper_suffix;
use crate::shape::{Shape, Wrapper};
use crate::spec::{ConnectionTypeRef, EdgeTypeRef};
use async_graphql::dynamic::TypeRef;
use std::collections::HashSet;
use strum::{AsRefStr, Display};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum OutputKind {
    Scalar,
    ScalarList,
    Object,
    Connection,
    Edge,
    /// A hand-built field; `element` holds its full type.
    Raw,
}

impl OutputKind {
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Self::Connection | Self::Edge)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Type `{0}` is not registered")]
    UnknownType(String),
    #[error("Cannot infer the element type of {wrapper} field `{field}`: name must end in `{wrapper}`")]
    CannotInferElement { field: String, wrapper: Wrapper },
    #[error("Lists of lists are not supported")]
    NestedList,
    #[error("Lists of {0} placeholders are not supported")]
    PlaceholderList(Wrapper),
    #[error("Unsupported type `{0}`")]
    Unsupported(&'static str),
}

/// Field name plus an optional explicit element type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldHint<'a> {
    pub field: &'a str,
    pub element: Option<&'a str>,
}

impl<'a> FieldHint<'a> {
    pub fn new(field: &'a str) -> Self {
        Self {
            field,
            element: None,
        }
    }

    pub fn with_element(mut self, element: Option<&'a str>) -> Self {
        self.element = element;
        self
    }
}

/// Result of classifying a field's output shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Classified {
    pub kind: OutputKind,
    /// Scalar or object type name of the element.
    pub element: String,
    pub nullable: bool,
}

impl Classified {
    pub fn new(kind: OutputKind, element: impl Into<String>, nullable: bool) -> Self {
        Self {
            kind,
            element: element.into(),
            nullable,
        }
    }

    /// Name of the schema type the field points at.
    pub fn type_name(&self) -> String {
        match self.kind {
            OutputKind::Connection => TypeRef::connection(&self.element),
            OutputKind::Edge => TypeRef::edge(&self.element),
            _ => self.element.clone(),
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        match (self.kind, self.nullable) {
            (OutputKind::ScalarList, false) => TypeRef::named_nn_list_nn(&self.element),
            (OutputKind::ScalarList, true) => TypeRef::named_nn_list(&self.element),
            (_, false) => TypeRef::named_nn(self.type_name()),
            (_, true) => TypeRef::named(self.type_name()),
        }
    }
}

pub fn classify(
    shape: &Shape,
    hint: FieldHint<'_>,
    known: &HashSet<String>,
) -> Result<Classified, MapError> {
    let (shape, nullable) = shape.strip_optional();
    let (element, is_list) = match shape {
        Shape::List(inner) => (inner.strip_optional().0, true),
        other => (other, false),
    };

    match element {
        Shape::List(_) => Err(MapError::NestedList),
        Shape::Unsupported(what) => Err(MapError::Unsupported(*what)),
        Shape::Scalar(kind) => {
            let kind_out = if is_list {
                OutputKind::ScalarList
            } else {
                OutputKind::Scalar
            };
            Ok(Classified::new(kind_out, kind.type_name(), nullable))
        }
        Shape::Optional(_) => unreachable!("optional layers are stripped"),
        Shape::Record(record) => {
            if !known.contains(record.name()) {
                return Err(MapError::UnknownType(record.name().to_string()));
            }
            let kind = if is_list {
                OutputKind::Connection
            } else {
                OutputKind::Object
            };
            Ok(Classified::new(kind, record.name(), nullable))
        }
        Shape::Placeholder(wrapper) => {
            if is_list {
                return Err(MapError::PlaceholderList(*wrapper));
            }
            let element = match hint.element {
                Some(element) => element.to_string(),
                None => strip_wrapper_suffix(hint.field, wrapper.suffix()).ok_or_else(
                    || MapError::CannotInferElement {
                        field: hint.field.to_string(),
                        wrapper: *wrapper,
                    },
                )?,
            };
            if !known.contains(&element) {
                return Err(MapError::UnknownType(element));
            }
            let kind = match wrapper {
                Wrapper::Edge => OutputKind::Edge,
                Wrapper::Connection => OutputKind::Connection,
            };
            Ok(Classified::new(kind, element, nullable))
        }
    }
}
