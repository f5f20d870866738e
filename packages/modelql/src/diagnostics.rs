//! Non-fatal build issues. The offending field or type is dropped.

use crate::mapper::MapError;
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("Type `{0}` is already registered, dropping the later registration")]
    DuplicateType(String),
    #[error("`{type_name}` has no member `{member}`")]
    UnknownMember { type_name: String, member: String },
    #[error("`{type_name}` has no method `{method}`")]
    UnknownMethod { type_name: String, method: String },
    #[error("Field `{type_name}.{field}` is already defined")]
    DuplicateField { type_name: String, field: String },
    #[error("Cannot map field `{type_name}.{field}`: {error}")]
    Unmappable {
        type_name: String,
        field: String,
        error: MapError,
    },
    #[error("Field `{type_name}.{field}` uses auto-args but its method does not take a single input record")]
    AutoArgsRequireRecord { type_name: String, field: String },
    #[error("Field `{type_name}.{field}` declares {declared} argument(s) but its method takes {expected}")]
    ArgumentCountMismatch {
        type_name: String,
        field: String,
        declared: usize,
        expected: usize,
    },
    #[error("Argument `{argument}` of `{type_name}.{field}` is not a scalar")]
    NonScalarArgument {
        type_name: String,
        field: String,
        argument: String,
    },
    #[error("Default {literal:?} of argument `{argument}` on `{type_name}.{field}` cannot be parsed")]
    InvalidDefault {
        type_name: String,
        field: String,
        argument: String,
        literal: String,
    },
    #[error("Argument `{argument}` of connection field `{type_name}.{field}` collides with a pagination argument")]
    ArgumentShadowsPaging {
        type_name: String,
        field: String,
        argument: String,
    },
    #[error("Required argument `{argument}` of `{type_name}.{field}` is hidden by a pagination argument and has no default")]
    RequiredArgumentHidden {
        type_name: String,
        field: String,
        argument: String,
    },
    #[error("Mutation `{field}` uses auto-outputs but its method does not return a single record")]
    AutoOutputsRequireRecord { field: String },
    #[error("Mutation `{field}` declares {declared} output(s) but its method returns {expected}")]
    OutputCountMismatch {
        field: String,
        declared: usize,
        expected: usize,
    },
    #[error("Type `{0}` has no id field and is compiled without the node interface")]
    MissingIdField(String),
    #[error("Type `{0}` is not the mutation root, its mutation fields are ignored")]
    MutationOutsideRoot(String),
}

/// Collects diagnostics and mirrors each one to the log.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.0.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn any(&self, predicate: impl Fn(&Diagnostic) -> bool) -> bool {
        self.0.iter().any(predicate)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
