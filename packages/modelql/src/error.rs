use crate::diagnostics::Diagnostics;
use crate::paging::PagingError;
use strum::{AsRefStr, Display};
use thiserror::Error;

pub type CompileResult<T> = core::result::Result<T, CompileError>;
pub type FieldResult<T> = core::result::Result<T, FieldError>;

/// Fatal schema build errors.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("No type was declared as the query root")]
    NoQueryRoot,
    #[error("More than one type was declared as the query root: {0:?}")]
    DuplicateQueryRoot(Vec<String>),
    #[error("More than one type was declared as the mutation root: {0:?}")]
    DuplicateMutationRoot(Vec<String>),
    #[error("Schema rejected by the execution engine: {0}")]
    Schema(String),
    #[error("Strict mode rejected {} build diagnostic(s): {}", .0.len(), .0)]
    Strict(Diagnostics),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
pub enum FieldErrorKind {
    Validation,
    Dispatch,
    Invocation,
}

/// Request time errors, scoped to a single field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Missing required argument `{argument}` for field `{field}`")]
    MissingArgument { field: String, argument: String },
    #[error("Invalid value for argument `{argument}`: {message}")]
    InvalidArgument { argument: String, message: String },
    #[error("No receiver available for field `{field}`")]
    MissingReceiver { field: String },
    #[error("Expected a receiver of type `{expected}`, found `{found}`")]
    ReceiverMismatch { expected: String, found: String },
    #[error("Resolver for field `{field}` panicked: {message}")]
    Panicked { field: String, message: String },
    #[error("{0}")]
    Resolver(String),
    #[error(transparent)]
    Paging(#[from] PagingError),
}

impl FieldError {
    pub fn kind(&self) -> FieldErrorKind {
        match self {
            Self::MissingArgument { .. } | Self::InvalidArgument { .. } | Self::Paging(_) => {
                FieldErrorKind::Validation
            }
            Self::MissingReceiver { .. } | Self::ReceiverMismatch { .. } => {
                FieldErrorKind::Dispatch
            }
            Self::Panicked { .. } | Self::Resolver(_) => FieldErrorKind::Invocation,
        }
    }
}
