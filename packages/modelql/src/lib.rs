//! # modelql
//!
//! Derive a Relay-compliant GraphQL schema from a Rust object model.
//!
//! Types describe themselves through [`Record`]. A [`Registry`] collects them
//! with their roles and exposed fields, and [`Registry::compile`] produces an
//! executable `async_graphql::dynamic::Schema` with node identification,
//! cursor connections and input object mutations.

#![allow(clippy::result_large_err)]

pub mod compile;
pub mod connection;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod mapper;
pub mod mutation;
pub mod naming;
pub mod node;
pub mod paging;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod shape;
pub mod spec;

pub use compile::{CompiledSchema, FieldLayout, SchemaLayout, TypeLayout};
pub use connection::{Connection, Edge};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use extension::{NullSlots, PartialResults};
pub use error::{CompileError, CompileResult, FieldError, FieldErrorKind, FieldResult};
pub use mapper::{Classified, MapError, OutputKind};
pub use mutation::MutationPayload;
pub use node::{GlobalId, GlobalIdentity};
pub use paging::{PageInfo, PagingArgs, PagingError};
pub use record::{Member, Method, Record};
pub use registry::{
    ArgInfo, ArgSpec, OutputInfo, OutputOverride, OutputSpec, RawField, Registry, TypeBuilder,
};
pub use shape::{Id, Instance, Output, ScalarKind, Shape, Shaped, Text};

pub use modelql_lib::SchemaConfig;
