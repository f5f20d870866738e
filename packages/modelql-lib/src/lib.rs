//! # modelql-lib
//!
//! `modelql-lib` is a collection of utilities used by the various `modelql-*` crates.

pub mod config;
pub mod defaults;
pub mod utils;

pub use config::{SchemaConfig, SchemaConfigError, SchemaConfigResult};
