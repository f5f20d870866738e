//! `async_graphql::dynamic` extensions for the Relay server specification.
//!
//! GraphQL Spec: https://spec.graphql.org/draft/
//! GraphQL Cursor Connections Spec: https://relay.dev/graphql/connections.htm
//! Global Object Identification: https://graphql.org/learn/global-object-identification/
//! Relay Input Object Mutations: https://relay.dev/docs/guides/graphql-server-specification/#mutations

pub mod connection;
pub mod edge;
pub mod mutation;
pub mod node;
pub mod paging;
pub mod query;

pub(self) mod self_prelude {
    pub use async_graphql::dynamic::*;
    pub use extension_trait::extension_trait;
}

pub use connection::*;
pub use edge::*;
pub use mutation::*;
pub use node::*;
pub use paging::*;
pub use query::*;
