//! See: https://relay.dev/graphql/connections.htm#sec-Edge-Types

use super::paging::*;
use super::self_prelude::*;

#[extension_trait]
pub impl EdgeTypeRef for TypeRef {
    fn edge(node_name: impl Into<String>) -> String {
        format!("{}Edge", node_name.into())
    }
}

#[extension_trait]
pub impl EdgeObject for Object {
    fn new_edge<Resolver: EdgeResolver>(node_name: impl Into<String>) -> Self {
        let node_name = node_name.into();
        Self::new(TypeRef::edge(&node_name))
            .field(Field::new(
                "node",
                TypeRef::named(&node_name),
                Resolver::resolve_node,
            ))
            .field(Field::new(
                "cursor",
                TypeRef::named_nn(TypeRef::CURSOR),
                Resolver::resolve_cursor,
            ))
    }
}

pub trait EdgeResolver: Send + Sync + 'static {
    fn resolve_node(ctx: ResolverContext) -> FieldFuture;
    fn resolve_cursor(ctx: ResolverContext) -> FieldFuture;
}
