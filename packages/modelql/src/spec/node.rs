//! `async_graphql::dynamic` extensions for handling GraphQL nodes.
//! See: https://graphql.org/learn/global-object-identification/#node-interface

use super::self_prelude::*;

#[extension_trait]
pub impl SchemaBuilderNodeExt for SchemaBuilder {
    fn register_node_types(self, interface_name: impl Into<String>) -> Self {
        self.register(Interface::new_node(interface_name))
    }
}

#[extension_trait]
pub impl InterfaceNodeExt for Interface {
    fn new_node(name: impl Into<String>) -> Self {
        Self::new(name).node_fields()
    }

    fn node_fields(self) -> Self {
        self.field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)))
    }
}

#[extension_trait]
pub impl ObjectNodeExt for Object {
    /// Implement the node interface, with `id` resolved by `resolver_fn`.
    fn node_id_field<F>(self, interface_name: impl Into<String>, resolver_fn: F) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        self.implement(interface_name).field(
            Field::new("id", TypeRef::named_nn(TypeRef::ID), resolver_fn)
                .description("The ID of an object."),
        )
    }
}
