//! Input object mutations with a client supplied correlation token.
//! See: https://relay.dev/docs/guides/graphql-server-specification/#mutations

use super::self_prelude::*;
use modelql_lib::defaults::CLIENT_MUTATION_ID;

#[extension_trait]
pub impl MutationTypeRef for TypeRef {
    fn mutation_input(name: impl Into<String>) -> String {
        format!("{}Input", name.into())
    }
    fn mutation_payload(name: impl Into<String>) -> String {
        format!("{}Payload", name.into())
    }
}

#[extension_trait]
pub impl MutationInputObject for InputObject {
    fn new_mutation_input(name: impl Into<String>) -> Self {
        Self::new(TypeRef::mutation_input(name)).field(InputValue::new(
            CLIENT_MUTATION_ID,
            TypeRef::named(TypeRef::STRING),
        ))
    }
}

#[extension_trait]
pub impl MutationPayloadObject for Object {
    fn new_mutation_payload<Resolver: MutationPayloadResolver>(
        name: impl Into<String>,
    ) -> Self {
        Self::new(TypeRef::mutation_payload(name)).field(Field::new(
            CLIENT_MUTATION_ID,
            TypeRef::named(TypeRef::STRING),
            Resolver::resolve_client_mutation_id,
        ))
    }
}

pub trait MutationPayloadResolver: Send + Sync + 'static {
    fn resolve_client_mutation_id(ctx: ResolverContext) -> FieldFuture;
}

#[extension_trait]
pub impl MutationField for Field {
    fn mutation_input_argument(self, name: impl Into<String>) -> Self {
        self.argument(InputValue::new(
            "input",
            TypeRef::named_nn(TypeRef::mutation_input(name)),
        ))
    }
}
