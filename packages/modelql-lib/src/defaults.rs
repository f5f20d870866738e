pub const STRICT: bool = false;

pub const MUTATION_TYPE_NAME: &str = "Mutation";
pub const NODE_INTERFACE_NAME: &str = "Node";

pub const PLURAL_NODE_FIELD: bool = true;
pub const INTROSPECTION: bool = true;

pub const VERBOSE_LOGGING: bool = false;
pub const LOG_LEVEL: &str = "info";

/// Prefix stripped from method names when bulk-deriving resolved fields.
pub const RESOLVER_METHOD_PREFIX: &str = "get_";

/// Input member carrying the client supplied correlation token of a mutation.
pub const CLIENT_MUTATION_ID: &str = "clientMutationId";
