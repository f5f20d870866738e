//! Global object identification.
//! See: https://graphql.org/learn/global-object-identification/

use crate::shape::Instance;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    str::FromStr,
    sync::Arc,
};
use thiserror::Error;
use tracing::debug;

const DELIMITER: char = ':';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Global ID is not valid base64: {0:?}")]
    Encoding(String),
    #[error("Global ID has no type tag: {0:?}")]
    MissingTypeTag(String),
}

/// A (type name, local id) pair, exchanged as an opaque base64 string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GlobalId {
    pub type_name: String,
    pub local_id: String,
}

impl GlobalId {
    pub fn new(type_name: impl Into<String>, local_id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            local_id: local_id.into(),
        }
    }

    /// Type names never contain the delimiter, so only the first one splits.
    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}{}{}", self.type_name, DELIMITER, self.local_id))
    }

    pub fn decode(opaque: &str) -> Option<Self> {
        opaque.parse().ok()
    }
}

impl FromStr for GlobalId {
    type Err = IdentityError;

    fn from_str(opaque: &str) -> Result<Self, Self::Err> {
        let bytes = STANDARD
            .decode(opaque)
            .map_err(|_| IdentityError::Encoding(opaque.to_string()))?;
        let text =
            String::from_utf8(bytes).map_err(|_| IdentityError::Encoding(opaque.to_string()))?;
        let (type_name, local_id) = text
            .split_once(DELIMITER)
            .filter(|(type_name, _)| !type_name.is_empty())
            .ok_or_else(|| IdentityError::MissingTypeTag(opaque.to_string()))?;
        Ok(Self::new(type_name, local_id))
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

pub type IdResolver = Arc<dyn Fn(&str) -> Option<Instance> + Send + Sync>;
pub type IdAccessor = Arc<dyn Fn(&Instance) -> Option<String> + Send + Sync>;

/// Resolves opaque ids back to instances of identity-bearing types.
#[derive(Clone, Default)]
pub struct GlobalIdentity {
    resolvers: HashMap<String, IdResolver>,
    node_types: HashSet<String>,
}

impl GlobalIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node_type(&mut self, type_name: impl Into<String>, resolver: Option<IdResolver>) {
        let type_name = type_name.into();
        if let Some(resolver) = resolver {
            self.resolvers.insert(type_name.clone(), resolver);
        }
        self.node_types.insert(type_name);
    }

    pub fn is_node_type(&self, type_name: &str) -> bool {
        self.node_types.contains(type_name)
    }

    pub fn encode(&self, type_name: &str, local_id: &str) -> String {
        GlobalId::new(type_name, local_id).encode()
    }

    pub fn decode(&self, opaque: &str) -> Option<GlobalId> {
        GlobalId::decode(opaque)
    }

    /// Malformed ids and unregistered type tags resolve to `None`.
    pub fn resolve_instance(&self, opaque: &str) -> Option<Instance> {
        let id = GlobalId::decode(opaque)?;
        let Some(resolver) = self.resolvers.get(&id.type_name) else {
            debug!("No ID resolver registered for type {}", id.type_name);
            return None;
        };
        resolver(&id.local_id)
    }

    pub fn resolve_concrete_type<'a>(&'a self, instance: &Instance) -> Option<&'a str> {
        self.node_types
            .get(instance.type_name())
            .map(String::as_str)
    }

    /// Instance and concrete type name for an opaque id.
    pub fn resolve_node(&self, opaque: &str) -> Option<(Instance, String)> {
        let instance = self.resolve_instance(opaque)?;
        let type_name = self.resolve_concrete_type(&instance)?.to_string();
        Some((instance, type_name))
    }
}

impl fmt::Debug for GlobalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalIdentity")
            .field("node_types", &self.node_types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Member, Record};
    use assert_matches::assert_matches;

    struct Todo {
        id: String,
    }

    impl Record for Todo {
        fn members() -> Vec<Member<Self>> {
            vec![Member::new("id", |t: &Todo| t.id.clone())]
        }
    }

    struct Draft;

    impl Record for Draft {
        fn members() -> Vec<Member<Self>> {
            vec![]
        }
    }

    fn identity() -> GlobalIdentity {
        let mut identity = GlobalIdentity::new();
        identity.add_node_type(
            "Todo",
            Some(Arc::new(|id: &str| {
                (id != "missing").then(|| Instance::new(Todo { id: id.to_string() }))
            })),
        );
        identity.add_node_type("User", None);
        identity
    }

    #[test]
    fn test_roundtrip() {
        for (type_name, local_id) in [
            ("Todo", "0"),
            ("User", "me"),
            ("Todo", "with:colons:inside"),
            ("Todo", ""),
            ("Todo", "ünïcødé"),
        ] {
            let id = GlobalId::new(type_name, local_id);
            assert_eq!(GlobalId::decode(&id.encode()), Some(id));
        }
    }

    #[test]
    fn test_known_encoding() {
        assert_eq!(GlobalId::new("Todo", "1").encode(), "VG9kbzox");
        assert_eq!(GlobalId::new("Todo", "1").to_string(), "VG9kbzox");
    }

    #[test]
    fn test_malformed() {
        assert_matches!("%%%".parse::<GlobalId>(), Err(IdentityError::Encoding(_)));
        let untagged = STANDARD.encode("no-delimiter");
        assert_matches!(
            untagged.parse::<GlobalId>(),
            Err(IdentityError::MissingTypeTag(_))
        );
        assert_eq!(GlobalId::decode(&STANDARD.encode(":1")), None);
    }

    #[test]
    fn test_resolve_instance() {
        let identity = identity();
        let todo = identity
            .resolve_instance(&identity.encode("Todo", "7"))
            .unwrap();
        assert_eq!(todo.downcast_ref::<Todo>().unwrap().id, "7");
        assert_eq!(identity.resolve_concrete_type(&todo), Some("Todo"));

        assert!(identity
            .resolve_instance(&identity.encode("Todo", "missing"))
            .is_none());
        assert!(identity
            .resolve_instance(&identity.encode("User", "me"))
            .is_none());
        assert!(identity
            .resolve_instance(&identity.encode("Unregistered", "1"))
            .is_none());
        assert!(identity.resolve_instance("not base64!").is_none());
    }

    #[test]
    fn test_resolve_concrete_type() {
        let identity = identity();
        assert_eq!(identity.resolve_concrete_type(&Instance::new(Draft)), None);
        let (_, type_name) = identity.resolve_node(&identity.encode("Todo", "1")).unwrap();
        assert_eq!(type_name, "Todo");
    }
}
