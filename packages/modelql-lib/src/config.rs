use crate::defaults;
use serde::Deserialize;
use std::{fs::File, path::Path};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type returned by configuration operations.
#[derive(Error, Debug)]
pub enum SchemaConfigError {
    #[error("Error processing file: {0:?}")]
    ConfigFileError(#[from] std::io::Error),
    #[error("Error processing YAML file: {0:?}")]
    SerdeYamlError(#[from] serde_yaml::Error),
    #[error("Invalid GraphQL type name for `{key}`: {name:?}")]
    InvalidTypeName { key: &'static str, name: String },
}

/// Result type returned by configuration operations.
pub type SchemaConfigResult<T> = core::result::Result<T, SchemaConfigError>;

/// Schema compilation configuration.
#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SchemaConfig {
    /// Treat every build diagnostic as a fatal error.
    pub strict: bool,

    /// Name of the compiled root mutation object.
    pub mutation_type_name: String,

    /// Name of the global object identification interface.
    pub node_interface_name: String,

    /// Add the plural `nodes(ids:)` field to the query root.
    pub plural_node_field: bool,

    /// Allow schema introspection queries.
    pub introspection: bool,

    /// Maximum query depth accepted by the compiled schema.
    pub max_depth: Option<usize>,

    /// Maximum query complexity accepted by the compiled schema.
    pub max_complexity: Option<usize>,

    /// Verbose logging.
    pub verbose: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            strict: defaults::STRICT,
            mutation_type_name: defaults::MUTATION_TYPE_NAME.to_string(),
            node_interface_name: defaults::NODE_INTERFACE_NAME.to_string(),
            plural_node_field: defaults::PLURAL_NODE_FIELD,
            introspection: defaults::INTROSPECTION,
            max_depth: None,
            max_complexity: None,
            verbose: defaults::VERBOSE_LOGGING,
        }
    }
}

impl SchemaConfig {
    /// Load a configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaConfigResult<Self> {
        let path = path.as_ref();
        info!("Loading schema configuration from {}", path.display());
        let file = File::open(path)?;
        let config: SchemaConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        debug!("Loaded {config:?}");
        Ok(config)
    }

    /// Load a configuration from a YAML string.
    pub fn from_yaml(content: &str) -> SchemaConfigResult<Self> {
        let config: SchemaConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        debug!("Loaded {config:?}");
        Ok(config)
    }

    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    fn validate(&self) -> SchemaConfigResult<()> {
        for (key, name) in [
            ("mutation_type_name", &self.mutation_type_name),
            ("node_interface_name", &self.node_interface_name),
        ] {
            if !is_graphql_name(name) {
                warn!("Rejecting `{key}`: {name:?} is not a GraphQL name");
                return Err(SchemaConfigError::InvalidTypeName {
                    key,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// `/[_A-Za-z][_0-9A-Za-z]*/`
pub fn is_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
