use convert_case::{Case, Casing, StateConverter};
use std::fmt;

/// A name together with the case convention it was written in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Name {
    Pascal(String),
    Snake(String),
    Camel(String),
}

impl Name {
    pub fn new_pascal(name: impl Into<String>) -> Self {
        Self::Pascal(name.into())
    }
    pub fn new_snake(name: impl Into<String>) -> Self {
        Self::Snake(name.into())
    }
    pub fn new_camel(name: impl Into<String>) -> Self {
        Self::Camel(name.into())
    }

    /// Guess the convention of a Rust identifier or an already cased wire name.
    pub fn detect(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.contains('_') || name.chars().all(|c| !c.is_ascii_uppercase()) {
            Self::Snake(name)
        } else if name.starts_with(|c: char| c.is_ascii_uppercase()) {
            Self::Pascal(name)
        } else {
            Self::Camel(name)
        }
    }

    pub fn to_converter(&self) -> StateConverter<String> {
        match self {
            Name::Pascal(name) => name.from_case(Case::Pascal),
            Name::Snake(name) => name.from_case(Case::Snake),
            Name::Camel(name) => name.from_case(Case::Camel),
        }
    }
    pub fn to_pascal_string(&self) -> String {
        self.to_converter().to_case(Case::Pascal)
    }
    pub fn to_snake_string(&self) -> String {
        self.to_converter().to_case(Case::Snake)
    }
    pub fn to_camel_string(&self) -> String {
        self.to_converter().to_case(Case::Camel)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Name::Pascal(name) => write!(f, "{}", name),
            Name::Snake(name) => write!(f, "{}", name),
            Name::Camel(name) => write!(f, "{}", name),
        }
    }
}

/// Wire name of a member or method, e.g. `completed_count` => `completedCount`.
pub fn field_name(source: &str) -> String {
    Name::detect(source).to_camel_string()
}

/// Type name used for mutation envelopes, e.g. `add_todo` => `AddTodo`.
pub fn type_name(source: &str) -> String {
    Name::detect(source).to_pascal_string()
}

/// Last path segment of a Rust type, e.g. `my_app::model::Todo` => `Todo`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Element type encoded in a wrapper field name, e.g. `todoEdge` => `Todo`.
pub fn strip_wrapper_suffix(field: &str, suffix: &str) -> Option<String> {
    let stem = field.strip_suffix(suffix)?;
    if stem.is_empty() {
        return None;
    }
    Some(Name::detect(stem).to_pascal_string())
}
