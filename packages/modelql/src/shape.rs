//! Static shapes of the object model and type-erased runtime values.
//!
//! Every value exposed through the schema implements [`Shaped`], which
//! gives the compiler a [`Shape`] to classify at build time and turns the
//! value into an [`Output`] at request time.

use crate::connection::{Connection, Edge};
use crate::error::{FieldError, FieldResult};
use crate::naming::short_type_name;
use crate::record::{Member, Record};
use async_graphql::dynamic::{FieldValue, TypeRef};
use async_graphql_value::{ConstValue, Number};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{any::Any, fmt, str::FromStr, sync::Arc};
use strum::{AsRefStr, Display};

/// Wire scalar kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum ScalarKind {
    Boolean,
    Int,
    Float,
    String,
    #[strum(serialize = "ID")]
    Id,
    /// A custom type carried as its text form, see [`Text`].
    Text,
}

impl ScalarKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean => TypeRef::BOOLEAN,
            Self::Int => TypeRef::INT,
            Self::Float => TypeRef::FLOAT,
            Self::String => TypeRef::STRING,
            Self::Id => TypeRef::ID,
            Self::Text => TypeRef::STRING,
        }
    }

    /// Parse a default-value literal according to this kind.
    pub fn parse_literal(&self, literal: &str) -> Option<ConstValue> {
        match self {
            Self::Boolean => parse_bool(literal).map(ConstValue::Boolean),
            Self::Int => parse_int(literal).map(|v| ConstValue::Number(v.into())),
            Self::Float => literal
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(ConstValue::Number),
            Self::String | Self::Id | Self::Text => {
                Some(ConstValue::String(literal.to_string()))
            }
        }
    }
}

fn parse_bool(literal: &str) -> Option<bool> {
    match literal.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_int(literal: &str) -> Option<i64> {
    let literal = literal.trim();
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    let (radix, digits) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ => (10, digits),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// Wrapper values whose element type cannot be read off the Rust type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Wrapper {
    Edge,
    Connection,
}

impl Wrapper {
    /// Naming convention used to infer the wrapped element type.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Edge => "Edge",
            Self::Connection => "Connection",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Scalar(ScalarKind),
    Record(RecordRef),
    Optional(Box<Shape>),
    List(Box<Shape>),
    Placeholder(Wrapper),
    Unsupported(&'static str),
}

impl Shape {
    pub fn optional(inner: Shape) -> Self {
        Self::Optional(Box::new(inner))
    }
    pub fn list(inner: Shape) -> Self {
        Self::List(Box::new(inner))
    }

    /// Strip every `Optional` layer.
    pub fn strip_optional(&self) -> (&Shape, bool) {
        let mut shape = self;
        let mut optional = false;
        while let Shape::Optional(inner) = shape {
            shape = inner;
            optional = true;
        }
        (shape, optional)
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.strip_optional().0 {
            Shape::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Static description of a member of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberInfo {
    pub name: String,
    pub shape: Shape,
    pub default: Option<String>,
    pub required: bool,
}

/// Type-erased handle on a [`Record`] type.
#[derive(Clone)]
pub struct RecordRef {
    name: String,
    members: fn() -> Vec<MemberInfo>,
    unwrap: fn(&Instance) -> Option<Vec<(String, Output)>>,
}

impl RecordRef {
    pub fn of<T: Record>() -> Self {
        Self {
            name: T::type_name(),
            members: member_infos::<T>,
            unwrap: unwrap_members::<T>,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> Vec<MemberInfo> {
        (self.members)()
    }

    /// Read every member of `instance`, keyed by wire name.
    pub fn unwrap(&self, instance: &Instance) -> Option<Vec<(String, Output)>> {
        (self.unwrap)(instance)
    }
}

fn member_infos<T: Record>() -> Vec<MemberInfo> {
    T::members().iter().map(Member::info).collect()
}

fn unwrap_members<T: Record>(instance: &Instance) -> Option<Vec<(String, Output)>> {
    let value = instance.downcast_ref::<T>()?;
    Some(
        T::members()
            .iter()
            .map(|member| (member.name().to_string(), member.get(value)))
            .collect(),
    )
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordRef").field(&self.name).finish()
    }
}

/// A shared, type-erased record value tagged with its type name.
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Record>(value: T) -> Self {
        Self {
            type_name: T::type_name().into(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast<T: 'static>(&self) -> FieldResult<&T> {
        self.downcast_ref::<T>()
            .ok_or_else(|| FieldError::ReceiverMismatch {
                expected: short_type_name::<T>(),
                found: self.type_name.to_string(),
            })
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.type_name)
    }
}

/// Type-erased resolution result.
#[derive(Clone, Debug)]
pub enum Output {
    Null,
    Value(ConstValue),
    Object(Instance),
    List(Vec<Output>),
    Edge(Box<Edge>),
    Connection(Box<Connection>),
}

impl Output {
    pub fn as_value(&self) -> Option<&ConstValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Output]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn into_field_value<'a>(self) -> FieldValue<'a> {
        match self {
            Self::Null => FieldValue::NULL,
            Self::Value(value) => FieldValue::value(value),
            Self::Object(instance) => FieldValue::owned_any(instance),
            Self::List(items) => {
                FieldValue::list(items.into_iter().map(Output::into_field_value))
            }
            Self::Edge(edge) => FieldValue::owned_any(*edge),
            Self::Connection(connection) => FieldValue::owned_any(*connection),
        }
    }
}

/// A value with a statically known [`Shape`].
pub trait Shaped {
    fn shape() -> Shape;
    fn into_output(self) -> Output;
}

impl Shaped for bool {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Boolean)
    }
    fn into_output(self) -> Output {
        Output::Value(ConstValue::Boolean(self))
    }
}

macro_rules! impl_shaped_int {
    ($($ty:ty),+) => {
        $(
            impl Shaped for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(ScalarKind::Int)
                }
                fn into_output(self) -> Output {
                    Output::Value(ConstValue::Number(self.into()))
                }
            }
        )+
    };
}

impl_shaped_int!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

macro_rules! impl_shaped_float {
    ($($ty:ty),+) => {
        $(
            impl Shaped for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(ScalarKind::Float)
                }
                fn into_output(self) -> Output {
                    Number::from_f64(self as f64)
                        .map(|n| Output::Value(ConstValue::Number(n)))
                        .unwrap_or(Output::Null)
                }
            }
        )+
    };
}

impl_shaped_float!(f32, f64);

impl Shaped for String {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::String)
    }
    fn into_output(self) -> Output {
        Output::Value(ConstValue::String(self))
    }
}

impl Shaped for i128 {
    fn shape() -> Shape {
        Shape::Unsupported("i128")
    }
    fn into_output(self) -> Output {
        Output::Null
    }
}

impl Shaped for u128 {
    fn shape() -> Shape {
        Shape::Unsupported("u128")
    }
    fn into_output(self) -> Output {
        Output::Null
    }
}

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> Shape {
        Shape::optional(T::shape())
    }
    fn into_output(self) -> Output {
        match self {
            Some(value) => value.into_output(),
            None => Output::Null,
        }
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::list(T::shape())
    }
    fn into_output(self) -> Output {
        Output::List(self.into_iter().map(Shaped::into_output).collect())
    }
}

impl<T: Record> Shaped for T {
    fn shape() -> Shape {
        Shape::Record(RecordRef::of::<T>())
    }
    fn into_output(self) -> Output {
        Output::Object(Instance::new(self))
    }
}

/// The `ID` scalar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub String);

impl Id {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Shaped for Id {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Id)
    }
    fn into_output(self) -> Output {
        Output::Value(ConstValue::String(self.0))
    }
}

/// Exposes a type through its text form: `Display` on the way out, `FromStr`
/// when bound from an argument. Timestamps, addresses and the like.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Text<T>(pub T);

impl<T> Text<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: fmt::Display> Shaped for Text<T> {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Text)
    }
    fn into_output(self) -> Output {
        Output::Value(ConstValue::String(self.0.to_string()))
    }
}

impl<T: fmt::Display> Serialize for Text<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de, T> Deserialize<'de> for Text<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map(Text).map_err(de::Error::custom)
    }
}
