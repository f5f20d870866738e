//! The object model boundary.
//!
//! A [`Record`] describes its members and methods once, with typed function
//! references, so the compiler never has to look anything up by name while
//! a request is being resolved.

use crate::error::{FieldError, FieldResult};
use crate::naming::{field_name, short_type_name};
use crate::shape::{Instance, MemberInfo, Output, RecordRef, Shape, Shaped};
use async_graphql_value::ConstValue;
use serde::de::DeserializeOwned;
use std::{fmt, sync::Arc};

pub trait Record: Send + Sync + Sized + 'static {
    /// Schema type name. Defaults to the unqualified Rust type name.
    fn type_name() -> String {
        short_type_name::<Self>()
    }

    fn members() -> Vec<Member<Self>>;

    fn methods() -> Vec<Method<Self>> {
        Vec::new()
    }
}

pub type Getter<T> = Arc<dyn Fn(&T) -> Output + Send + Sync>;

/// A stored member of a record.
pub struct Member<T> {
    source: String,
    name: String,
    shape: Shape,
    getter: Getter<T>,
    default: Option<String>,
    required: bool,
}

impl<T: 'static> Member<T> {
    pub fn new<V, F>(source: &str, getter: F) -> Self
    where
        V: Shaped,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self {
            source: source.to_string(),
            name: field_name(source),
            shape: V::shape(),
            getter: Arc::new(move |value: &T| getter(value).into_output()),
            default: None,
            required: false,
        }
    }

    /// Default-value literal, parsed by scalar kind when the member is used as an argument.
    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Mark the member as non-null when used as an argument.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Override the wire name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<T> Member<T> {
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
    pub fn get(&self, value: &T) -> Output {
        (self.getter)(value)
    }
    pub fn getter(&self) -> Getter<T> {
        self.getter.clone()
    }
    pub fn matches(&self, name: &str) -> bool {
        self.source == name || self.name == name
    }
    pub fn info(&self) -> MemberInfo {
        MemberInfo {
            name: self.name.clone(),
            shape: self.shape.clone(),
            default: self.default.clone(),
            required: self.required,
        }
    }
}

impl<T> Clone for Member<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            name: self.name.clone(),
            shape: self.shape.clone(),
            getter: self.getter.clone(),
            default: self.default.clone(),
            required: self.required,
        }
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

/// An argument value after presence/default resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundArg {
    pub name: String,
    pub value: Option<ConstValue>,
}

impl BoundArg {
    pub fn new(name: impl Into<String>, value: Option<ConstValue>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Parameter layout of a method.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamShape {
    None,
    /// A single input record, eligible for auto-args.
    Record(RecordRef),
    Positional(Vec<Shape>),
}

impl ParamShape {
    pub fn arity(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Record(_) => 1,
            Self::Positional(shapes) => shapes.len(),
        }
    }
}

/// Method parameters that can be bound from wire arguments.
pub trait Params: Sized {
    fn shape() -> ParamShape;
    fn bind(args: Vec<BoundArg>) -> FieldResult<Self>;
}

impl Params for () {
    fn shape() -> ParamShape {
        ParamShape::None
    }
    fn bind(_args: Vec<BoundArg>) -> FieldResult<Self> {
        Ok(())
    }
}

fn json_value(argument: &str, value: ConstValue) -> FieldResult<serde_json::Value> {
    value.into_json().map_err(|e| FieldError::InvalidArgument {
        argument: argument.to_string(),
        message: e.to_string(),
    })
}

impl<T: Record + DeserializeOwned> Params for T {
    fn shape() -> ParamShape {
        ParamShape::Record(RecordRef::of::<T>())
    }

    /// Absent members keep their `Default` value.
    fn bind(args: Vec<BoundArg>) -> FieldResult<Self> {
        let mut object = serde_json::Map::new();
        for arg in args {
            if let Some(value) = arg.value {
                let value = json_value(&arg.name, value)?;
                object.insert(arg.name, value);
            }
        }
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
            FieldError::InvalidArgument {
                argument: T::type_name(),
                message: e.to_string(),
            }
        })
    }
}

fn bind_positional<A>(arg: Option<BoundArg>) -> FieldResult<A>
where
    A: DeserializeOwned + Default,
{
    match arg {
        Some(BoundArg {
            name,
            value: Some(value),
        }) => {
            let value = json_value(&name, value)?;
            serde_json::from_value(value).map_err(|e| FieldError::InvalidArgument {
                argument: name,
                message: e.to_string(),
            })
        }
        _ => Ok(A::default()),
    }
}

macro_rules! impl_params_for_tuple {
    ($($ty:ident),+) => {
        impl<$($ty),+> Params for ($($ty,)+)
        where
            $($ty: Shaped + DeserializeOwned + Default),+
        {
            fn shape() -> ParamShape {
                ParamShape::Positional(vec![$($ty::shape()),+])
            }

            fn bind(args: Vec<BoundArg>) -> FieldResult<Self> {
                let mut args = args.into_iter();
                Ok(($(bind_positional::<$ty>(args.next())?,)+))
            }
        }
    };
}

impl_params_for_tuple!(A);
impl_params_for_tuple!(A, B);
impl_params_for_tuple!(A, B, C);
impl_params_for_tuple!(A, B, C, D);

/// Method results: a single value, several positional values, or a `Result`.
pub trait Returns {
    fn shapes() -> Vec<Shape>;
    fn into_outputs(self) -> FieldResult<Vec<Output>>;
}

impl<T: Shaped> Returns for T {
    fn shapes() -> Vec<Shape> {
        vec![T::shape()]
    }
    fn into_outputs(self) -> FieldResult<Vec<Output>> {
        Ok(vec![self.into_output()])
    }
}

impl<T: Returns, E: fmt::Display> Returns for Result<T, E> {
    fn shapes() -> Vec<Shape> {
        T::shapes()
    }
    fn into_outputs(self) -> FieldResult<Vec<Output>> {
        self.map_err(|e| FieldError::Resolver(e.to_string()))?
            .into_outputs()
    }
}

macro_rules! impl_returns_for_tuple {
    ($($ty:ident => $idx:tt),+) => {
        impl<$($ty: Shaped),+> Returns for ($($ty,)+) {
            fn shapes() -> Vec<Shape> {
                vec![$($ty::shape()),+]
            }
            fn into_outputs(self) -> FieldResult<Vec<Output>> {
                Ok(vec![$(self.$idx.into_output()),+])
            }
        }
    };
}

impl_returns_for_tuple!(A => 0, B => 1);
impl_returns_for_tuple!(A => 0, B => 1, C => 2);

pub type Invoker<T> = Arc<dyn Fn(&T, Vec<BoundArg>) -> FieldResult<Vec<Output>> + Send + Sync>;

/// A method of a record, captured as a typed function reference.
pub struct Method<T> {
    name: String,
    params: ParamShape,
    returns: Vec<Shape>,
    invoke: Invoker<T>,
}

impl<T: 'static> Method<T> {
    pub fn new<P, R, F>(name: &str, f: F) -> Self
    where
        P: Params,
        R: Returns,
        F: Fn(&T, P) -> R + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            params: P::shape(),
            returns: R::shapes(),
            invoke: Arc::new(move |receiver: &T, args: Vec<BoundArg>| {
                let params = P::bind(args)?;
                f(receiver, params).into_outputs()
            }),
        }
    }

    pub fn no_args<R, F>(name: &str, f: F) -> Self
    where
        R: Returns,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Self::new(name, move |receiver: &T, (): ()| f(receiver))
    }

    pub(crate) fn erase(self) -> ErasedMethod {
        let invoke = self.invoke;
        ErasedMethod {
            name: self.name,
            params: self.params,
            returns: self.returns,
            invoke: Arc::new(move |receiver: &Instance, args| {
                let receiver = receiver.downcast::<T>()?;
                invoke(receiver, args)
            }),
        }
    }
}

impl<T> Method<T> {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn params(&self) -> &ParamShape {
        &self.params
    }
    pub fn returns(&self) -> &[Shape] {
        &self.returns
    }
}

impl<T> fmt::Debug for Method<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

pub type ErasedInvoker =
    Arc<dyn Fn(&Instance, Vec<BoundArg>) -> FieldResult<Vec<Output>> + Send + Sync>;

/// A [`Method`] with its receiver type erased.
#[derive(Clone)]
pub struct ErasedMethod {
    pub name: String,
    pub params: ParamShape,
    pub returns: Vec<Shape>,
    pub invoke: ErasedInvoker,
}

impl fmt::Debug for ErasedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedMethod")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Id, ScalarKind};
    use assert_matches::assert_matches;
    use serde::Deserialize;

    #[derive(Default, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Filter {
        status: String,
        max_items: Option<i32>,
    }

    impl Record for Filter {
        fn members() -> Vec<Member<Self>> {
            vec![
                Member::new("status", |f: &Filter| f.status.clone()).default("any"),
                Member::new("max_items", |f: &Filter| f.max_items),
            ]
        }
    }

    struct Counter {
        base: i32,
    }

    impl Record for Counter {
        fn members() -> Vec<Member<Self>> {
            vec![Member::new("base", |c: &Counter| c.base)]
        }

        fn methods() -> Vec<Method<Self>> {
            vec![
                Method::new("add", |c: &Counter, (n,): (i32,)| c.base + n),
                Method::new("describe", |_: &Counter, filter: Filter| filter.status),
                Method::no_args("fail", |_: &Counter| -> Result<i32, String> {
                    Err("boom".to_string())
                }),
                Method::new("pair", |c: &Counter, (id, flag): (Id, bool)| {
                    (id.0, c.base, flag)
                }),
            ]
        }
    }

    #[test]
    fn test_member_info() {
        let infos = RecordRef::of::<Filter>().members();
        assert_eq!(infos[0].name, "status");
        assert_eq!(infos[0].default.as_deref(), Some("any"));
        assert_eq!(infos[1].name, "maxItems");
        assert_eq!(
            infos[1].shape,
            Shape::optional(Shape::Scalar(ScalarKind::Int))
        );
    }

    #[test]
    fn test_method_shapes() {
        let methods = Counter::methods();
        assert_eq!(
            methods[0].params(),
            &ParamShape::Positional(vec![Shape::Scalar(ScalarKind::Int)])
        );
        assert_matches!(methods[1].params(), ParamShape::Record(r) if r.name() == "Filter");
        assert_eq!(methods[2].params(), &ParamShape::None);
        assert_eq!(methods[3].returns().len(), 3);
    }

    #[test]
    fn test_invoke_erased() {
        let counter = Instance::new(Counter { base: 40 });
        let mut methods = Counter::methods().into_iter().map(Method::erase);

        let add = methods.next().unwrap();
        let out = (add.invoke)(
            &counter,
            vec![BoundArg::new("n", Some(ConstValue::Number(2.into())))],
        )
        .unwrap();
        assert_eq!(out[0].as_value(), Some(&ConstValue::Number(42.into())));

        let describe = methods.next().unwrap();
        let out = (describe.invoke)(
            &counter,
            vec![
                BoundArg::new("status", Some(ConstValue::String("complete".into()))),
                BoundArg::new("maxItems", None),
            ],
        )
        .unwrap();
        assert_eq!(
            out[0].as_value(),
            Some(&ConstValue::String("complete".into()))
        );

        let fail = methods.next().unwrap();
        assert_eq!(
            (fail.invoke)(&counter, vec![]).unwrap_err(),
            FieldError::Resolver("boom".to_string())
        );
    }

    #[test]
    fn test_receiver_mismatch() {
        let filter = Instance::new(Filter::default());
        let add = Counter::methods().into_iter().next().unwrap().erase();
        assert_matches!(
            (add.invoke)(&filter, vec![]),
            Err(FieldError::ReceiverMismatch { .. })
        );
    }
}
