//! Type registration.
//!
//! A [`Registry`] collects record types with their roles and the fields
//! declared on them. Nothing is validated against other types until
//! [`Registry::compile`](crate::compile) runs, so registration order does
//! not matter.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::naming::field_name;
use crate::node::{IdAccessor, IdResolver};
use crate::record::{
    BoundArg, ErasedMethod, Getter, Member, Method, ParamShape, Params, Record, Returns,
};
use crate::shape::{Instance, RecordRef, Shape};
use async_graphql::dynamic::{Field, FieldFuture, InputValue, ResolverContext, TypeRef};
use indexmap::IndexMap;
use modelql_lib::defaults::RESOLVER_METHOD_PREFIX;
use std::{collections::HashMap, marker::PhantomData, sync::Arc};
use tracing::debug;

/// How the arguments of a resolved field are derived.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ArgSpec {
    /// One argument per member of the method's single input record.
    #[default]
    Auto,
    /// One argument per positional parameter, in order.
    Explicit(Vec<ArgInfo>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArgInfo {
    pub name: String,
    pub default: Option<String>,
    pub required: bool,
}

impl ArgInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            required: false,
        }
    }

    /// Default literal, parsed according to the parameter's scalar kind.
    pub fn default(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// How the payload fields of a mutation are derived.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OutputSpec {
    /// One payload field per member of the single returned record.
    #[default]
    Auto,
    /// One payload field per returned value, in order.
    Explicit(Vec<OutputInfo>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputInfo {
    pub name: String,
    pub element: Option<String>,
}

impl OutputInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element: None,
        }
    }

    /// Element type of an edge or connection output.
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

/// Output type of a resolved field, stated instead of inferred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputOverride {
    Object(String),
    Connection(String),
    Edge(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Roles {
    pub root: bool,
    pub mutation_root: bool,
    pub non_node: bool,
}

/// A plain or resolved field, compiled later.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    pub name: String,
    pub method: ErasedMethod,
    pub args: ArgSpec,
    pub output: Option<OutputOverride>,
}

#[derive(Clone, Debug)]
pub struct MutationSpec {
    pub name: String,
    pub method: ErasedMethod,
    pub args: ArgSpec,
    pub outputs: OutputSpec,
}

/// A hand-built field, added to the object as is.
pub struct RawField {
    pub name: String,
    pub type_ref: TypeRef,
    pub arguments: Vec<String>,
    pub field: Field,
}

impl std::fmt::Debug for RawField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawField")
            .field("name", &self.name)
            .field("type_ref", &self.type_ref.to_string())
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Everything registered for one record type.
pub struct TypeDescriptor {
    pub name: String,
    pub record: RecordRef,
    pub roles: Roles,
    pub singleton: Option<Instance>,
    pub id_resolver: Option<IdResolver>,
    pub id_accessor: Option<IdAccessor>,
    pub plain_fields: IndexMap<String, FieldSpec>,
    pub resolved_fields: Vec<FieldSpec>,
    pub raw_fields: Vec<RawField>,
    pub mutations: Vec<MutationSpec>,
}

impl TypeDescriptor {
    fn new(record: RecordRef) -> Self {
        Self {
            name: record.name().to_string(),
            record,
            roles: Roles::default(),
            singleton: None,
            id_resolver: None,
            id_accessor: None,
            plain_fields: IndexMap::new(),
            resolved_fields: Vec::new(),
            raw_fields: Vec::new(),
            mutations: Vec::new(),
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.plain_fields.contains_key(name)
            || self.resolved_fields.iter().any(|field| field.name == name)
            || self.raw_fields.iter().any(|field| field.name == name)
    }

    pub fn has_mutation(&self, name: &str) -> bool {
        self.mutations.iter().any(|mutation| mutation.name == name)
    }

    /// Plain fields first, then resolved fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.plain_fields.values().chain(self.resolved_fields.iter())
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("roles", &self.roles)
            .field("singleton", &self.singleton)
            .field("node", &self.id_accessor.is_some())
            .field("plain_fields", &self.plain_fields.keys().collect::<Vec<_>>())
            .field("resolved_fields", &self.resolved_fields)
            .field("raw_fields", &self.raw_fields)
            .field("mutations", &self.mutations)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) types: Vec<TypeDescriptor>,
    index: HashMap<String, usize>,
    pub(crate) diagnostics: Diagnostics,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`. A second registration of the same type name is dropped.
    pub fn register<T: Record>(&mut self) -> TypeBuilder<'_, T> {
        let name = T::type_name();
        let index = if self.index.contains_key(&name) {
            self.diagnostics.push(Diagnostic::DuplicateType(name));
            None
        } else {
            debug!("Registering type {name}");
            let index = self.types.len();
            self.types.push(TypeDescriptor::new(RecordRef::of::<T>()));
            self.index.insert(name, index);
            Some(index)
        };
        TypeBuilder {
            registry: self,
            index,
            _record: PhantomData,
        }
    }

    /// Register `T` with a singleton instance, the receiver of root fields.
    pub fn register_instance<T: Record>(&mut self, value: T) -> TypeBuilder<'_, T> {
        self.register::<T>().instance(value)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.index.get(name).map(|index| &self.types[*index])
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Chained declarations on one registered type.
///
/// After a duplicate registration every declaration is a no-op.
pub struct TypeBuilder<'r, T> {
    registry: &'r mut Registry,
    index: Option<usize>,
    _record: PhantomData<fn() -> T>,
}

fn plain_field<T: Record>(member: &Member<T>) -> FieldSpec {
    read_field(member.name(), member.source(), member.shape(), member.getter())
}

fn read_field<T: Record>(name: &str, source: &str, shape: &Shape, getter: Getter<T>) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        method: ErasedMethod {
            name: source.to_string(),
            params: ParamShape::None,
            returns: vec![shape.clone()],
            invoke: Arc::new(move |receiver: &Instance, _args: Vec<BoundArg>| {
                Ok(vec![getter(receiver.downcast::<T>()?)])
            }),
        },
        args: ArgSpec::Explicit(Vec::new()),
        output: None,
    }
}

fn find_method<T: Record>(method: &str) -> Option<ErasedMethod> {
    T::methods()
        .into_iter()
        .find(|m| m.name() == method)
        .map(Method::erase)
}

impl<'r, T: Record> TypeBuilder<'r, T> {
    fn with(self, f: impl FnOnce(&mut TypeDescriptor, &mut Diagnostics)) -> Self {
        if let Some(index) = self.index {
            let Registry {
                types, diagnostics, ..
            } = &mut *self.registry;
            f(&mut types[index], diagnostics);
        }
        self
    }

    /// Whether this builder points at a live registration.
    pub fn is_registered(&self) -> bool {
        self.index.is_some()
    }

    pub fn root(self) -> Self {
        self.with(|desc, _| desc.roles.root = true)
    }

    pub fn mutation_root(self) -> Self {
        self.with(|desc, _| desc.roles.mutation_root = true)
    }

    /// Opt out of the node interface.
    pub fn non_node(self) -> Self {
        self.with(|desc, _| desc.roles.non_node = true)
    }

    pub fn instance(self, value: T) -> Self {
        self.with(move |desc, _| desc.singleton = Some(Instance::new(value)))
    }

    /// Load an instance from its local id, for `node(id:)` lookups.
    pub fn id_resolver<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        let resolver: IdResolver = Arc::new(move |id: &str| f(id).map(Instance::new));
        self.with(move |desc, _| desc.id_resolver = Some(resolver))
    }

    /// Local id of an instance. Replaces any plain `id` field.
    pub fn id_field<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let accessor: IdAccessor =
            Arc::new(move |instance: &Instance| instance.downcast_ref::<T>().map(&f));
        self.with(move |desc, _| {
            desc.plain_fields.shift_remove("id");
            desc.id_accessor = Some(accessor);
        })
    }

    /// Expose one member by source or wire name.
    pub fn field(self, name: &str) -> Self {
        self.with(|desc, diagnostics| {
            let Some(member) = T::members().into_iter().find(|m| m.matches(name)) else {
                diagnostics.push(Diagnostic::UnknownMember {
                    type_name: desc.name.clone(),
                    member: name.to_string(),
                });
                return;
            };
            let taken = desc.has_field(member.name())
                || (member.name() == "id" && desc.id_accessor.is_some());
            if taken {
                diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: member.name().to_string(),
                });
                return;
            }
            let spec = plain_field(&member);
            desc.plain_fields.insert(spec.name.clone(), spec);
        })
    }

    /// Expose every member not already exposed.
    pub fn fields(self) -> Self {
        self.with(|desc, _| {
            for member in T::members() {
                if desc.has_field(member.name())
                    || (member.name() == "id" && desc.id_accessor.is_some())
                {
                    continue;
                }
                let spec = plain_field(&member);
                desc.plain_fields.insert(spec.name.clone(), spec);
            }
        })
    }

    /// Expose a computed value as a plain field.
    pub fn field_with<V, F>(self, name: &str, f: F) -> Self
    where
        V: crate::shape::Shaped,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let member = Member::new(name, f);
        self.with(|desc, diagnostics| {
            if desc.has_field(member.name()) {
                diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: member.name().to_string(),
                });
                return;
            }
            let spec = plain_field(&member);
            desc.plain_fields.insert(spec.name.clone(), spec);
        })
    }

    /// Flatten the members of a record embedded in `T` into plain fields of
    /// `T`. Members whose name is already taken stay hidden. Nest by
    /// chaining getters, e.g. `embedded(|t: &T| &t.meta.audit)`.
    pub fn embedded<E, F>(self, get: F) -> Self
    where
        E: Record,
        F: Fn(&T) -> &E + Send + Sync + 'static,
    {
        let get = Arc::new(get);
        self.with(|desc, _| {
            for member in E::members() {
                let taken = desc.has_field(member.name())
                    || (member.name() == "id" && desc.id_accessor.is_some());
                if taken {
                    debug!(
                        "Embedded member {}.{} is shadowed on {}",
                        E::type_name(),
                        member.name(),
                        desc.name
                    );
                    continue;
                }
                let inner = member.getter();
                let get = get.clone();
                let getter: Getter<T> = Arc::new(move |outer: &T| inner(get(outer)));
                let spec = read_field(member.name(), member.source(), member.shape(), getter);
                desc.plain_fields.insert(spec.name.clone(), spec);
            }
        })
    }

    /// Add a hand-built field that bypasses classification and dispatch.
    ///
    /// On object types the resolver's parent value is the record's
    /// [`Instance`].
    pub fn add_field<F>(
        self,
        name: &str,
        ty: TypeRef,
        arguments: &[(&str, TypeRef)],
        resolver_fn: F,
    ) -> Self
    where
        F: for<'a> Fn(ResolverContext<'a>) -> FieldFuture<'a> + Send + Sync + 'static,
    {
        let field = arguments
            .iter()
            .map(|(argument, ty)| InputValue::new(*argument, ty.clone()))
            .fold(Field::new(name, ty.clone(), resolver_fn), Field::argument);
        let arguments = arguments
            .iter()
            .map(|(argument, _)| argument.to_string())
            .collect();
        self.with(|desc, diagnostics| {
            if desc.has_field(name) {
                diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: name.to_string(),
                });
                return;
            }
            desc.raw_fields.push(RawField {
                name: name.to_string(),
                type_ref: ty,
                arguments,
                field,
            });
        })
    }

    fn push_resolved(
        self,
        name: &str,
        method: Option<ErasedMethod>,
        method_name: &str,
        args: ArgSpec,
        output: Option<OutputOverride>,
    ) -> Self {
        let name = field_name(name);
        self.with(|desc, diagnostics| {
            let Some(method) = method else {
                diagnostics.push(Diagnostic::UnknownMethod {
                    type_name: desc.name.clone(),
                    method: method_name.to_string(),
                });
                return;
            };
            if desc.has_field(&name) {
                diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: name,
                });
                return;
            }
            desc.resolved_fields.push(FieldSpec {
                name,
                method,
                args,
                output,
            });
        })
    }

    /// Expose a method as a field with arguments.
    pub fn resolved_field(self, name: &str, method: &str, args: ArgSpec) -> Self {
        self.push_resolved(name, find_method::<T>(method), method, args, None)
    }

    /// Like [`resolved_field`](Self::resolved_field) with the output type stated.
    pub fn resolved_field_as(
        self,
        name: &str,
        method: &str,
        args: ArgSpec,
        output: OutputOverride,
    ) -> Self {
        self.push_resolved(name, find_method::<T>(method), method, args, Some(output))
    }

    /// Expose a closure over the record as a resolved field.
    pub fn extension_field<P, R, F>(self, name: &str, args: ArgSpec, f: F) -> Self
    where
        P: Params,
        R: Returns,
        F: Fn(&T, P) -> R + Send + Sync + 'static,
    {
        let method = Method::new(name, f).erase();
        self.push_resolved(name, Some(method), name, args, None)
    }

    /// Expose every `get_*` method as a field named after the rest of the method name.
    pub fn resolved_fields(self) -> Self {
        self.with(|desc, _| {
            for method in T::methods() {
                let Some(stem) = method.name().strip_prefix(RESOLVER_METHOD_PREFIX) else {
                    continue;
                };
                let name = field_name(stem);
                if desc.has_field(&name) {
                    continue;
                }
                desc.resolved_fields.push(FieldSpec {
                    name,
                    method: method.erase(),
                    args: ArgSpec::Auto,
                    output: None,
                });
            }
        })
    }

    /// Expose a method as a mutation. Only valid on the mutation root.
    pub fn mutation_field(
        self,
        name: &str,
        method: &str,
        args: ArgSpec,
        outputs: OutputSpec,
    ) -> Self {
        let name = field_name(name);
        let found = find_method::<T>(method);
        self.with(|desc, diagnostics| {
            let Some(found) = found else {
                diagnostics.push(Diagnostic::UnknownMethod {
                    type_name: desc.name.clone(),
                    method: method.to_string(),
                });
                return;
            };
            if desc.has_mutation(&name) {
                diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: name,
                });
                return;
            }
            desc.mutations.push(MutationSpec {
                name,
                method: found,
                args,
                outputs,
            });
        })
    }

    /// Expose every method as a mutation with auto arguments and outputs.
    pub fn mutation_fields(self) -> Self {
        self.with(|desc, _| {
            for method in T::methods() {
                let name = field_name(method.name());
                if desc.has_mutation(&name) {
                    continue;
                }
                desc.mutations.push(MutationSpec {
                    name,
                    method: method.erase(),
                    args: ArgSpec::Auto,
                    outputs: OutputSpec::Auto,
                });
            }
        })
    }
}
