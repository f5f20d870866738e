//! Request time field resolution.
//!
//! A [`FieldDispatcher`] binds wire arguments to a method's parameters,
//! invokes it behind a panic boundary and paginates list results of
//! connection fields.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{FieldError, FieldResult};
use crate::extension::field_output;
use crate::paging::{connection_from_slice, PagingArgs, PAGING_ARGUMENTS};
use crate::record::{BoundArg, ErasedInvoker, ParamShape};
use crate::registry::{ArgInfo, ArgSpec};
use crate::shape::{Instance, Output, ScalarKind, Shape};
use crate::spec::ConnectionField;
use async_graphql::dynamic::{
    Field, FieldFuture, InputValue, ObjectAccessor, ResolverContext, TypeRef,
};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};
use tracing::{debug, error};

/// Declared argument of a compiled field.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgSlot {
    pub name: String,
    pub kind: ScalarKind,
    pub list: bool,
    pub default: Option<ConstValue>,
    pub required: bool,
    /// Hidden slots are bound positionally but never read from the request.
    pub exposed: bool,
}

impl ArgSlot {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            list: false,
            default: None,
            required: false,
            exposed: true,
        }
    }

    pub fn with_default(mut self, default: ConstValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn type_ref(&self) -> TypeRef {
        match (self.list, self.required) {
            (false, false) => TypeRef::named(self.kind.type_name()),
            (false, true) => TypeRef::named_nn(self.kind.type_name()),
            (true, false) => TypeRef::named_nn_list(self.kind.type_name()),
            (true, true) => TypeRef::named_nn_list_nn(self.kind.type_name()),
        }
    }

    pub fn input_value(&self) -> InputValue {
        let input = InputValue::new(&self.name, self.type_ref());
        match &self.default {
            Some(default) => input.default_value(default.clone()),
            None => input,
        }
    }
}

/// Supplied value, else declared default, else absent.
pub fn bind_arguments(
    field: &str,
    slots: &[ArgSlot],
    supplied: &IndexMap<String, ConstValue>,
) -> FieldResult<Vec<BoundArg>> {
    slots
        .iter()
        .map(|slot| {
            let value = slot
                .exposed
                .then(|| supplied.get(&slot.name))
                .flatten()
                .filter(|value| !matches!(value, ConstValue::Null))
                .cloned()
                .or_else(|| slot.default.clone());
            if value.is_none() && slot.required {
                return Err(FieldError::MissingArgument {
                    field: field.to_string(),
                    argument: slot.name.clone(),
                });
            }
            Ok(BoundArg::new(&slot.name, value))
        })
        .collect()
}

/// Build the argument slots of a field from its method's parameters.
pub fn derive_slots(
    type_name: &str,
    field: &str,
    params: &ParamShape,
    spec: &ArgSpec,
    diagnostics: &mut Diagnostics,
) -> Option<Vec<ArgSlot>> {
    match spec {
        ArgSpec::Auto => match params {
            ParamShape::None => Some(Vec::new()),
            ParamShape::Positional(shapes) if shapes.is_empty() => Some(Vec::new()),
            ParamShape::Positional(_) => {
                diagnostics.push(Diagnostic::AutoArgsRequireRecord {
                    type_name: type_name.to_string(),
                    field: field.to_string(),
                });
                None
            }
            ParamShape::Record(record) => Some(
                record
                    .members()
                    .into_iter()
                    .filter_map(|member| {
                        let info = ArgInfo {
                            name: member.name,
                            default: member.default,
                            required: member.required,
                        };
                        slot_for(type_name, field, &info, &member.shape, diagnostics)
                    })
                    .collect(),
            ),
        },
        ArgSpec::Explicit(infos) => {
            let shapes = match params {
                ParamShape::None => Vec::new(),
                ParamShape::Positional(shapes) => shapes.clone(),
                ParamShape::Record(record) => vec![Shape::Record(record.clone())],
            };
            if infos.len() != shapes.len() {
                diagnostics.push(Diagnostic::ArgumentCountMismatch {
                    type_name: type_name.to_string(),
                    field: field.to_string(),
                    declared: infos.len(),
                    expected: shapes.len(),
                });
                return None;
            }
            // Positional binding cannot skip a slot, so any bad argument drops the field.
            infos
                .iter()
                .zip(shapes.iter())
                .map(|(info, shape)| slot_for(type_name, field, info, shape, diagnostics))
                .collect()
        }
    }
}

fn slot_for(
    type_name: &str,
    field: &str,
    info: &ArgInfo,
    shape: &Shape,
    diagnostics: &mut Diagnostics,
) -> Option<ArgSlot> {
    let (shape, _) = shape.strip_optional();
    let (kind, list) = match shape {
        Shape::Scalar(kind) => (*kind, false),
        Shape::List(inner) => match inner.strip_optional().0 {
            Shape::Scalar(kind) => (*kind, true),
            _ => (ScalarKind::String, true),
        },
        _ => (ScalarKind::String, false),
    };
    let is_scalar = match shape {
        Shape::Scalar(_) => true,
        Shape::List(inner) => matches!(inner.strip_optional().0, Shape::Scalar(_)),
        _ => false,
    };
    if !is_scalar {
        diagnostics.push(Diagnostic::NonScalarArgument {
            type_name: type_name.to_string(),
            field: field.to_string(),
            argument: info.name.clone(),
        });
        return None;
    }

    let mut slot = ArgSlot::new(&info.name, kind);
    slot.list = list;
    slot.required = info.required;
    if let Some(literal) = &info.default {
        match kind.parse_literal(literal).filter(|_| !list) {
            Some(value) => slot.default = Some(value),
            None => diagnostics.push(Diagnostic::InvalidDefault {
                type_name: type_name.to_string(),
                field: field.to_string(),
                argument: info.name.clone(),
                literal: literal.clone(),
            }),
        }
    }
    Some(slot)
}

/// Hide arguments of a paginated field that collide with the pagination arguments.
///
/// Returns `false` when a hidden argument is required and has no default,
/// since no request could ever bind it.
pub fn hide_paging_collisions(
    type_name: &str,
    field: &str,
    slots: &mut [ArgSlot],
    diagnostics: &mut Diagnostics,
) -> bool {
    let mut bindable = true;
    for slot in slots
        .iter_mut()
        .filter(|slot| PAGING_ARGUMENTS.contains(&slot.name.as_str()))
    {
        diagnostics.push(Diagnostic::ArgumentShadowsPaging {
            type_name: type_name.to_string(),
            field: field.to_string(),
            argument: slot.name.clone(),
        });
        slot.exposed = false;
        if slot.required && slot.default.is_none() {
            diagnostics.push(Diagnostic::RequiredArgumentHidden {
                type_name: type_name.to_string(),
                field: field.to_string(),
                argument: slot.name.clone(),
            });
            bindable = false;
        }
    }
    bindable
}

/// Where the receiver of a field comes from.
#[derive(Clone, Debug)]
pub enum Receiver {
    /// The parent value handed over by the execution engine.
    Parent,
    /// A registered root instance.
    Singleton(Option<Instance>),
}

impl Receiver {
    pub fn resolve<'a>(
        &'a self,
        field: &str,
        parent: Option<&'a Instance>,
    ) -> FieldResult<&'a Instance> {
        let receiver = match self {
            Self::Parent => parent,
            Self::Singleton(instance) => instance.as_ref(),
        };
        receiver.ok_or_else(|| FieldError::MissingReceiver {
            field: field.to_string(),
        })
    }
}

/// Run a bound method, converting a panic into a field error.
pub fn invoke_guarded<T, F>(field: &str, f: F) -> FieldResult<T>
where
    F: FnOnce() -> FieldResult<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Resolver for field {field} panicked: {message}");
            Err(FieldError::Panicked {
                field: field.to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Collect a field's arguments into an owned map.
pub fn collect_args(
    args: &ObjectAccessor<'_>,
) -> async_graphql::Result<IndexMap<String, ConstValue>> {
    args.iter()
        .map(|(name, value)| Ok((name.to_string(), value.deserialize::<ConstValue>()?)))
        .collect()
}

/// The compiled resolver of one field.
#[derive(Clone)]
pub struct FieldDispatcher {
    owner: String,
    field: String,
    receiver: Receiver,
    slots: Vec<ArgSlot>,
    invoke: ErasedInvoker,
    paginate: bool,
}

impl FieldDispatcher {
    pub fn new(
        owner: impl Into<String>,
        field: impl Into<String>,
        receiver: Receiver,
        slots: Vec<ArgSlot>,
        invoke: ErasedInvoker,
    ) -> Self {
        Self {
            owner: owner.into(),
            field: field.into(),
            receiver,
            slots,
            invoke,
            paginate: false,
        }
    }

    /// Wrap list results into a page driven by `first`/`after`/`last`/`before`.
    pub fn paginated(mut self) -> Self {
        self.paginate = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.field
    }

    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    pub fn is_paginated(&self) -> bool {
        self.paginate
    }

    pub fn dispatch(
        &self,
        parent: Option<&Instance>,
        args: &IndexMap<String, ConstValue>,
    ) -> FieldResult<Output> {
        let receiver = self.receiver.resolve(&self.field, parent)?;
        let bound = bind_arguments(&self.field, &self.slots, args)?;
        debug!(
            "Dispatching {}.{} with {} argument(s)",
            self.owner,
            self.field,
            bound.len()
        );
        let paging = self
            .paginate
            .then(|| PagingArgs::from_args(args))
            .transpose()?;
        invoke_guarded(&self.field, || {
            let outputs = (self.invoke)(receiver, bound)?;
            let payload = outputs.into_iter().next().unwrap_or(Output::Null);
            match (payload, paging) {
                (Output::List(items), Some(paging)) => {
                    let connection = connection_from_slice(items, &paging)?;
                    Ok(Output::Connection(Box::new(connection)))
                }
                (payload, _) => Ok(payload),
            }
        })
    }

    /// Schema field resolving through this dispatcher.
    pub fn into_field(self, ty: TypeRef) -> Field {
        let name = self.field.clone();
        let paginate = self.paginate;
        let arguments = self
            .slots
            .iter()
            .filter(|slot| slot.exposed)
            .map(ArgSlot::input_value)
            .collect::<Vec<_>>();
        let dispatcher = Arc::new(self);

        let mut field = Field::new(name, ty, move |ctx: ResolverContext| {
            let dispatcher = dispatcher.clone();
            FieldFuture::new(async move {
                let parent = ctx.parent_value.try_downcast_ref::<Instance>().ok();
                let args = collect_args(&ctx.args)?;
                let output = dispatcher.dispatch(parent, &args)?;
                field_output(&ctx, output)
            })
        });
        for argument in arguments {
            field = field.argument(argument);
        }
        if paginate {
            field = field.connection_arguments();
        }
        field
    }
}

impl fmt::Debug for FieldDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDispatcher")
            .field("owner", &self.owner)
            .field("field", &self.field)
            .field("receiver", &self.receiver)
            .field("slots", &self.slots)
            .field("paginate", &self.paginate)
            .finish()
    }
}
