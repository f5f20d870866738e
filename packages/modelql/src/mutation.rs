//! Relay input object mutations.
//!
//! Each mutation field takes a single `input: {Name}Input!` argument and
//! returns a `{Name}Payload` object. Both envelopes carry the optional
//! `clientMutationId`, which is echoed back unchanged.

use crate::connection::{Connection, ConnectionBuilder};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dispatch::{
    bind_arguments, collect_args, derive_slots, invoke_guarded, ArgSlot, Receiver,
};
use crate::error::{FieldError, FieldResult};
use crate::extension::field_output;
use crate::mapper::{classify, Classified, FieldHint, MapError, OutputKind};
use crate::naming::{strip_wrapper_suffix, type_name};
use crate::record::ErasedInvoker;
use crate::registry::{MutationSpec, OutputInfo, OutputSpec};
use crate::resolver::ModelResolver;
use crate::shape::{Output, RecordRef, Shape, Wrapper};
use crate::spec::{MutationField, MutationInputObject, MutationPayloadObject, MutationTypeRef};
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, Object, ResolverContext, TypeRef,
};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use modelql_lib::defaults::CLIENT_MUTATION_ID;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::debug;

/// The resolved value of a mutation, parent of the payload fields.
#[derive(Clone, Debug, Default)]
pub struct MutationPayload {
    pub client_mutation_id: Option<String>,
    pub values: IndexMap<String, Output>,
}

impl MutationPayload {
    pub fn get(&self, field: &str) -> Option<&Output> {
        self.values.get(field)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PayloadField {
    pub name: String,
    pub output: Classified,
}

impl PayloadField {
    /// Connection outputs are delivered whole, without paging.
    fn prepare(&self, value: Output) -> Output {
        match (self.output.kind, value) {
            (OutputKind::Connection, Output::List(items)) => {
                Output::Connection(Box::new(Connection::unpaged(items)))
            }
            (_, value) => value,
        }
    }
}

#[derive(Clone, Debug)]
enum OutputPlan {
    /// Fields read off the single returned record by member name.
    Auto {
        record: RecordRef,
        fields: Vec<PayloadField>,
    },
    /// Fields taken from the returned values by position. Dropped positions are `None`.
    Explicit(Vec<Option<PayloadField>>),
}

impl OutputPlan {
    fn fields(&self) -> Vec<&PayloadField> {
        match self {
            Self::Auto { fields, .. } => fields.iter().collect(),
            Self::Explicit(fields) => fields.iter().flatten().collect(),
        }
    }

    fn remap(&self, outputs: Vec<Output>) -> FieldResult<IndexMap<String, Output>> {
        match self {
            Self::Auto { record, fields } => {
                let instance = match outputs.into_iter().next() {
                    Some(Output::Object(instance)) => instance,
                    _ => return Ok(IndexMap::new()),
                };
                let members = record.unwrap(&instance).ok_or_else(|| {
                    FieldError::ReceiverMismatch {
                        expected: record.name().to_string(),
                        found: instance.type_name().to_string(),
                    }
                })?;
                let mut members = members.into_iter().collect::<HashMap<_, _>>();
                Ok(fields
                    .iter()
                    .filter_map(|field| {
                        members
                            .remove(&field.name)
                            .map(|value| (field.name.clone(), field.prepare(value)))
                    })
                    .collect())
            }
            Self::Explicit(fields) => Ok(fields
                .iter()
                .zip(outputs)
                .filter_map(|(field, value)| {
                    field
                        .as_ref()
                        .map(|field| (field.name.clone(), field.prepare(value)))
                })
                .collect()),
        }
    }
}

pub struct CompiledMutation {
    name: String,
    envelope: String,
    receiver: Receiver,
    slots: Vec<ArgSlot>,
    invoke: ErasedInvoker,
    outputs: OutputPlan,
}

impl CompiledMutation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_type(&self) -> String {
        TypeRef::mutation_input(&self.envelope)
    }

    pub fn payload_type(&self) -> String {
        TypeRef::mutation_payload(&self.envelope)
    }

    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    pub fn payload_fields(&self) -> Vec<&PayloadField> {
        self.outputs.fields()
    }

    /// Bind `input`, invoke the method and remap its results onto payload fields.
    pub fn execute(&self, input: &IndexMap<String, ConstValue>) -> FieldResult<MutationPayload> {
        let receiver = self.receiver.resolve(&self.name, None)?;
        let client_mutation_id = match input.get(CLIENT_MUTATION_ID) {
            Some(ConstValue::String(id)) => Some(id.clone()),
            _ => None,
        };
        let bound = bind_arguments(&self.name, &self.slots, input)?;
        debug!("Executing mutation {}", self.name);
        let outputs = invoke_guarded(&self.name, || (self.invoke)(receiver, bound))?;
        Ok(MutationPayload {
            client_mutation_id,
            values: self.outputs.remap(outputs)?,
        })
    }

    pub fn input_object(&self) -> InputObject {
        self.slots
            .iter()
            .filter(|slot| slot.exposed)
            .fold(InputObject::new_mutation_input(&self.envelope), |input, slot| {
                input.field(slot.input_value())
            })
    }

    pub fn payload_object(&self) -> Object {
        self.outputs.fields().into_iter().fold(
            Object::new_mutation_payload::<ModelResolver>(&self.envelope),
            |object, field| object.field(payload_field(field)),
        )
    }

    pub fn into_field(self) -> Field {
        let name = self.name.clone();
        let envelope = self.envelope.clone();
        let payload_type = self.payload_type();
        let mutation = Arc::new(self);
        Field::new(
            name,
            TypeRef::named_nn(payload_type),
            move |ctx: ResolverContext| {
                let mutation = mutation.clone();
                FieldFuture::new(async move {
                    let input = ctx.args.try_get("input")?;
                    let input = collect_args(&input.object()?)?;
                    let payload = mutation.execute(&input)?;
                    Ok(Some(FieldValue::owned_any(payload)))
                })
            },
        )
        .mutation_input_argument(envelope)
    }
}

fn payload_field(field: &PayloadField) -> Field {
    let key = field.name.clone();
    Field::new(
        &field.name,
        field.output.type_ref(),
        move |ctx: ResolverContext| {
            let key = key.clone();
            FieldFuture::new(async move {
                let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
                let value = payload.get(&key).cloned().unwrap_or(Output::Null);
                field_output(&ctx, value)
            })
        },
    )
}

fn wrapper_of(kind: OutputKind) -> Option<Wrapper> {
    match kind {
        OutputKind::Edge => Some(Wrapper::Edge),
        OutputKind::Connection => Some(Wrapper::Connection),
        _ => None,
    }
}

fn auto_outputs(
    spec: &MutationSpec,
    known: &HashSet<String>,
    diagnostics: &mut Diagnostics,
) -> Option<OutputPlan> {
    let record = match spec.method.returns.as_slice() {
        [shape] => match shape.strip_optional().0 {
            Shape::Record(record) => record.clone(),
            _ => return None,
        },
        _ => return None,
    };

    let fields = record
        .members()
        .into_iter()
        .filter_map(|member| {
            let classified = classify(&member.shape, FieldHint::new(&member.name), known)
                .and_then(|classified| match wrapper_of(classified.kind) {
                    // Payload wrappers must name their element.
                    Some(wrapper)
                        if strip_wrapper_suffix(&member.name, wrapper.suffix()).is_none() =>
                    {
                        Err(MapError::CannotInferElement {
                            field: member.name.clone(),
                            wrapper,
                        })
                    }
                    _ => Ok(classified),
                });
            match classified {
                Ok(output) => Some(PayloadField {
                    name: member.name,
                    output,
                }),
                Err(error) => {
                    diagnostics.push(Diagnostic::Unmappable {
                        type_name: TypeRef::mutation_payload(type_name(&spec.name)),
                        field: member.name,
                        error,
                    });
                    None
                }
            }
        })
        .collect();
    Some(OutputPlan::Auto { record, fields })
}

fn explicit_outputs(
    spec: &MutationSpec,
    infos: &[OutputInfo],
    known: &HashSet<String>,
    diagnostics: &mut Diagnostics,
) -> Option<OutputPlan> {
    if infos.len() != spec.method.returns.len() {
        diagnostics.push(Diagnostic::OutputCountMismatch {
            field: spec.name.clone(),
            declared: infos.len(),
            expected: spec.method.returns.len(),
        });
        return None;
    }
    let fields = infos
        .iter()
        .zip(spec.method.returns.iter())
        .map(|(info, shape)| {
            let hint = FieldHint::new(&info.name).with_element(info.element.as_deref());
            match classify(shape, hint, known) {
                Ok(output) => Some(PayloadField {
                    name: info.name.clone(),
                    output,
                }),
                Err(error) => {
                    diagnostics.push(Diagnostic::Unmappable {
                        type_name: TypeRef::mutation_payload(type_name(&spec.name)),
                        field: info.name.clone(),
                        error,
                    });
                    None
                }
            }
        })
        .collect();
    Some(OutputPlan::Explicit(fields))
}

/// Compile one mutation. Returns `None`, with a diagnostic, when the field is dropped.
pub fn compile_mutation(
    owner: &str,
    spec: &MutationSpec,
    receiver: Receiver,
    known: &HashSet<String>,
    connections: &mut ConnectionBuilder,
    diagnostics: &mut Diagnostics,
) -> Option<CompiledMutation> {
    let slots = derive_slots(owner, &spec.name, &spec.method.params, &spec.args, diagnostics)?;
    let outputs = match &spec.outputs {
        OutputSpec::Auto => {
            let plan = auto_outputs(spec, known, diagnostics);
            if plan.is_none() {
                diagnostics.push(Diagnostic::AutoOutputsRequireRecord {
                    field: spec.name.clone(),
                });
            }
            plan?
        }
        OutputSpec::Explicit(infos) => explicit_outputs(spec, infos, known, diagnostics)?,
    };
    for field in outputs.fields() {
        if field.output.kind.is_wrapper() {
            connections.connection_for(&field.output.element);
        }
    }
    Some(CompiledMutation {
        name: spec.name.clone(),
        envelope: type_name(&spec.name),
        receiver,
        slots,
        invoke: spec.method.invoke.clone(),
        outputs,
    })
}
