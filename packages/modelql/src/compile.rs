//! Schema compilation.
//!
//! [`Registry::compile`] turns the registered types into an executable
//! `async_graphql::dynamic::Schema`. Every field that cannot be compiled is
//! dropped with a [`Diagnostic`]; in strict mode any diagnostic fails the build.

use crate::connection::ConnectionBuilder;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dispatch::{derive_slots, hide_paging_collisions, FieldDispatcher, Receiver};
use crate::error::{CompileError, CompileResult, FieldError};
use crate::extension::PartialResults;
use crate::mapper::{classify, Classified, FieldHint, MapError, OutputKind};
use crate::mutation::compile_mutation;
use crate::node::{GlobalId, GlobalIdentity, IdAccessor};
use crate::paging::PAGING_ARGUMENTS;
use crate::registry::{FieldSpec, OutputOverride, RawField, Registry, TypeDescriptor};
use crate::resolver::ModelResolver;
use crate::shape::{Instance, Shape};
use crate::spec::{ObjectNodeExt, PageInfoObject, QueryObject, SchemaBuilderNodeExt};
use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, Object, ResolverContext, Schema, TypeRef,
};
use indexmap::IndexMap;
use modelql_lib::SchemaConfig;
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info};

/// Fields the query root reserves for node lookups.
const NODE_FIELDS: [&str; 2] = ["node", "nodes"];

#[derive(Clone, Debug, PartialEq)]
pub struct FieldLayout {
    pub output: Classified,
    pub arguments: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeLayout {
    /// Implements the node interface.
    pub node: bool,
    pub fields: IndexMap<String, FieldLayout>,
}

/// What was compiled, per object type. Independent of registration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaLayout {
    pub query: String,
    pub mutation: Option<String>,
    pub types: IndexMap<String, TypeLayout>,
    pub inputs: IndexMap<String, Vec<String>>,
    /// Element types that received connection and edge wrappers.
    pub connections: Vec<String>,
}

impl SchemaLayout {
    pub fn field(&self, type_name: &str, field: &str) -> Option<&FieldLayout> {
        self.types.get(type_name)?.fields.get(field)
    }

    pub fn is_node(&self, type_name: &str) -> bool {
        self.types.get(type_name).map_or(false, |layout| layout.node)
    }
}

#[derive(Debug)]
pub struct CompiledSchema {
    pub schema: Schema,
    pub diagnostics: Diagnostics,
    pub identity: Arc<GlobalIdentity>,
    pub layout: SchemaLayout,
}

impl CompiledSchema {
    pub async fn execute(
        &self,
        request: impl Into<async_graphql::Request>,
    ) -> async_graphql::Response {
        self.schema.execute(request).await
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }
}

fn names_where(types: &[TypeDescriptor], f: impl Fn(&TypeDescriptor) -> bool) -> Vec<String> {
    types
        .iter()
        .filter(|desc| f(desc))
        .map(|desc| desc.name.clone())
        .collect()
}

fn resolve_global_id<'a>(
    ctx: ResolverContext<'a>,
    type_name: &str,
    accessor: &IdAccessor,
) -> FieldFuture<'a> {
    let type_name = type_name.to_string();
    let accessor = accessor.clone();
    FieldFuture::new(async move {
        let parent = ctx.parent_value.try_downcast_ref::<Instance>()?;
        let local_id = accessor(parent).ok_or_else(|| FieldError::ReceiverMismatch {
            expected: type_name.clone(),
            found: parent.type_name().to_string(),
        })?;
        Ok(Some(FieldValue::value(
            GlobalId::new(type_name, local_id).encode(),
        )))
    })
}

fn classify_override(
    output: &OutputOverride,
    shape: &Shape,
    known: &HashSet<String>,
) -> Result<Classified, MapError> {
    let (kind, element) = match output {
        OutputOverride::Object(element) => (OutputKind::Object, element),
        OutputOverride::Connection(element) => (OutputKind::Connection, element),
        OutputOverride::Edge(element) => (OutputKind::Edge, element),
    };
    if !known.contains(element) {
        return Err(MapError::UnknownType(element.clone()));
    }
    Ok(Classified::new(kind, element, shape.strip_optional().1))
}

struct Compiler<'c> {
    config: &'c SchemaConfig,
    known: HashSet<String>,
    identity: GlobalIdentity,
    connections: ConnectionBuilder,
    diagnostics: Diagnostics,
}

impl<'c> Compiler<'c> {
    fn compile_field(
        &mut self,
        owner: &str,
        spec: &FieldSpec,
        receiver: &Receiver,
    ) -> Option<(Field, FieldLayout)> {
        let shape = spec.method.returns.first()?;
        let classified = match &spec.output {
            Some(output) => classify_override(output, shape, &self.known),
            None => classify(shape, FieldHint::new(&spec.name), &self.known),
        };
        let classified = match classified {
            Ok(classified) => classified,
            Err(error) => {
                self.diagnostics.push(Diagnostic::Unmappable {
                    type_name: owner.to_string(),
                    field: spec.name.clone(),
                    error,
                });
                return None;
            }
        };

        let mut slots = derive_slots(
            owner,
            &spec.name,
            &spec.method.params,
            &spec.args,
            &mut self.diagnostics,
        )?;
        let paginate = classified.kind == OutputKind::Connection
            && matches!(shape.strip_optional().0, Shape::List(_));
        if paginate && !hide_paging_collisions(owner, &spec.name, &mut slots, &mut self.diagnostics)
        {
            return None;
        }
        if classified.kind.is_wrapper() {
            self.connections.connection_for(&classified.element);
        }

        let mut arguments = slots
            .iter()
            .filter(|slot| slot.exposed)
            .map(|slot| slot.name.clone())
            .collect::<Vec<_>>();
        let mut dispatcher = FieldDispatcher::new(
            owner,
            &spec.name,
            receiver.clone(),
            slots,
            spec.method.invoke.clone(),
        );
        if paginate {
            arguments.extend(PAGING_ARGUMENTS.iter().map(|name| name.to_string()));
            dispatcher = dispatcher.paginated();
        }
        let field = dispatcher.into_field(classified.type_ref());
        Some((
            field,
            FieldLayout {
                output: classified,
                arguments,
            },
        ))
    }

    fn compile_object(
        &mut self,
        desc: &TypeDescriptor,
        raw_fields: Vec<RawField>,
    ) -> (Object, TypeLayout) {
        let root = desc.roles.root;
        let receiver = if root {
            Receiver::Singleton(desc.singleton.clone())
        } else {
            Receiver::Parent
        };
        let mut object = Object::new(&desc.name);
        let mut layout = TypeLayout::default();

        match &desc.id_accessor {
            Some(accessor) if !root => {
                let type_name = desc.name.clone();
                let accessor = accessor.clone();
                if desc.roles.non_node {
                    object = object.field(Field::new(
                        "id",
                        TypeRef::named_nn(TypeRef::ID),
                        move |ctx| resolve_global_id(ctx, &type_name, &accessor),
                    ));
                } else {
                    self.identity
                        .add_node_type(&desc.name, desc.id_resolver.clone());
                    object = object.node_id_field(&self.config.node_interface_name, move |ctx| {
                        resolve_global_id(ctx, &type_name, &accessor)
                    });
                    layout.node = true;
                }
                layout.fields.insert(
                    "id".to_string(),
                    FieldLayout {
                        output: Classified::new(OutputKind::Scalar, TypeRef::ID, false),
                        arguments: Vec::new(),
                    },
                );
            }
            None if !root && !desc.roles.non_node => {
                self.diagnostics
                    .push(Diagnostic::MissingIdField(desc.name.clone()));
            }
            _ => {}
        }

        for spec in desc.fields() {
            let reserved = (layout.fields.contains_key(&spec.name))
                || (root && NODE_FIELDS.contains(&spec.name.as_str()));
            if reserved {
                self.diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: spec.name.clone(),
                });
                continue;
            }
            if let Some((field, field_layout)) = self.compile_field(&desc.name, spec, &receiver) {
                layout.fields.insert(spec.name.clone(), field_layout);
                object = object.field(field);
            }
        }

        for raw in raw_fields {
            let reserved = layout.fields.contains_key(&raw.name)
                || (root && NODE_FIELDS.contains(&raw.name.as_str()));
            if reserved {
                self.diagnostics.push(Diagnostic::DuplicateField {
                    type_name: desc.name.clone(),
                    field: raw.name,
                });
                continue;
            }
            let type_name = raw.type_ref.to_string();
            let nullable = !type_name.ends_with('!');
            layout.fields.insert(
                raw.name,
                FieldLayout {
                    output: Classified::new(OutputKind::Raw, type_name, nullable),
                    arguments: raw.arguments,
                },
            );
            object = object.field(raw.field);
        }

        if root {
            object = object.node_by_id_field::<ModelResolver>(&self.config.node_interface_name);
            if self.config.plural_node_field {
                object =
                    object.node_by_ids_field::<ModelResolver>(&self.config.node_interface_name);
            }
        }
        (object, layout)
    }
}

impl Registry {
    /// Compile every registered type into an executable schema.
    pub fn compile(self, config: &SchemaConfig) -> CompileResult<CompiledSchema> {
        let Registry {
            mut types,
            diagnostics,
            ..
        } = self;

        let roots = names_where(&types, |desc| desc.roles.root);
        if roots.len() > 1 {
            return Err(CompileError::DuplicateQueryRoot(roots));
        }
        let query = roots.into_iter().next().ok_or(CompileError::NoQueryRoot)?;
        let mutation_roots = names_where(&types, |desc| desc.roles.mutation_root);
        if mutation_roots.len() > 1 {
            return Err(CompileError::DuplicateMutationRoot(mutation_roots));
        }

        let mut compiler = Compiler {
            config,
            // The mutation root is only compiled as the mutation object, so
            // no field can return it.
            known: names_where(&types, |desc| desc.roles.root || !desc.roles.mutation_root)
                .into_iter()
                .collect(),
            identity: GlobalIdentity::new(),
            connections: ConnectionBuilder::new(),
            diagnostics,
        };
        let mut layout = SchemaLayout {
            query: query.clone(),
            ..SchemaLayout::default()
        };
        let mut objects = Vec::new();
        let mut inputs = Vec::new();
        let mut mutation_object = None;

        for desc in &mut types {
            if !desc.mutations.is_empty() && !desc.roles.mutation_root {
                compiler
                    .diagnostics
                    .push(Diagnostic::MutationOutsideRoot(desc.name.clone()));
            }

            if desc.roles.mutation_root {
                let owner = config.mutation_type_name.clone();
                let receiver = Receiver::Singleton(desc.singleton.clone());
                let mut object = Object::new(&owner);
                let mut type_layout = TypeLayout::default();
                for spec in &desc.mutations {
                    let Some(mutation) = compile_mutation(
                        &owner,
                        spec,
                        receiver.clone(),
                        &compiler.known,
                        &mut compiler.connections,
                        &mut compiler.diagnostics,
                    ) else {
                        continue;
                    };
                    layout.inputs.insert(
                        mutation.input_type(),
                        mutation
                            .slots()
                            .iter()
                            .map(|slot| slot.name.clone())
                            .collect(),
                    );
                    layout.types.insert(
                        mutation.payload_type(),
                        TypeLayout {
                            node: false,
                            fields: mutation
                                .payload_fields()
                                .into_iter()
                                .map(|field| {
                                    let field_layout = FieldLayout {
                                        output: field.output.clone(),
                                        arguments: Vec::new(),
                                    };
                                    (field.name.clone(), field_layout)
                                })
                                .collect(),
                        },
                    );
                    type_layout.fields.insert(
                        mutation.name().to_string(),
                        FieldLayout {
                            output: Classified::new(
                                OutputKind::Object,
                                mutation.payload_type(),
                                false,
                            ),
                            arguments: vec!["input".to_string()],
                        },
                    );
                    inputs.push(mutation.input_object());
                    objects.push(mutation.payload_object());
                    object = object.field(mutation.into_field());
                }
                if !type_layout.fields.is_empty() {
                    layout.types.insert(owner.clone(), type_layout);
                    layout.mutation = Some(owner);
                    mutation_object = Some(object);
                }
                if !desc.roles.root {
                    continue;
                }
            }

            let raw_fields = std::mem::take(&mut desc.raw_fields);
            let (object, type_layout) = compiler.compile_object(desc, raw_fields);
            layout.types.insert(desc.name.clone(), type_layout);
            objects.push(object);
        }

        let Compiler {
            identity,
            connections,
            diagnostics,
            ..
        } = compiler;
        if config.strict && !diagnostics.is_empty() {
            return Err(CompileError::Strict(diagnostics));
        }
        layout.connections = connections
            .iter()
            .map(|types| types.element.clone())
            .collect();
        layout.connections.sort();

        let identity = Arc::new(identity);
        let mut builder = Schema::build(&query, layout.mutation.as_deref(), None)
            .register_node_types(&config.node_interface_name);
        if !connections.is_empty() {
            builder = builder.register(Object::new_page_info());
        }
        for object in objects
            .into_iter()
            .chain(mutation_object)
            .chain(connections.objects())
        {
            builder = builder.register(object);
        }
        for input in inputs {
            builder = builder.register(input);
        }
        builder = builder.data(identity.clone()).extension(PartialResults);
        if let Some(depth) = config.max_depth {
            builder = builder.limit_depth(depth);
        }
        if let Some(complexity) = config.max_complexity {
            builder = builder.limit_complexity(complexity);
        }
        if !config.introspection {
            builder = builder.disable_introspection();
        }
        let schema = builder
            .finish()
            .map_err(|e| CompileError::Schema(e.to_string()))?;

        info!(
            "Compiled schema with {} object types, {} connection wrappers and {} diagnostic(s)",
            layout.types.len(),
            connections.len(),
            diagnostics.len()
        );
        debug!("Node types: {:?}", identity);

        Ok(CompiledSchema {
            schema,
            diagnostics,
            identity,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Member, Method, Record};
    use crate::registry::{ArgInfo, ArgSpec};
    use crate::shape::Text;
    use async_graphql::PathSegment;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::net::Ipv4Addr;

    #[derive(Clone)]
    struct Item {
        id: String,
        label: String,
    }

    impl Record for Item {
        fn members() -> Vec<Member<Self>> {
            vec![
                Member::new("id", |i: &Item| i.id.clone()),
                Member::new("label", |i: &Item| i.label.clone()),
            ]
        }
    }

    fn stock() -> Vec<Item> {
        ["apple", "pear", "plum"]
            .into_iter()
            .enumerate()
            .map(|(n, label)| Item {
                id: (n + 1).to_string(),
                label: label.to_string(),
            })
            .collect()
    }

    struct Shelf {
        items: Vec<Item>,
    }

    impl Shelf {
        fn get_first(&self) -> Option<Item> {
            self.items.first().cloned()
        }
    }

    impl Record for Shelf {
        fn members() -> Vec<Member<Self>> {
            vec![Member::new("items", |s: &Shelf| s.items.clone())]
        }

        fn methods() -> Vec<Method<Self>> {
            vec![Method::no_args("get_first", Shelf::get_first)]
        }
    }

    struct Orphan;

    impl Record for Orphan {
        fn members() -> Vec<Member<Self>> {
            vec![Member::new("name", |_: &Orphan| "orphan".to_string())]
        }
    }

    fn register_item(registry: &mut Registry) {
        registry
            .register::<Item>()
            .id_field(|item: &Item| item.id.clone())
            .id_resolver(|id| stock().into_iter().find(|item| item.id == id))
            .fields();
    }

    fn register_shelf(registry: &mut Registry) {
        registry
            .register_instance(Shelf { items: stock() })
            .root()
            .fields()
            .resolved_fields()
            .extension_field("labels", ArgSpec::Auto, |shelf: &Shelf, (): ()| {
                shelf
                    .items
                    .iter()
                    .map(|item| item.label.clone())
                    .collect::<Vec<_>>()
            })
            .extension_field("restocked", ArgSpec::Auto, |shelf: &Shelf, (): ()| {
                shelf.items.clone()
            });
    }

    #[test]
    fn test_query_root_is_required() {
        let mut registry = Registry::new();
        register_item(&mut registry);
        assert_matches!(
            registry.compile(&SchemaConfig::default()),
            Err(CompileError::NoQueryRoot)
        );

        let mut registry = Registry::new();
        register_shelf(&mut registry);
        registry.register::<Item>().root();
        assert_matches!(
            registry.compile(&SchemaConfig::default()),
            Err(CompileError::DuplicateQueryRoot(roots)) if roots == vec!["Shelf", "Item"]
        );
    }

    #[test]
    fn test_layout_is_independent_of_registration_order() {
        let mut forward = Registry::new();
        register_item(&mut forward);
        register_shelf(&mut forward);
        let forward = forward.compile(&SchemaConfig::strict()).unwrap();

        let mut backward = Registry::new();
        register_shelf(&mut backward);
        register_item(&mut backward);
        let backward = backward.compile(&SchemaConfig::strict()).unwrap();

        assert_eq!(forward.layout, backward.layout);
        assert!(forward.diagnostics.is_empty());
        assert!(forward.layout.is_node("Item"));
        assert!(!forward.layout.is_node("Shelf"));
    }

    #[test]
    fn test_field_classification() {
        let mut registry = Registry::new();
        register_shelf(&mut registry);
        register_item(&mut registry);
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        let layout = &compiled.layout;

        let items = layout.field("Shelf", "items").unwrap();
        assert_eq!(
            items.output,
            Classified::new(OutputKind::Connection, "Item", false)
        );
        assert_eq!(items.arguments, vec!["first", "after", "last", "before"]);
        assert_eq!(
            layout.field("Shelf", "first").unwrap().output,
            Classified::new(OutputKind::Object, "Item", true)
        );
        assert_eq!(
            layout.field("Shelf", "labels").unwrap().output,
            Classified::new(OutputKind::ScalarList, "String", false)
        );
        assert_eq!(
            layout.field("Item", "id").unwrap().output,
            Classified::new(OutputKind::Scalar, "ID", false)
        );
        // One wrapper pair, shared by `items` and `restocked`.
        assert_eq!(layout.connections, vec!["Item"]);
        let sdl = compiled.sdl();
        assert_eq!(sdl.matches("type ItemConnection").count(), 1);
        assert_eq!(sdl.matches("type ItemEdge").count(), 1);
    }

    #[test]
    fn test_missing_id_field() {
        let mut registry = Registry::new();
        register_shelf(&mut registry);
        register_item(&mut registry);
        registry.register::<Orphan>().fields();
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        assert_eq!(
            compiled.diagnostics.iter().collect::<Vec<_>>(),
            vec![&Diagnostic::MissingIdField("Orphan".to_string())]
        );
        assert!(!compiled.layout.is_node("Orphan"));

        let mut registry = Registry::new();
        register_shelf(&mut registry);
        register_item(&mut registry);
        registry.register::<Orphan>().non_node().fields();
        let compiled = registry.compile(&SchemaConfig::strict()).unwrap();
        assert!(compiled.diagnostics.is_empty());
    }

    #[test]
    fn test_strict_mode_rejects_diagnostics() {
        let mut registry = Registry::new();
        // `Item` is never registered, so both list fields are unmappable.
        register_shelf(&mut registry);
        let err = registry.compile(&SchemaConfig::strict()).err().unwrap();
        assert_matches!(&err, CompileError::Strict(diagnostics) if diagnostics.any(|d| matches!(
            d,
            Diagnostic::Unmappable { error: MapError::UnknownType(name), .. } if name == "Item"
        )));

        let mut registry = Registry::new();
        register_shelf(&mut registry);
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        assert_eq!(compiled.diagnostics.len(), 3);
        assert!(compiled.layout.field("Shelf", "items").is_none());
        assert!(compiled.layout.field("Shelf", "labels").is_some());
    }

    #[tokio::test]
    async fn test_paginated_query() {
        let mut registry = Registry::new();
        register_shelf(&mut registry);
        register_item(&mut registry);
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();

        let response = compiled
            .execute(
                r#"{
                    items(first: 2, after: "YXJyYXljb25uZWN0aW9uOjA=") {
                        totalCount
                        edges { cursor node { id label } }
                        pageInfo { hasNextPage hasPreviousPage startCursor endCursor }
                    }
                }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "items": {
                    "totalCount": 3,
                    "edges": [
                        { "cursor": "YXJyYXljb25uZWN0aW9uOjE=", "node": { "id": "SXRlbToy", "label": "pear" } },
                        { "cursor": "YXJyYXljb25uZWN0aW9uOjI=", "node": { "id": "SXRlbToz", "label": "plum" } },
                    ],
                    "pageInfo": {
                        "hasNextPage": false,
                        "hasPreviousPage": false,
                        "startCursor": "YXJyYXljb25uZWN0aW9uOjE=",
                        "endCursor": "YXJyYXljb25uZWN0aW9uOjI=",
                    },
                }
            })
        );
    }

    #[tokio::test]
    async fn test_node_lookup() {
        let mut registry = Registry::new();
        register_shelf(&mut registry);
        register_item(&mut registry);
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();

        let response = compiled
            .execute(
                r#"{
                    node(id: "SXRlbTox") { id ... on Item { label } }
                    nodes(ids: ["SXRlbToy", "U2hlbGY6MQ==", "not base64"]) { id }
                }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "node": { "id": "SXRlbTox", "label": "apple" },
                "nodes": [{ "id": "SXRlbToy" }, null, null],
            })
        );
    }

    #[test]
    fn test_hidden_required_argument_drops_the_field() {
        let window = |required: bool| {
            let first = ArgInfo::new("first");
            let first = if required { first.required() } else { first.default("2") };
            ArgSpec::Explicit(vec![first])
        };
        let take = |shelf: &Shelf, (first,): (i32,)| {
            shelf
                .items
                .iter()
                .take(first.max(0) as usize)
                .cloned()
                .collect::<Vec<_>>()
        };

        let mut registry = Registry::new();
        register_item(&mut registry);
        registry
            .register_instance(Shelf { items: stock() })
            .root()
            .extension_field("window", window(true), take);
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        assert!(compiled.layout.field("Shelf", "window").is_none());
        assert!(compiled.diagnostics.any(|d| matches!(
            d,
            Diagnostic::RequiredArgumentHidden { field, argument, .. }
                if field == "window" && argument == "first"
        )));

        let mut registry = Registry::new();
        register_item(&mut registry);
        registry
            .register_instance(Shelf { items: stock() })
            .root()
            .extension_field("window", window(true), take);
        assert_matches!(
            registry.compile(&SchemaConfig::strict()),
            Err(CompileError::Strict(_))
        );

        // With a default the field survives, bound to the default.
        let mut registry = Registry::new();
        register_item(&mut registry);
        registry
            .register_instance(Shelf { items: stock() })
            .root()
            .extension_field("window", window(false), take);
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        assert_eq!(
            compiled.layout.field("Shelf", "window").unwrap().arguments,
            vec!["first", "after", "last", "before"]
        );
        assert_eq!(compiled.diagnostics.len(), 1);
        assert_matches!(
            compiled.diagnostics.iter().next(),
            Some(Diagnostic::ArgumentShadowsPaging { .. })
        );
    }

    struct Ledger;

    impl Ledger {
        fn close(&self) -> String {
            "closed".to_string()
        }
    }

    impl Record for Ledger {
        fn members() -> Vec<Member<Self>> {
            vec![Member::new("balance", |_: &Ledger| 0)]
        }

        fn methods() -> Vec<Method<Self>> {
            vec![Method::no_args("close", Ledger::close)]
        }
    }

    #[test]
    fn test_mutation_root_is_not_an_output_type() {
        let mut registry = Registry::new();
        register_item(&mut registry);
        register_shelf(&mut registry);
        registry.register_instance(Ledger).mutation_root().fields();
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        assert!(compiled.diagnostics.is_empty(), "{}", compiled.diagnostics);
        assert!(!compiled.layout.types.contains_key("Ledger"));

        let mut registry = Registry::new();
        register_item(&mut registry);
        registry
            .register_instance(Shelf { items: stock() })
            .root()
            .extension_field("ledger", ArgSpec::Auto, |_: &Shelf, (): ()| Ledger);
        registry.register_instance(Ledger).mutation_root();
        let compiled = registry.compile(&SchemaConfig::default()).unwrap();
        assert_eq!(
            compiled.diagnostics.iter().collect::<Vec<_>>(),
            vec![&Diagnostic::Unmappable {
                type_name: "Shelf".to_string(),
                field: "ledger".to_string(),
                error: MapError::UnknownType("Ledger".to_string()),
            }]
        );
        assert!(compiled.layout.field("Shelf", "ledger").is_none());
    }

    #[derive(Clone)]
    struct Origin {
        farm: String,
        address: Text<Ipv4Addr>,
    }

    impl Record for Origin {
        fn members() -> Vec<Member<Self>> {
            vec![
                Member::new("farm", |o: &Origin| o.farm.clone()),
                Member::new("address", |o: &Origin| o.address),
            ]
        }
    }

    #[derive(Clone)]
    struct Pallet {
        code: String,
        origin: Origin,
    }

    impl Record for Pallet {
        fn members() -> Vec<Member<Self>> {
            vec![Member::new("code", |p: &Pallet| p.code.clone())]
        }
    }

    struct Dock;

    impl Record for Dock {
        fn members() -> Vec<Member<Self>> {
            vec![]
        }
    }

    fn shout(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
        FieldFuture::new(async move {
            let pallet = ctx.parent_value.try_downcast_ref::<Instance>()?;
            let pallet = pallet.downcast::<Pallet>()?;
            let suffix = match ctx.args.get("suffix") {
                Some(suffix) => suffix.string()?.to_string(),
                None => String::new(),
            };
            Ok(Some(FieldValue::value(format!(
                "{}{suffix}",
                pallet.code.to_uppercase()
            ))))
        })
    }

    fn dock_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register::<Pallet>()
            .non_node()
            .fields()
            .embedded(|pallet: &Pallet| &pallet.origin)
            .add_field(
                "shout",
                TypeRef::named_nn(TypeRef::STRING),
                &[("suffix", TypeRef::named(TypeRef::STRING))],
                shout,
            );
        registry
            .register_instance(Dock)
            .root()
            .extension_field("pallet", ArgSpec::Auto, |_: &Dock, (): ()| Pallet {
                code: "p-1".to_string(),
                origin: Origin {
                    farm: "Hilltop".to_string(),
                    address: Text(Ipv4Addr::new(10, 0, 0, 7)),
                },
            })
            .extension_field(
                "loopback",
                ArgSpec::Explicit(vec![ArgInfo::new("via")]),
                |_: &Dock, (via,): (Option<Text<Ipv4Addr>>,)| {
                    via.map(|via| via.into_inner().is_loopback())
                },
            )
            .extension_field("fragile", ArgSpec::Auto, |_: &Dock, (): ()| -> Option<String> {
                panic!("dock collapsed")
            });
        registry
    }

    #[test]
    fn test_embedded_text_and_raw_fields_layout() {
        let compiled = dock_registry().compile(&SchemaConfig::strict()).unwrap();
        let layout = &compiled.layout;
        assert_eq!(
            layout.types["Pallet"].fields.keys().collect::<Vec<_>>(),
            vec!["code", "farm", "address", "shout"]
        );
        assert_eq!(
            layout.field("Pallet", "address").unwrap().output,
            Classified::new(OutputKind::Scalar, "String", false)
        );
        let shout = layout.field("Pallet", "shout").unwrap();
        assert_eq!(shout.output, Classified::new(OutputKind::Raw, "String!", false));
        assert_eq!(shout.arguments, vec!["suffix"]);
        assert_eq!(layout.field("Dock", "loopback").unwrap().arguments, vec!["via"]);
        assert!(compiled.sdl().contains("shout(suffix: String): String!"));
        assert!(format!("{compiled:?}").starts_with("CompiledSchema"));
    }

    #[tokio::test]
    async fn test_nullable_field_errors_keep_sibling_data() {
        let compiled = dock_registry().compile(&SchemaConfig::strict()).unwrap();
        let response = compiled
            .execute(
                r#"{
                    pallet { code farm address shout(suffix: "!") }
                    loopback(via: "127.0.0.1")
                    bad: loopback(via: "not an address")
                    fragile
                }"#,
            )
            .await;
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({
                "pallet": { "code": "p-1", "farm": "Hilltop", "address": "10.0.0.7", "shout": "P-1!" },
                "loopback": true,
                "bad": null,
                "fragile": null,
            })
        );
        let mut paths = response
            .errors
            .iter()
            .map(|error| error.path.clone())
            .collect::<Vec<_>>();
        paths.sort_by_key(|path| format!("{path:?}"));
        assert_eq!(
            paths,
            vec![
                vec![PathSegment::Field("bad".to_string())],
                vec![PathSegment::Field("fragile".to_string())],
            ]
        );
        assert!(response
            .errors
            .iter()
            .any(|error| error.message.contains("dock collapsed")));
    }
}
