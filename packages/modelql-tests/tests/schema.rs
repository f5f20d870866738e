use assert_matches::assert_matches;
use modelql::{
    ArgInfo, ArgSpec, Classified, CompileError, Diagnostic, OutputKind, Registry, SchemaConfig,
};
use modelql_tests::{
    fixtures::{
        query_data, register_mutation, register_root, register_todo, register_user,
        register_user_with, setup_todo_schema, todo_registry, todo_schema,
    },
    todo::{Todo, TodoStore, User},
    WORKSPACE_ROOT,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_todo_schema_compiles_cleanly() {
    let (_store, compiled) = setup_todo_schema();
    assert!(compiled.diagnostics.is_empty());

    let layout = &compiled.layout;
    assert_eq!(layout.query, "Root");
    assert_eq!(layout.mutation.as_deref(), Some("Mutation"));
    assert!(layout.is_node("Todo"));
    assert!(layout.is_node("User"));
    assert!(!layout.is_node("Root"));
    assert_eq!(layout.connections, vec!["Todo"]);

    let todos = layout.field("User", "todos").unwrap();
    assert_eq!(
        todos.output,
        Classified::new(OutputKind::Connection, "Todo", false)
    );
    assert_eq!(todos.arguments, vec!["status", "first", "after", "last", "before"]);

    assert_eq!(
        layout.field("AddTodoPayload", "todoEdge").unwrap().output,
        Classified::new(OutputKind::Edge, "Todo", false)
    );
    assert_eq!(
        layout.field("RemoveCompletedTodosPayload", "deletedTodoIds").unwrap().output,
        Classified::new(OutputKind::ScalarList, "ID", false)
    );
    assert_eq!(layout.inputs["AddTodoInput"], vec!["text"]);
    assert_eq!(layout.inputs["RenameTodoInput"], vec!["id", "text"]);
    assert_eq!(layout.inputs["ToggleTodoInput"], vec!["id"]);
}

#[test]
fn test_todo_schema_sdl() {
    let (_store, compiled) = setup_todo_schema();
    let sdl = compiled.sdl();
    for expected in [
        "interface Node",
        "type Todo implements Node",
        "type User implements Node",
        "type TodoConnection",
        "type TodoEdge",
        "type PageInfo",
        "input AddTodoInput",
        "type AddTodoPayload",
        "input ToggleTodoInput",
        "type ToggleTodoPayload",
        "clientMutationId: String",
    ] {
        assert!(sdl.contains(expected), "missing `{expected}` in:\n{sdl}");
    }
    assert_eq!(sdl.matches("type TodoConnection").count(), 1);
}

#[test]
fn test_registration_order_does_not_matter() {
    let store = TodoStore::seeded();
    let forward = todo_schema(&store, &SchemaConfig::strict()).unwrap();

    let mut registry = Registry::new();
    register_mutation(&mut registry, &store);
    register_root(&mut registry, &store);
    register_user(&mut registry, &store);
    register_todo(&mut registry, &store);
    let backward = registry.compile(&SchemaConfig::strict()).unwrap();

    assert_eq!(forward.layout, backward.layout);
}

#[test]
fn test_duplicate_registration_is_dropped() {
    let store = TodoStore::seeded();
    let mut registry = todo_registry(&store);
    registry.register::<Todo>().non_node();
    let compiled = registry.compile(&SchemaConfig::default()).unwrap();
    assert_eq!(
        compiled.diagnostics.iter().collect::<Vec<_>>(),
        vec![&Diagnostic::DuplicateType("Todo".to_string())]
    );
    assert!(compiled.layout.is_node("Todo"));
}

#[test]
fn test_strict_mode_fails_on_diagnostics() {
    let store = TodoStore::seeded();
    let mut registry = todo_registry(&store);
    registry.register::<Todo>();
    let err = registry.compile(&SchemaConfig::strict()).err().unwrap();
    assert_matches!(err, CompileError::Strict(diagnostics) if diagnostics.len() == 1);
}

#[test]
fn test_config_from_file() {
    let path = format!("{WORKSPACE_ROOT}/assets/modelql-config.yaml");
    let config = SchemaConfig::from_file(path).unwrap();
    assert_eq!(config.max_depth, Some(16));

    let compiled = todo_schema(&TodoStore::seeded(), &config).unwrap();
    assert_eq!(compiled.layout.mutation.as_deref(), Some("TodoMutations"));

    let sdl = compiled.sdl();
    assert!(sdl.contains("type TodoMutations"));
    assert!(!sdl.contains("nodes("));
}

/// The todo model plus `User.recent`, whose only parameter is named `first`.
fn registry_with_recent(store: &TodoStore, first: ArgInfo) -> Registry {
    let mut registry = Registry::new();
    register_todo(&mut registry, store);
    register_root(&mut registry, store);
    register_mutation(&mut registry, store);
    let recent = store.clone();
    register_user_with(&mut registry, store, move |user| {
        user.extension_field(
            "recent",
            ArgSpec::Explicit(vec![first]),
            move |_: &User, (first,): (i32,)| {
                recent
                    .get_todos("any")
                    .into_iter()
                    .rev()
                    .take(first.max(0) as usize)
                    .collect::<Vec<_>>()
            },
        )
    });
    registry
}

#[tokio::test]
async fn test_hidden_required_parameter_drops_the_field() {
    let store = TodoStore::seeded();
    let compiled = registry_with_recent(&store, ArgInfo::new("first").required())
        .compile(&SchemaConfig::default())
        .unwrap();
    assert!(compiled.layout.field("User", "recent").is_none());
    assert!(compiled.diagnostics.any(|d| matches!(
        d,
        Diagnostic::RequiredArgumentHidden { type_name, field, argument }
            if type_name == "User" && field == "recent" && argument == "first"
    )));
    let response = compiled
        .execute("{ viewer { recent(first: 1) { totalCount } } }")
        .await;
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("recent"));

    let err = registry_with_recent(&store, ArgInfo::new("first").required())
        .compile(&SchemaConfig::strict())
        .err()
        .unwrap();
    assert_matches!(err, CompileError::Strict(diagnostics) if diagnostics.len() == 2);
}

#[tokio::test]
async fn test_hidden_parameter_binds_its_default() {
    let store = TodoStore::seeded();
    let compiled = registry_with_recent(&store, ArgInfo::new("first").default("1"))
        .compile(&SchemaConfig::default())
        .unwrap();
    assert_matches!(
        compiled.diagnostics.iter().collect::<Vec<_>>().as_slice(),
        [Diagnostic::ArgumentShadowsPaging { argument, .. }] if argument == "first"
    );
    // `first: 2` pages the method's single result instead of reaching its parameter.
    let data = query_data(
        &compiled,
        "{ viewer { recent(first: 2) { totalCount edges { node { text } } } } }",
    )
    .await;
    assert_eq!(
        data,
        json!({
            "viewer": {
                "recent": {
                    "totalCount": 1,
                    "edges": [{ "node": { "text": "Sleep tight" } }],
                }
            }
        })
    );
}
