use crate::todo::{Mutation, Root, Todo, TodoStore, User};
use async_graphql::{PathSegment, Request, ServerError};
use modelql::{
    ArgInfo, ArgSpec, CompileResult, CompiledSchema, OutputInfo, OutputSpec, Registry,
    SchemaConfig, TypeBuilder,
};
use modelql_lib::utils::init_logging;
use serde_json::Value;

pub fn register_todo(registry: &mut Registry, store: &TodoStore) {
    let todos = store.clone();
    registry
        .register::<Todo>()
        .id_resolver(move |id| todos.get_todo(id))
        .id_field(|todo: &Todo| todo.id.clone())
        .fields();
}

pub fn register_user(registry: &mut Registry, store: &TodoStore) {
    register_user_with(registry, store, |user| user);
}

/// [`register_user`] followed by `extra` declarations on `User`.
pub fn register_user_with<'r>(
    registry: &'r mut Registry,
    store: &TodoStore,
    extra: impl FnOnce(TypeBuilder<'r, User>) -> TypeBuilder<'r, User>,
) {
    let users = store.clone();
    let user = registry
        .register::<User>()
        .id_resolver(move |id| users.get_user(id))
        .id_field(|user: &User| user.id.clone())
        .resolved_field("todos", "get_todos", ArgSpec::Auto)
        .resolved_field("totalCount", "get_total_count", ArgSpec::Auto)
        .resolved_field("completedCount", "get_completed_count", ArgSpec::Auto);
    extra(user);
}

pub fn register_root(registry: &mut Registry, store: &TodoStore) {
    registry
        .register_instance(Root::new(store.clone()))
        .root()
        .resolved_field("viewer", "get_viewer", ArgSpec::Auto);
}

pub fn register_mutation(registry: &mut Registry, store: &TodoStore) {
    registry
        .register_instance(Mutation::new(store.clone()))
        .mutation_root()
        .mutation_field(
            "addTodo",
            "add_todo",
            ArgSpec::Auto,
            OutputSpec::Explicit(vec![
                // Edge outputs name their element so the wrapper can be found.
                OutputInfo::new("todoEdge").element("Todo"),
                OutputInfo::new("viewer"),
            ]),
        )
        .mutation_field(
            "changeTodoStatus",
            "change_todo_status",
            ArgSpec::Explicit(vec![
                ArgInfo::new("id").required(),
                ArgInfo::new("complete").required(),
            ]),
            OutputSpec::Explicit(vec![OutputInfo::new("todo"), OutputInfo::new("viewer")]),
        )
        .mutation_field(
            "markAllTodos",
            "mark_all_todos",
            ArgSpec::Explicit(vec![ArgInfo::new("complete").required()]),
            OutputSpec::Explicit(vec![
                OutputInfo::new("changedTodos"),
                OutputInfo::new("viewer"),
            ]),
        )
        .mutation_field(
            "removeCompletedTodos",
            "remove_completed_todos",
            ArgSpec::Explicit(vec![]),
            OutputSpec::Explicit(vec![
                OutputInfo::new("deletedTodoIds"),
                OutputInfo::new("viewer"),
            ]),
        )
        .mutation_field(
            "removeTodo",
            "remove_todo",
            ArgSpec::Explicit(vec![ArgInfo::new("id").required()]),
            OutputSpec::Explicit(vec![
                OutputInfo::new("deletedTodoId"),
                OutputInfo::new("viewer"),
            ]),
        )
        .mutation_field(
            "renameTodo",
            "rename_todo",
            ArgSpec::Explicit(vec![
                ArgInfo::new("id").required(),
                ArgInfo::new("text").required(),
            ]),
            OutputSpec::Explicit(vec![OutputInfo::new("todo"), OutputInfo::new("viewer")]),
        )
        .mutation_field("toggleTodo", "toggle_todo", ArgSpec::Auto, OutputSpec::Auto);
}

/// Register the todo model against `store`.
pub fn todo_registry(store: &TodoStore) -> Registry {
    let mut registry = Registry::new();
    register_todo(&mut registry, store);
    register_user(&mut registry, store);
    register_root(&mut registry, store);
    register_mutation(&mut registry, store);
    registry
}

pub fn todo_schema(store: &TodoStore, config: &SchemaConfig) -> CompileResult<CompiledSchema> {
    todo_registry(store).compile(config)
}

/// A seeded store with its strictly compiled schema.
pub fn setup_todo_schema() -> (TodoStore, CompiledSchema) {
    let config = SchemaConfig::strict();
    let _ = init_logging(&config);
    let store = TodoStore::seeded();
    let schema = match todo_schema(&store, &config) {
        Ok(schema) => schema,
        Err(e) => panic!("Todo schema failed to compile: {e}"),
    };
    (store, schema)
}

/// `message (at a.0.b)` for each error.
pub fn error_lines(errors: &[ServerError]) -> Vec<String> {
    errors
        .iter()
        .map(|error| {
            let path = error
                .path
                .iter()
                .map(|segment| match segment {
                    PathSegment::Field(name) => name.clone(),
                    PathSegment::Index(index) => index.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                error.message.clone()
            } else {
                format!("{} (at {path})", error.message)
            }
        })
        .collect()
}

/// Execute `query` and return its data, panicking on any error.
pub async fn query_data(schema: &CompiledSchema, query: impl Into<Request>) -> Value {
    let response = schema.execute(query).await;
    if !response.errors.is_empty() {
        panic!(
            "Query failed with {} error(s):\n  {}",
            response.errors.len(),
            error_lines(&response.errors).join("\n  ")
        );
    }
    match response.data.into_json() {
        Ok(data) => data,
        Err(e) => panic!("Response data is not JSON: {e}"),
    }
}
