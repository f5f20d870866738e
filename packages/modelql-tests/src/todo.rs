//! The classic Relay todo model: a single viewer owning a list of todos.

use crate::defaults;
use indexmap::IndexMap;
use modelql::{
    paging::cursor_for_offset, Edge, GlobalId, Id, Member, Method, Record,
};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub complete: bool,
}

#[derive(Debug, Default)]
struct TodoTable {
    todos: IndexMap<String, Todo>,
    next_id: usize,
}

/// In-memory todo storage shared by every record of the model.
#[derive(Clone, Debug, Default)]
pub struct TodoStore {
    table: Arc<RwLock<TodoTable>>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        let store = Self::new();
        for (text, complete) in defaults::SEED_TODOS {
            store.add_todo(text, complete);
        }
        store
    }

    pub fn add_todo(&self, text: impl Into<String>, complete: bool) -> Todo {
        let mut table = self.table.write();
        table.next_id += 1;
        let todo = Todo {
            id: table.next_id.to_string(),
            text: text.into(),
            complete,
        };
        table.todos.insert(todo.id.clone(), todo.clone());
        debug!("Added todo {}", todo.id);
        todo
    }

    pub fn get_todo(&self, id: &str) -> Option<Todo> {
        self.table.read().todos.get(id).cloned()
    }

    /// `completed`/`complete`, `active`/`incomplete`, anything else matches all.
    pub fn get_todos(&self, status: &str) -> Vec<Todo> {
        let table = self.table.read();
        table
            .todos
            .values()
            .filter(|todo| match status {
                "completed" | "complete" => todo.complete,
                "active" | "incomplete" => !todo.complete,
                _ => true,
            })
            .cloned()
            .collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.table.read().todos.get_index_of(id)
    }

    pub fn change_todo_status(&self, id: &str, complete: bool) -> Option<Todo> {
        let mut table = self.table.write();
        let todo = table.todos.get_mut(id)?;
        todo.complete = complete;
        Some(todo.clone())
    }

    /// Ids of the todos whose status actually changed.
    pub fn mark_all_todos(&self, complete: bool) -> Vec<String> {
        let mut table = self.table.write();
        table
            .todos
            .values_mut()
            .filter(|todo| todo.complete != complete)
            .map(|todo| {
                todo.complete = complete;
                todo.id.clone()
            })
            .collect()
    }

    pub fn remove_completed_todos(&self) -> Vec<String> {
        let mut table = self.table.write();
        let removed = table
            .todos
            .values()
            .filter(|todo| todo.complete)
            .map(|todo| todo.id.clone())
            .collect::<Vec<_>>();
        table.todos.retain(|_, todo| !todo.complete);
        removed
    }

    pub fn remove_todo(&self, id: &str) -> Option<String> {
        self.table
            .write()
            .todos
            .shift_remove(id)
            .map(|todo| todo.id)
    }

    pub fn rename_todo(&self, id: &str, text: &str) -> Option<Todo> {
        let mut table = self.table.write();
        let todo = table.todos.get_mut(id)?;
        todo.text = text.to_string();
        Some(todo.clone())
    }

    pub fn viewer(&self) -> User {
        User {
            id: defaults::VIEWER_ID.to_string(),
            store: self.clone(),
        }
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        (id == defaults::VIEWER_ID).then(|| self.viewer())
    }
}

/// Local id of a todo from its global id.
fn todo_id(id: &Id) -> Option<String> {
    GlobalId::decode(id.as_str())
        .filter(|global| global.type_name == "Todo")
        .map(|global| global.local_id)
}

fn global_todo_id(local_id: String) -> Id {
    Id(GlobalId::new("Todo", local_id).encode())
}

impl Record for Todo {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::new("id", |t: &Todo| t.id.clone()),
            Member::new("text", |t: &Todo| t.text.clone()),
            Member::new("complete", |t: &Todo| t.complete),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: String,
    store: TodoStore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TodosArgs {
    pub status: String,
}

impl Record for TodosArgs {
    fn members() -> Vec<Member<Self>> {
        vec![Member::new("status", |a: &TodosArgs| a.status.clone()).default("any")]
    }
}

impl User {
    fn get_todos(&self, args: TodosArgs) -> Vec<Todo> {
        self.store.get_todos(&args.status)
    }

    fn get_total_count(&self) -> i32 {
        self.store.get_todos("any").len() as i32
    }

    fn get_completed_count(&self) -> i32 {
        self.store.get_todos("completed").len() as i32
    }
}

impl Record for User {
    fn members() -> Vec<Member<Self>> {
        vec![Member::new("id", |u: &User| u.id.clone())]
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("get_todos", User::get_todos),
            Method::no_args("get_total_count", User::get_total_count),
            Method::no_args("get_completed_count", User::get_completed_count),
        ]
    }
}

pub struct Root {
    store: TodoStore,
}

impl Root {
    pub fn new(store: TodoStore) -> Self {
        Self { store }
    }

    fn get_viewer(&self) -> User {
        self.store.viewer()
    }
}

impl Record for Root {
    fn members() -> Vec<Member<Self>> {
        vec![]
    }

    fn methods() -> Vec<Method<Self>> {
        vec![Method::no_args("get_viewer", Root::get_viewer)]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewTodo {
    pub text: String,
}

impl Record for NewTodo {
    fn members() -> Vec<Member<Self>> {
        vec![Member::new("text", |n: &NewTodo| n.text.clone()).required()]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToggleTarget {
    pub id: Id,
}

impl Record for ToggleTarget {
    fn members() -> Vec<Member<Self>> {
        vec![Member::new("id", |t: &ToggleTarget| t.id.clone()).required()]
    }
}

pub struct Toggled {
    pub todo: Option<Todo>,
    pub viewer: User,
}

impl Record for Toggled {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::new("todo", |t: &Toggled| t.todo.clone()),
            Member::new("viewer", |t: &Toggled| t.viewer.clone()),
        ]
    }
}

pub struct Mutation {
    store: TodoStore,
}

impl Mutation {
    pub fn new(store: TodoStore) -> Self {
        Self { store }
    }

    fn add_todo(&self, input: NewTodo) -> (Edge, User) {
        let todo = self.store.add_todo(input.text, false);
        let offset = self.store.position(&todo.id).unwrap_or_default();
        (
            Edge::new(cursor_for_offset(offset), todo),
            self.store.viewer(),
        )
    }

    fn change_todo_status(&self, (id, complete): (Id, bool)) -> (Option<Todo>, User) {
        let todo = todo_id(&id).and_then(|id| self.store.change_todo_status(&id, complete));
        (todo, self.store.viewer())
    }

    fn mark_all_todos(&self, (complete,): (bool,)) -> (Vec<Todo>, User) {
        let changed = self
            .store
            .mark_all_todos(complete)
            .iter()
            .filter_map(|id| self.store.get_todo(id))
            .collect();
        (changed, self.store.viewer())
    }

    fn remove_completed_todos(&self) -> (Vec<Id>, User) {
        let removed = self
            .store
            .remove_completed_todos()
            .into_iter()
            .map(global_todo_id)
            .collect();
        (removed, self.store.viewer())
    }

    fn remove_todo(&self, (id,): (Id,)) -> (Option<Id>, User) {
        let removed = todo_id(&id)
            .and_then(|id| self.store.remove_todo(&id))
            .map(global_todo_id);
        (removed, self.store.viewer())
    }

    fn rename_todo(&self, (id, text): (Id, String)) -> (Option<Todo>, User) {
        let todo = todo_id(&id).and_then(|id| self.store.rename_todo(&id, &text));
        (todo, self.store.viewer())
    }

    fn toggle_todo(&self, target: ToggleTarget) -> Toggled {
        let todo = todo_id(&target.id)
            .and_then(|id| self.store.get_todo(&id))
            .and_then(|todo| self.store.change_todo_status(&todo.id, !todo.complete));
        Toggled {
            todo,
            viewer: self.store.viewer(),
        }
    }
}

impl Record for Mutation {
    fn members() -> Vec<Member<Self>> {
        vec![]
    }

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::new("add_todo", Mutation::add_todo),
            Method::new("change_todo_status", Mutation::change_todo_status),
            Method::new("mark_all_todos", Mutation::mark_all_todos),
            Method::no_args("remove_completed_todos", Mutation::remove_completed_todos),
            Method::new("remove_todo", Mutation::remove_todo),
            Method::new("rename_todo", Mutation::rename_todo),
            Method::new("toggle_todo", Mutation::toggle_todo),
        ]
    }
}
