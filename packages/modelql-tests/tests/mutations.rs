use modelql::GlobalId;
use modelql_tests::fixtures::{query_data, setup_todo_schema};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_add_todo() {
    let (store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            addTodo(input: { text: "Buy milk", clientMutationId: "abc" }) {
                clientMutationId
                todoEdge { cursor node { id text complete } }
                viewer { totalCount }
            }
        }"#,
    )
    .await;
    let payload = &data["addTodo"];
    assert_eq!(payload["clientMutationId"], json!("abc"));
    assert_eq!(payload["todoEdge"]["cursor"], json!("YXJyYXljb25uZWN0aW9uOjM="));
    assert_eq!(payload["todoEdge"]["node"]["text"], json!("Buy milk"));
    assert_eq!(payload["todoEdge"]["node"]["complete"], json!(false));
    assert_eq!(payload["viewer"]["totalCount"], json!(4));

    let id = payload["todoEdge"]["node"]["id"].as_str().unwrap();
    let global = GlobalId::decode(id).unwrap();
    assert_eq!(global.type_name, "Todo");
    assert_eq!(store.get_todo(&global.local_id).unwrap().text, "Buy milk");
}

#[tokio::test]
async fn test_client_mutation_id_is_optional() {
    let (_store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation { addTodo(input: { text: "Walk" }) { clientMutationId } }"#,
    )
    .await;
    assert_eq!(data, json!({ "addTodo": { "clientMutationId": null } }));
}

#[tokio::test]
async fn test_missing_required_input_field() {
    let (store, schema) = setup_todo_schema();
    let response = schema
        .execute(r#"mutation { addTodo(input: {}) { clientMutationId } }"#)
        .await;
    assert!(!response.errors.is_empty());
    assert_eq!(store.get_todos("any").len(), 3);
}

#[tokio::test]
async fn test_change_todo_status() {
    let (store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            changeTodoStatus(input: { id: "VG9kbzox", complete: true }) {
                todo { id complete }
                viewer { completedCount }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data["changeTodoStatus"],
        json!({
            "todo": { "id": "VG9kbzox", "complete": true },
            "viewer": { "completedCount": 2 },
        })
    );
    assert!(store.get_todo("1").unwrap().complete);
}

#[tokio::test]
async fn test_change_status_of_unknown_todo() {
    let (_store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            changeTodoStatus(input: { id: "VXNlcjptZQ==", complete: true }) { todo { id } }
        }"#,
    )
    .await;
    assert_eq!(data, json!({ "changeTodoStatus": { "todo": null } }));
}

#[tokio::test]
async fn test_mark_all_todos() {
    let (_store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            markAllTodos(input: { complete: true }) {
                changedTodos { totalCount edges { node { text } } }
                viewer { completedCount }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data["markAllTodos"],
        json!({
            "changedTodos": {
                "totalCount": 2,
                "edges": [
                    { "node": { "text": "Hello Todo" } },
                    { "node": { "text": "Sleep tight" } },
                ],
            },
            "viewer": { "completedCount": 3 },
        })
    );
}

#[tokio::test]
async fn test_remove_completed_todos() {
    let (store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            removeCompletedTodos(input: {}) { deletedTodoIds viewer { totalCount } }
        }"#,
    )
    .await;
    assert_eq!(
        data["removeCompletedTodos"],
        json!({ "deletedTodoIds": ["VG9kbzoy"], "viewer": { "totalCount": 2 } })
    );
    assert_eq!(store.get_todo("2"), None);
}

#[tokio::test]
async fn test_remove_todo() {
    let (_store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            first: removeTodo(input: { id: "VG9kbzox" }) { deletedTodoId viewer { totalCount } }
            again: removeTodo(input: { id: "VG9kbzox" }) { deletedTodoId viewer { totalCount } }
        }"#,
    )
    .await;
    assert_eq!(
        data,
        json!({
            "first": { "deletedTodoId": "VG9kbzox", "viewer": { "totalCount": 2 } },
            "again": { "deletedTodoId": null, "viewer": { "totalCount": 2 } },
        })
    );
}

#[tokio::test]
async fn test_rename_todo() {
    let (_store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            renameTodo(input: { id: "VG9kbzoz", text: "Sleep well" }) { todo { text } }
        }"#,
    )
    .await;
    assert_eq!(data, json!({ "renameTodo": { "todo": { "text": "Sleep well" } } }));

    let data = query_data(&schema, r#"{ node(id: "VG9kbzoz") { ... on Todo { text } } }"#).await;
    assert_eq!(data, json!({ "node": { "text": "Sleep well" } }));
}

#[tokio::test]
async fn test_toggle_todo() {
    let (_store, schema) = setup_todo_schema();
    let data = query_data(
        &schema,
        r#"mutation {
            toggleTodo(input: { id: "VG9kbzoy", clientMutationId: "t1" }) {
                clientMutationId
                todo { complete }
                viewer { completedCount }
            }
        }"#,
    )
    .await;
    assert_eq!(
        data["toggleTodo"],
        json!({
            "clientMutationId": "t1",
            "todo": { "complete": false },
            "viewer": { "completedCount": 0 },
        })
    );
}

#[tokio::test]
async fn test_mark_all_then_filter_complete() {
    let (_store, schema) = setup_todo_schema();
    let complete = r#"{ viewer { todos(status: "complete") { totalCount } } }"#;
    let any = r#"{ viewer { todos(status: "any") { totalCount } } }"#;

    let data = query_data(&schema, complete).await;
    assert_eq!(data["viewer"]["todos"]["totalCount"], json!(1));
    let data = query_data(&schema, any).await;
    assert_eq!(data["viewer"]["todos"]["totalCount"], json!(3));

    query_data(
        &schema,
        "mutation { markAllTodos(input: { complete: true }) { clientMutationId } }",
    )
    .await;
    let data = query_data(&schema, complete).await;
    assert_eq!(data["viewer"]["todos"]["totalCount"], json!(3));
}

#[tokio::test]
async fn test_add_todo_grows_the_list_by_one() {
    let (_store, schema) = setup_todo_schema();
    let any = r#"{ viewer { todos { totalCount edges { node { id } } } } }"#;
    let before = query_data(&schema, any).await;

    query_data(
        &schema,
        r#"mutation { addTodo(input: { text: "Read" }) { clientMutationId } }"#,
    )
    .await;
    let after = query_data(&schema, any).await;

    assert_eq!(before["viewer"]["todos"]["totalCount"], json!(3));
    assert_eq!(after["viewer"]["todos"]["totalCount"], json!(4));
    let last = after["viewer"]["todos"]["edges"][3]["node"]["id"]
        .as_str()
        .unwrap();
    assert_eq!(GlobalId::decode(last).unwrap().type_name, "Todo");
}
