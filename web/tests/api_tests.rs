//! Collection API tests driving the full router over an in-memory store.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use mood_todos_core::todo::{Mood, Todo, TodoId};
use mood_todos_core::todo_store::{TodoStore, TodoStoreError};
use mood_todos_testing::{InMemoryTodoStore, seed_sequential};
use mood_todos_web::{AppState, CORRELATION_ID_HEADER, RouterConfig, build_router};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(store: &InMemoryTodoStore) -> Router {
    build_router(
        AppState::new(Arc::new(store.clone())),
        &RouterConfig::default(),
    )
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn todos_body(response: Response) -> Vec<Todo> {
    serde_json::from_value(json_body(response).await).unwrap()
}

fn ids(todos: &[Todo]) -> Vec<i64> {
    todos.iter().map(|todo| todo.id.get()).collect()
}

#[tokio::test]
async fn list_pages_seeded_todos() {
    let store = InMemoryTodoStore::new();
    seed_sequential(&store, 15).await.unwrap();

    let response = send(app(&store), get("/todo_api/todos")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first = todos_body(response).await;
    assert_eq!(ids(&first), (6..=15).rev().collect::<Vec<_>>());

    let response = send(app(&store), get("/todo_api/todos?start=6")).await;
    let second = todos_body(response).await;
    assert_eq!(ids(&second), vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn list_applies_filters() {
    let store = InMemoryTodoStore::new();
    seed_sequential(&store, 5).await.unwrap();
    store.complete(TodoId::new(4)).await.unwrap();

    let response = send(
        app(&store),
        get("/todo_api/todos?unaccomplishedOnly=true&searchText=WORD4"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    // word4 appears in todos 2, 3 and 4; 4 is completed
    assert_eq!(ids(&todos_body(response).await), vec![3, 2]);
}

#[tokio::test]
async fn list_rejects_malformed_query() {
    let store = InMemoryTodoStore::new();

    for uri in [
        "/todo_api/todos?start=abc",
        "/todo_api/todos?unaccomplishedOnly=maybe",
    ] {
        let response = send(app(&store), get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = json_body(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn create_returns_open_todo_listed_first() {
    let store = InMemoryTodoStore::new();
    seed_sequential(&store, 3).await.unwrap();

    let response = send(
        app(&store),
        post_json("/todo_api/todos", r#"{"mood":"Rain","text":"bring umbrella"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["id"], 4);
    assert_eq!(body["mood"], "Rain");
    assert_eq!(body["text"], "bring umbrella");
    assert!(body["createdAt"].is_i64());
    assert!(body["completedAt"].is_null());

    let page = todos_body(send(app(&store), get("/todo_api/todos")).await).await;
    assert_eq!(page[0].id.get(), 4);
    assert_eq!(page[0].mood, Mood::Rain);
}

#[tokio::test]
async fn create_rejects_invalid_bodies() {
    let store = InMemoryTodoStore::new();

    let cases = [
        post_json("/todo_api/todos", r#"{"text":"no mood"}"#),
        post_json("/todo_api/todos", r#"{"mood":"Rain"}"#),
        post_json("/todo_api/todos", r#"{"mood":"Hail","text":"unknown mood"}"#),
        post_json("/todo_api/todos", r#"{"mood":"Rain","text":"   "}"#),
        post_json("/todo_api/todos", "not json"),
        post_empty("/todo_api/todos"),
    ];

    for request in cases {
        let response = send(app(&store), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn complete_sets_completed_at_once() {
    let store = InMemoryTodoStore::new();
    let created = store
        .create(Mood::Clear, "water plants".to_string())
        .await
        .unwrap();
    let uri = format!("/todo_api/todos/{}", created.id);

    let first = json_body(send(app(&store), post_empty(&uri)).await).await;
    assert_eq!(first["id"], created.id.get());
    assert!(first["completedAt"].is_i64());

    let second = json_body(send(app(&store), post_empty(&uri)).await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn complete_maps_bad_and_unknown_ids() {
    let store = InMemoryTodoStore::new();

    let response = send(app(&store), post_empty("/todo_api/todos/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(app(&store), post_empty("/todo_api/todos/")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(app(&store), post_empty("/todo_api/todos/77")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn database_failure_is_generic_500() {
    let store = InMemoryTodoStore::new();
    store.fail_with(TodoStoreError::Database("relation todos does not exist".to_string()));

    let response = send(app(&store), get("/todo_api/todos")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["message"], "An internal error occurred");
}

#[tokio::test]
async fn root_mount_and_health_endpoints() {
    let store = InMemoryTodoStore::new();
    let config = RouterConfig {
        base_path: "/".to_string(),
        allow_any_origin: false,
    };
    let app = build_router(AppState::new(Arc::new(store.clone())), &config);

    let response = send(app.clone(), get("/todos")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));

    let response = send(app.clone(), get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(app, get("/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
