//! Sync controller running in a `Store`, against scripted and real servers.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use mood_todos_client::mocks::MockTodoApi;
use mood_todos_client::{
    ClientConfig, ClientError, HttpTodoApi, Phase, SyncAction, SyncStore, sync_store,
};
use mood_todos_core::todo::{Mood, Todo, TodoId};
use mood_todos_testing::{InMemoryTodoStore, seed_sequential};
use mood_todos_web::{AppState, RouterConfig, build_router};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn page(ids: std::ops::RangeInclusive<i64>) -> Vec<Todo> {
    ids.rev()
        .map(|id| Todo::new(TodoId::new(id), Mood::Clouds, format!("todo {id}"), 0))
        .collect()
}

fn ids(todos: &[Todo]) -> Vec<i64> {
    todos.iter().map(|todo| todo.id.get()).collect()
}

fn is_page(action: &SyncAction) -> bool {
    matches!(action, SyncAction::PageLoaded { .. })
}

/// Send an action and wait until the page it leads to has been applied.
async fn send_for_page(store: &SyncStore, action: SyncAction) {
    store.send_and_wait_for(action, is_page, WAIT).await.unwrap();
}

async fn wait_for_list_calls(api: &MockTodoApi, count: usize) {
    tokio::time::timeout(WAIT, async {
        while api.list_queries().len() < count {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn search_during_load_more_wins() {
    let api = MockTodoApi::new();
    let store = sync_store(Arc::new(api.clone()));

    api.push_list(Ok(page(6..=15)));
    send_for_page(&store, SyncAction::Mount).await;
    assert_eq!(store.state(|s| s.todos.len()).await, 10);

    // The load-more response is held until after the search has landed
    let gate = api.push_list_gated(Ok(page(1..=5)));
    let mut load_more = store.send(SyncAction::LoadMore).await;
    wait_for_list_calls(&api, 2).await;

    api.push_list(Ok(page(3..=3)));
    send_for_page(&store, SyncAction::SetSearchText("todo 3".to_string())).await;

    gate.open();
    load_more.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(ids(&state.todos), vec![3]);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.generation, 2);
    assert!(!state.has_more);
}

#[tokio::test]
async fn failed_load_more_keeps_loaded_todos() {
    let api = MockTodoApi::new();
    let store = sync_store(Arc::new(api.clone()));

    api.push_list(Ok(page(6..=15)));
    send_for_page(&store, SyncAction::Mount).await;

    api.push_list(Err(ClientError::Transport("connection reset".to_string())));
    send_for_page(&store, SyncAction::LoadMore).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.phase(), Phase::Error);
    assert_eq!(ids(&state.todos), (6..=15).rev().collect::<Vec<_>>());
    assert!(state.has_more);

    // Retrying is an explicit user action
    api.push_list(Ok(page(1..=5)));
    send_for_page(&store, SyncAction::LoadMore).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.todos.len(), 15);
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn create_during_load_more_drops_the_older_page() {
    let api = MockTodoApi::new();
    let store = sync_store(Arc::new(api.clone()));

    api.push_list(Ok(page(6..=15)));
    send_for_page(&store, SyncAction::Mount).await;

    let gate = api.push_list_gated(Ok(page(1..=5)));
    let mut load_more = store.send(SyncAction::LoadMore).await;
    wait_for_list_calls(&api, 2).await;

    api.push_create(Ok(Todo::new(
        TodoId::new(16),
        Mood::Thunder,
        "close the windows".to_string(),
        0,
    )));
    api.push_list(Ok(page(7..=16)));
    send_for_page(
        &store,
        SyncAction::CreateTodo {
            mood: Mood::Thunder,
            text: "close the windows".to_string(),
        },
    )
    .await;

    gate.open();
    load_more.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(ids(&state.todos), (7..=16).rev().collect::<Vec<_>>());
    assert_eq!(state.generation, 2);
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.has_more);
}

#[tokio::test]
async fn failed_completion_during_load_more_sends_no_second_request() {
    let api = MockTodoApi::new();
    let store = sync_store(Arc::new(api.clone()));

    api.push_list(Ok(page(6..=15)));
    send_for_page(&store, SyncAction::Mount).await;

    let gate = api.push_list_gated(Ok(page(1..=5)));
    let mut load_more = store.send(SyncAction::LoadMore).await;
    wait_for_list_calls(&api, 2).await;

    api.push_accomplish(Err(ClientError::NotFound(
        "Todo with id 42 not found".to_string(),
    )));
    store
        .send(SyncAction::CompleteTodo(TodoId::new(42)))
        .await
        .wait_with_timeout(WAIT)
        .await
        .unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.phase(), Phase::LoadingMore);
    assert!(matches!(state.last_error, Some(ClientError::NotFound(_))));

    store.send(SyncAction::LoadMore).await.wait().await;
    assert_eq!(api.list_queries().len(), 2);

    gate.open();
    load_more.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(ids(&state.todos), (1..=15).rev().collect::<Vec<_>>());
    assert_eq!(state.phase(), Phase::Error);
    assert!(!state.has_more);
}

async fn serve(store: InMemoryTodoStore) -> String {
    let router = build_router(AppState::new(Arc::new(store)), &RouterConfig::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/todo_api")
}

#[tokio::test]
async fn scrolls_and_mutates_against_real_server() {
    let backend = InMemoryTodoStore::new();
    seed_sequential(&backend, 15).await.unwrap();
    let base_url = serve(backend.clone()).await;

    let api = HttpTodoApi::new(&ClientConfig::new(base_url)).unwrap();
    let store = sync_store(Arc::new(api));

    send_for_page(&store, SyncAction::Mount).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(ids(&state.todos), (6..=15).rev().collect::<Vec<_>>());
    assert!(state.has_more);

    send_for_page(&store, SyncAction::LoadMore).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(ids(&state.todos), (1..=15).rev().collect::<Vec<_>>());
    assert!(!state.has_more);

    // Exhausted: further scrolling sends nothing
    store.send(SyncAction::LoadMore).await.wait().await;
    assert_eq!(store.state(|s| s.todos.len()).await, 15);

    send_for_page(
        &store,
        SyncAction::CreateTodo {
            mood: Mood::Thunder,
            text: "close the windows".to_string(),
        },
    )
    .await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.todos.len(), 10);
    assert_eq!(state.todos[0].id, TodoId::new(16));
    assert_eq!(state.todos[0].mood, Mood::Thunder);

    send_for_page(&store, SyncAction::SetUnaccomplishedOnly(true)).await;
    send_for_page(&store, SyncAction::CompleteTodo(TodoId::new(16))).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.todos[0].id, TodoId::new(15));
    assert!(state.todos.iter().all(|todo| !todo.is_completed()));
    assert!(backend.get(TodoId::new(16)).unwrap().is_completed());
}

#[tokio::test]
async fn search_against_real_server_is_case_insensitive() {
    let backend = InMemoryTodoStore::new();
    seed_sequential(&backend, 15).await.unwrap();
    let store = sync_store(Arc::new(
        HttpTodoApi::new(&ClientConfig::new(serve(backend).await)).unwrap(),
    ));

    send_for_page(&store, SyncAction::SetSearchText("WORD12".to_string())).await;

    let state = store.state(Clone::clone).await;
    // "word{n} word{n+1} word{n+2}" mentions word12 for n = 10, 11, 12
    assert_eq!(ids(&state.todos), vec![12, 11, 10]);
    assert!(!state.has_more);
}

#[tokio::test]
async fn completing_missing_todo_reports_not_found() {
    let store = sync_store(Arc::new(
        HttpTodoApi::new(&ClientConfig::new(serve(InMemoryTodoStore::new()).await)).unwrap(),
    ));

    let mut handle = store.send(SyncAction::CompleteTodo(TodoId::new(42))).await;
    handle.wait_with_timeout(WAIT).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.phase(), Phase::Error);
    assert!(matches!(state.last_error, Some(ClientError::NotFound(_))));
}
