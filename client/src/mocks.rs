//! Scripted [`TodoApi`] for testing.
//!
//! Each call pops the next scripted response for its operation. A response
//! can be held back behind a [`Gate`] so tests decide exactly when, and in
//! which order, overlapping requests resolve.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use crate::api::{ApiFuture, TodoApi};
use crate::error::ClientError;
use mood_todos_core::todo::{ListQuery, Mood, Todo, TodoId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

struct Scripted<T> {
    result: Result<T, ClientError>,
    gate: Option<oneshot::Receiver<()>>,
}

impl<T> Scripted<T> {
    async fn resolve(self) -> Result<T, ClientError> {
        if let Some(gate) = self.gate {
            // A dropped gate releases the response too
            let _ = gate.await;
        }
        self.result
    }
}

/// Releases one held-back response.
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Let the response through.
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// A call seen by [`MockTodoApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `list_todos`
    List(ListQuery),
    /// `create_todo`
    Create(Mood, String),
    /// `accomplish_todo`
    Accomplish(TodoId),
}

#[derive(Default)]
struct MockInner {
    calls: Vec<ApiCall>,
    lists: VecDeque<Scripted<Vec<Todo>>>,
    creates: VecDeque<Scripted<Todo>>,
    completions: VecDeque<Scripted<Todo>>,
}

fn unscripted<T>(operation: &str) -> Scripted<T> {
    Scripted {
        result: Err(ClientError::Transport(format!("no scripted {operation} response"))),
        gate: None,
    }
}

/// Mock collection API.
///
/// Calls without a scripted response fail with [`ClientError::Transport`].
/// Clones share the same script.
#[derive(Clone, Default)]
pub struct MockTodoApi {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTodoApi {
    /// Create a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next list response.
    pub fn push_list(&self, result: Result<Vec<Todo>, ClientError>) {
        self.inner.lock().unwrap().lists.push_back(Scripted { result, gate: None });
    }

    /// Script the next list response, held until the returned gate opens.
    #[must_use]
    pub fn push_list_gated(&self, result: Result<Vec<Todo>, ClientError>) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().lists.push_back(Scripted {
            result,
            gate: Some(rx),
        });
        Gate(tx)
    }

    /// Script the next create response.
    pub fn push_create(&self, result: Result<Todo, ClientError>) {
        self.inner
            .lock()
            .unwrap()
            .creates
            .push_back(Scripted { result, gate: None });
    }

    /// Script the next completion response.
    pub fn push_accomplish(&self, result: Result<Todo, ClientError>) {
        self.inner
            .lock()
            .unwrap()
            .completions
            .push_back(Scripted { result, gate: None });
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Queries of the list calls made so far, in order.
    #[must_use]
    pub fn list_queries(&self) -> Vec<ListQuery> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::List(query) => Some(query),
                _ => None,
            })
            .collect()
    }
}

impl std::fmt::Debug for MockTodoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTodoApi")
            .field("calls", &self.calls().len())
            .finish_non_exhaustive()
    }
}

impl TodoApi for MockTodoApi {
    fn list_todos(&self, query: ListQuery) -> ApiFuture<'_, Vec<Todo>> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(ApiCall::List(query));
            inner.lists.pop_front().unwrap_or_else(|| unscripted("list"))
        };
        Box::pin(scripted.resolve())
    }

    fn create_todo(&self, mood: Mood, text: String) -> ApiFuture<'_, Todo> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(ApiCall::Create(mood, text));
            inner.creates.pop_front().unwrap_or_else(|| unscripted("create"))
        };
        Box::pin(scripted.resolve())
    }

    fn accomplish_todo(&self, id: TodoId) -> ApiFuture<'_, Todo> {
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(ApiCall::Accomplish(id));
            inner
                .completions
                .pop_front()
                .unwrap_or_else(|| unscripted("accomplish"))
        };
        Box::pin(scripted.resolve())
    }
}
