//! Application state for Axum handlers.

use mood_todos_core::todo_store::TodoStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Holds the todo store chosen by the process entry point; handlers never
/// know whether it is Postgres or in-memory.
///
/// # Examples
///
/// ```
/// use mood_todos_testing::InMemoryTodoStore;
/// use mood_todos_web::AppState;
/// use std::sync::Arc;
///
/// let state = AppState::new(Arc::new(InMemoryTodoStore::new()));
/// let _ = state.store();
/// ```
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn TodoStore>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// The injected todo store.
    #[must_use]
    pub fn store(&self) -> &dyn TodoStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
