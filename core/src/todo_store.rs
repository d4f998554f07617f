//! Todo store trait and related types.
//!
//! This module defines the persistence seam for todos. The HTTP layer only
//! ever talks to `Arc<dyn TodoStore>`; the process entry point decides which
//! implementation backs it.
//!
//! # Implementations
//!
//! - `PostgresTodoStore` (in `mood-todos-postgres` crate): Production implementation
//! - `InMemoryTodoStore` (in `mood-todos-testing` crate): Fast, deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use mood_todos_core::todo::{ListQuery, Mood};
//! use mood_todos_core::todo_store::{TodoStore, TodoStoreError};
//!
//! async fn example<S: TodoStore>(store: &S) -> Result<(), TodoStoreError> {
//!     let created = store.create(Mood::Rain, "bring umbrella".to_string()).await?;
//!     let done = store.complete(created.id).await?;
//!     assert!(done.completed_at.is_some());
//!
//!     let first_page = store.list(ListQuery::new()).await?;
//!     assert_eq!(first_page[0].id, created.id);
//!     Ok(())
//! }
//! ```

use crate::todo::{ListQuery, Mood, Todo, TodoId, UnknownMood};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`TodoStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TodoStoreError>> + Send + 'a>>;

/// Errors that can occur during todo store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoStoreError {
    /// Input rejected before anything was persisted.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No todo with this id.
    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<UnknownMood> for TodoStoreError {
    fn from(err: UnknownMood) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Checks the text of a new todo.
///
/// Text must contain at least one non-whitespace character. Returns the text
/// unchanged on success so callers can chain it into persistence.
///
/// # Errors
///
/// Returns [`TodoStoreError::Validation`] for empty or whitespace-only text.
pub fn validate_text(text: &str) -> Result<&str, TodoStoreError> {
    if text.trim().is_empty() {
        return Err(TodoStoreError::Validation(
            "Todo text cannot be empty".to_string(),
        ));
    }
    Ok(text)
}

/// Persistence for todos.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to be shared across request handlers.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so it can be used as `Arc<dyn TodoStore>` in the web layer's state.
pub trait TodoStore: Send + Sync {
    /// List one page of todos.
    ///
    /// Returns at most [`PAGE_SIZE`](crate::todo::PAGE_SIZE) todos matching
    /// every active filter of `query`, ordered by id descending. An empty
    /// vector is a valid result and marks the end of the data.
    ///
    /// # Errors
    ///
    /// - `Database`: query failed
    fn list(&self, query: ListQuery) -> StoreFuture<'_, Vec<Todo>>;

    /// Create an open todo.
    ///
    /// The store assigns the next id and the current timestamp.
    ///
    /// # Errors
    ///
    /// - `Validation`: empty text (nothing is persisted)
    /// - `Database`: insert failed
    fn create(&self, mood: Mood, text: String) -> StoreFuture<'_, Todo>;

    /// Mark a todo as completed.
    ///
    /// Completion is idempotent: completing an already completed todo returns
    /// the stored record with its original `completed_at`.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no todo with this id
    /// - `Database`: update failed
    fn complete(&self, id: TodoId) -> StoreFuture<'_, Todo>;

    /// Check that the backing storage is reachable.
    ///
    /// # Errors
    ///
    /// - `Database`: storage unreachable
    fn ping(&self) -> StoreFuture<'_, ()>;
}
