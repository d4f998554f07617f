//! In-memory todo store for fast, deterministic testing.
//!
//! Selects rows with [`ListQuery::matches`], so its list results are the
//! reference the Postgres store is checked against.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use mood_todos_core::environment::Clock;
use mood_todos_core::todo::{ListQuery, Mood, PAGE_SIZE, Todo, TodoId};
use mood_todos_core::todo_store::{StoreFuture, TodoStore, TodoStoreError, validate_text};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Inner {
    /// Ascending by id
    todos: Vec<Todo>,
    last_id: i64,
    fail_with: Option<TodoStoreError>,
}

/// In-memory [`TodoStore`]
///
/// Ids start at 1 and increase by one per create, like a fresh `BIGSERIAL`.
/// Clones share the same data.
///
/// # Example
///
/// ```
/// use mood_todos_core::todo::Mood;
/// use mood_todos_core::todo_store::TodoStore;
/// use mood_todos_testing::InMemoryTodoStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryTodoStore::new();
/// let created = store.create(Mood::Rain, "bring umbrella".to_string()).await?;
/// assert_eq!(created.id.get(), 1);
/// assert!(created.completed_at.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryTodoStore {
    inner: Arc<RwLock<Inner>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTodoStore {
    /// Create an empty store on the default test clock
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(crate::test_clock()))
    }

    /// Create an empty store on a custom clock
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            clock,
        }
    }

    /// Make every following call fail with `error` until [`Self::recover`]
    pub fn fail_with(&self, error: TodoStoreError) {
        self.inner.write().unwrap().fail_with = Some(error);
    }

    /// Undo [`Self::fail_with`]
    pub fn recover(&self) {
        self.inner.write().unwrap().fail_with = None;
    }

    /// Number of stored todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().todos.len()
    }

    /// Whether the store holds no todos
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a single todo
    #[must_use]
    pub fn get(&self, id: TodoId) -> Option<Todo> {
        let inner = self.inner.read().unwrap();
        inner.todos.iter().find(|todo| todo.id == id).cloned()
    }

    fn check_failure(inner: &Inner) -> Result<(), TodoStoreError> {
        inner.fail_with.clone().map_or(Ok(()), Err)
    }
}

impl Default for InMemoryTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTodoStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl TodoStore for InMemoryTodoStore {
    fn list(&self, query: ListQuery) -> StoreFuture<'_, Vec<Todo>> {
        Box::pin(async move {
            let inner = self.inner.read().unwrap();
            Self::check_failure(&inner)?;

            Ok(inner
                .todos
                .iter()
                .rev()
                .filter(|todo| query.matches(todo))
                .take(PAGE_SIZE)
                .cloned()
                .collect())
        })
    }

    fn create(&self, mood: Mood, text: String) -> StoreFuture<'_, Todo> {
        Box::pin(async move {
            validate_text(&text)?;

            let mut inner = self.inner.write().unwrap();
            Self::check_failure(&inner)?;

            inner.last_id += 1;
            let todo = Todo::new(
                TodoId::new(inner.last_id),
                mood,
                text,
                self.clock.now_epoch_seconds(),
            );
            inner.todos.push(todo.clone());

            tracing::debug!(todo_id = %todo.id, "Created todo in memory");
            Ok(todo)
        })
    }

    fn complete(&self, id: TodoId) -> StoreFuture<'_, Todo> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            Self::check_failure(&inner)?;

            let now = self.clock.now_epoch_seconds();
            let todo = inner
                .todos
                .iter_mut()
                .find(|todo| todo.id == id)
                .ok_or(TodoStoreError::NotFound(id))?;
            todo.complete(now);
            Ok(todo.clone())
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let inner = self.inner.read().unwrap();
            Self::check_failure(&inner)
        })
    }
}

/// Seed `count` open `Clear` todos with text `wordN wordN+1 wordN+2`
///
/// On an empty store the ids are `1..=count`.
///
/// # Errors
///
/// Propagates the first failed create.
pub async fn seed_sequential<S>(store: &S, count: i64) -> Result<Vec<Todo>, TodoStoreError>
where
    S: TodoStore + ?Sized,
{
    let mut seeded = Vec::new();
    for n in 1..=count {
        let text = format!("word{n} word{} word{}", n + 1, n + 2);
        seeded.push(store.create(Mood::Clear, text).await?);
    }
    Ok(seeded)
}
