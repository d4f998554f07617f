//! `PostgreSQL` implementation of [`TodoStore`].

use crate::query::{BindValue, TODO_COLUMNS, compose_list};
use mood_todos_core::environment::{Clock, SystemClock};
use mood_todos_core::todo::{ListQuery, Mood, PAGE_SIZE, Todo, TodoId};
use mood_todos_core::todo_store::{StoreFuture, TodoStore, TodoStoreError, validate_text};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

/// Row shape shared by every statement that returns todos.
#[derive(Debug, sqlx::FromRow)]
struct TodoRow {
    id: i64,
    mood: String,
    text: String,
    created_at: i64,
    completed_at: Option<i64>,
}

impl TryFrom<TodoRow> for Todo {
    type Error = TodoStoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        // The column is an enum type, so this only fails if the schema drifted
        let mood = row
            .mood
            .parse::<Mood>()
            .map_err(|e| TodoStoreError::Database(e.to_string()))?;

        Ok(Self {
            id: TodoId::new(row.id),
            mood,
            text: row.text,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

fn database_error(context: &str, err: &sqlx::Error) -> TodoStoreError {
    tracing::error!(error = %err, "{context}");
    TodoStoreError::Database(format!("{context}: {err}"))
}

/// `PostgreSQL`-backed todo store.
///
/// Each operation is a single statement, so the store needs no transactions
/// and concurrent completions of one id converge on the first timestamp.
///
/// # Example
///
/// ```no_run
/// use mood_todos_postgres::PostgresTodoStore;
/// use mood_todos_core::todo::Mood;
/// use mood_todos_core::todo_store::TodoStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresTodoStore::connect("postgres://localhost/mood_todos").await?;
/// store.migrate().await?;
///
/// let todo = store.create(Mood::Rain, "bring umbrella".to_string()).await?;
/// println!("created {}", todo.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresTodoStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresTodoStore {
    /// Create a store on an existing pool using the system clock.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Create a store on an existing pool with a custom clock.
    #[must_use]
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Connect with a small default pool.
    ///
    /// # Errors
    ///
    /// Returns [`TodoStoreError::Database`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, TodoStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| database_error("Failed to connect", &e))?;

        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`TodoStoreError::Database`] if migrations fail.
    pub async fn migrate(&self) -> Result<(), TodoStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TodoStoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fill an empty table with `count` open `Clear` todos.
    ///
    /// Row `i` gets the text `wordi wordi+1 wordi+2`. Does nothing when the
    /// table already holds rows. Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns [`TodoStoreError::Database`] if a statement fails.
    #[tracing::instrument(skip(self))]
    pub async fn seed_dummy(&self, count: i64) -> Result<u64, TodoStoreError> {
        let populated: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM todos)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("Failed to inspect todos", &e))?;

        if populated {
            tracing::info!("Todos table already populated, skipping seed");
            return Ok(0);
        }

        let result = sqlx::query(
            r"
            INSERT INTO todos (mood, text, created_at)
            SELECT 'Clear'::mood,
                   'word' || i || ' word' || (i + 1) || ' word' || (i + 2),
                   $2
            FROM generate_series(1::BIGINT, $1) AS i
            ORDER BY i
            ",
        )
        .bind(count)
        .bind(self.clock.now_epoch_seconds())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to seed todos", &e))?;

        tracing::info!(rows = result.rows_affected(), "Seeded dummy todos");
        Ok(result.rows_affected())
    }

    #[tracing::instrument(skip(self, query), fields(
        unaccomplished_only = query.unaccomplished_only,
        has_search = query.has_search(),
        cursor = ?query.cursor,
    ))]
    async fn list_page(&self, query: ListQuery) -> Result<Vec<Todo>, TodoStoreError> {
        #[allow(clippy::cast_possible_wrap)] // PAGE_SIZE is a small constant
        let statement = compose_list(&query, PAGE_SIZE as i64);

        let start = std::time::Instant::now();

        let mut sql_query = sqlx::query_as::<_, TodoRow>(&statement.sql);
        for value in statement.binds {
            sql_query = match value {
                BindValue::Int(v) => sql_query.bind(v),
                BindValue::Text(v) => sql_query.bind(v),
            };
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("Failed to list todos", &e))?;

        metrics::histogram!("todos.list.duration_seconds").record(start.elapsed().as_secs_f64());
        tracing::debug!(count = rows.len(), "Listed todos");

        rows.into_iter().map(Todo::try_from).collect()
    }

    #[tracing::instrument(skip(self, text), fields(mood = %mood))]
    async fn insert(&self, mood: Mood, text: String) -> Result<Todo, TodoStoreError> {
        validate_text(&text)?;

        let sql = format!(
            "INSERT INTO todos (mood, text, created_at) VALUES ($1::mood, $2, $3) \
             RETURNING {TODO_COLUMNS}"
        );
        let row: TodoRow = sqlx::query_as(&sql)
            .bind(mood.as_str())
            .bind(&text)
            .bind(self.clock.now_epoch_seconds())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("Failed to create todo", &e))?;

        let todo = Todo::try_from(row)?;

        tracing::info!(todo_id = %todo.id, "Todo created");
        metrics::counter!("todos.created.total", "mood" => mood.as_str()).increment(1);

        Ok(todo)
    }

    #[tracing::instrument(skip(self), fields(todo_id = %id))]
    async fn mark_completed(&self, id: TodoId) -> Result<Todo, TodoStoreError> {
        // COALESCE keeps the first completion time on repeated calls
        let sql = format!(
            "UPDATE todos SET completed_at = COALESCE(completed_at, $1) WHERE id = $2 \
             RETURNING {TODO_COLUMNS}"
        );
        let row: TodoRow = sqlx::query_as(&sql)
            .bind(self.clock.now_epoch_seconds())
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to complete todo", &e))?
            .ok_or(TodoStoreError::NotFound(id))?;

        let todo = Todo::try_from(row)?;

        tracing::info!(completed_at = ?todo.completed_at, "Todo completed");
        metrics::counter!("todos.completed.total").increment(1);

        Ok(todo)
    }
}

impl std::fmt::Debug for PostgresTodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresTodoStore")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl TodoStore for PostgresTodoStore {
    fn list(&self, query: ListQuery) -> StoreFuture<'_, Vec<Todo>> {
        Box::pin(self.list_page(query))
    }

    fn create(&self, mood: Mood, text: String) -> StoreFuture<'_, Todo> {
        Box::pin(self.insert(mood, text))
    }

    fn complete(&self, id: TodoId) -> StoreFuture<'_, Todo> {
        Box::pin(self.mark_completed(id))
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("Database unreachable", &e))?;
            Ok(())
        })
    }
}
