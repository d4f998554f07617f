//! `PostgreSQL` todo store for Mood Todos.
//!
//! This crate provides the production implementation of the `TodoStore` trait
//! from `mood-todos-core`. It uses sqlx with runtime-bound queries and supports:
//!
//! - Filtered, cursor-paginated listing composed in [`query`]
//! - Idempotent completion in a single `UPDATE ... RETURNING`
//! - Embedded migrations (`mood` enum type, `pg_trgm` index on `text`)
//! - Dummy data seeding for local development
//!
//! # Example
//!
//! ```ignore
//! use mood_todos_postgres::PostgresTodoStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresTodoStore::connect("postgres://localhost/mood_todos").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod query;
mod store;

pub use store::PostgresTodoStore;
