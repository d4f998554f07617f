//! Axum HTTP surface for Mood Todos.
//!
//! This crate is the imperative shell around the todo store:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, CORS
//! │  - Request parsing and validation       │  ← Correlation ids, logging
//! │  - Status mapping                       │
//! ├─────────────────────────────────────────┤
//! │         Todo Store (Arc<dyn TodoStore>) │
//! │  - Postgres in production               │
//! │  - In-memory in tests                   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mood_todos_testing::InMemoryTodoStore;
//! use mood_todos_web::{AppState, RouterConfig, build_router};
//! use std::sync::Arc;
//!
//! let state = AppState::new(Arc::new(InMemoryTodoStore::new()));
//! let app = build_router(state, &RouterConfig::default());
//! # let _ = app;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::{RouterConfig, build_router};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
