//! # Mood Todos Client
//!
//! Client side of the collection API:
//!
//! - [`api::HttpTodoApi`]: reqwest client for the three collection operations
//! - [`sync`]: reducer that accumulates pages for the active filter and keeps
//!   them consistent across filter changes, infinite scroll and mutations
//! - `mocks::MockTodoApi`: scripted API for driving the controller in tests,
//!   behind the `test-utils` feature
//!
//! ## Example
//!
//! ```ignore
//! use mood_todos_client::{HttpTodoApi, SyncAction, sync_store};
//! use std::sync::Arc;
//!
//! let store = sync_store(Arc::new(HttpTodoApi::from_env()?));
//! store.send(SyncAction::Mount).await.wait().await;
//! let todos = store.state(|s| s.todos.clone()).await;
//! ```

pub mod api;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
pub mod sync;

pub use api::{HttpTodoApi, TodoApi};
pub use config::ClientConfig;
pub use error::ClientError;
pub use sync::{
    Fetch, Filter, Phase, SyncAction, SyncEnvironment, SyncReducer, SyncState, SyncStore,
    sync_store,
};
