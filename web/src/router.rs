//! Router assembly.

use crate::handlers::{health, todos};
use crate::middleware::correlation_id_layer;
use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

/// How the router is mounted and exposed.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Prefix for the collection API, e.g. `/todo_api`; empty or `/` mounts at the root
    pub base_path: String,
    /// Answer CORS preflights for any origin
    pub allow_any_origin: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_path: "/todo_api".to_string(),
            allow_any_origin: true,
        }
    }
}

/// Build the application router.
///
/// ```text
/// GET  {base}/todos        list_todos
/// POST {base}/todos        create_todo
/// POST {base}/todos/{id}   complete_todo
/// GET  /health             liveness
/// GET  /ready              readiness (store ping)
/// ```
pub fn build_router(state: AppState, config: &RouterConfig) -> Router {
    let api = Router::new()
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/", post(todos::missing_todo_id))
        .route("/todos/:id", post(todos::complete_todo));

    let base_path = config.base_path.trim_matches('/');
    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{base_path}"), api)
    };

    let cors = if config.allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    app.route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .layer(cors)
        .layer(correlation_id_layer())
        .with_state(state)
}
