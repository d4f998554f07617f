//! Collection API handlers.
//!
//! Handlers only check that the request is well formed, hand it to the store
//! and map the outcome; every rejection becomes a 400 with a JSON body.

use crate::{AppError, AppState, WebResult};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use mood_todos_core::todo::{ListQuery, Mood, Todo, TodoId};
use serde::Deserialize;

/// Query string of `GET /todos`.
///
/// All parameters are optional; `start` is the exclusive id cursor.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Only open todos
    #[serde(default)]
    pub unaccomplished_only: bool,
    /// Case-insensitive substring; empty means no filter
    #[serde(default)]
    pub search_text: String,
    /// Only ids below this one
    pub start: Option<i64>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        Self::new()
            .unaccomplished_only(params.unaccomplished_only)
            .search(params.search_text)
            .before(params.start.map(TodoId::new))
    }
}

/// Body of `POST /todos`.
///
/// Fields are optional here so a missing one is reported by name.
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    /// Mood name, exact spelling
    pub mood: Option<String>,
    /// Todo text
    pub text: Option<String>,
}

/// `GET /todos`: one page of todos, newest first.
///
/// # Errors
///
/// - 400 if a query parameter is malformed
/// - 500 if the store fails
#[tracing::instrument(skip_all)]
pub async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> WebResult<Json<Vec<Todo>>> {
    let Query(params) = params.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let query = ListQuery::from(params);

    tracing::debug!(
        unaccomplished_only = query.unaccomplished_only,
        search_text = %query.search_text,
        cursor = ?query.cursor,
        "Listing todos"
    );

    let page = state.store().list(query).await?;
    Ok(Json(page))
}

/// `POST /todos`: create an open todo.
///
/// # Errors
///
/// - 400 if the body is not JSON, or mood/text is missing or invalid
/// - 500 if the store fails
#[tracing::instrument(skip_all)]
pub async fn create_todo(
    State(state): State<AppState>,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> WebResult<Json<Todo>> {
    let Json(request) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let mood = request
        .mood
        .ok_or_else(|| AppError::validation("mood is required"))?
        .parse::<Mood>()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let text = request
        .text
        .ok_or_else(|| AppError::validation("text is required"))?;

    let todo = state.store().create(mood, text).await?;

    tracing::info!(todo_id = %todo.id, mood = %todo.mood, "Todo created");
    Ok(Json(todo))
}

/// `POST /todos/{id}`: mark a todo as completed.
///
/// # Errors
///
/// - 400 if the id is not an integer
/// - 404 if no todo has this id
/// - 500 if the store fails
#[tracing::instrument(skip_all)]
pub async fn complete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> WebResult<Json<Todo>> {
    let Path(id) = id.map_err(|_| AppError::bad_request("Todo id must be an integer"))?;
    let id = TodoId::new(id);

    let todo = state.store().complete(id).await?;

    tracing::info!(todo_id = %id, completed_at = ?todo.completed_at, "Todo completed");
    Ok(Json(todo))
}

/// `POST /todos/`: completion request without an id.
///
/// # Errors
///
/// Always a 400.
#[allow(clippy::unused_async)]
pub async fn missing_todo_id() -> WebResult<Json<Todo>> {
    Err(AppError::bad_request("Todo id is required"))
}
