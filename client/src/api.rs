//! Collection API client.

use crate::{config::ClientConfig, error::ClientError};
use mood_todos_core::todo::{ListQuery, Mood, Todo, TodoId};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`TodoApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/// The three collection operations, as seen from a client.
///
/// Object safe so the sync controller can hold an `Arc<dyn TodoApi>`.
pub trait TodoApi: Send + Sync {
    /// `GET /todos`: one page, newest first.
    fn list_todos(&self, query: ListQuery) -> ApiFuture<'_, Vec<Todo>>;

    /// `POST /todos`: create an open todo.
    fn create_todo(&self, mood: Mood, text: String) -> ApiFuture<'_, Todo>;

    /// `POST /todos/{id}`: mark a todo as completed.
    fn accomplish_todo(&self, id: TodoId) -> ApiFuture<'_, Todo>;
}

#[derive(Serialize)]
struct CreateTodoBody<'a> {
    mood: Mood,
    text: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Query pairs for a list call; parameters at their default are left out.
fn list_params(query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if query.unaccomplished_only {
        params.push(("unaccomplishedOnly", "true".to_string()));
    }
    if query.has_search() {
        params.push(("searchText", query.search_text.clone()));
    }
    if let Some(cursor) = query.cursor {
        params.push(("start", cursor.to_string()));
    }
    params
}

/// reqwest-backed [`TodoApi`]
///
/// Every request is bounded by the configured timeout; an elapsed timeout
/// surfaces as [`ClientError::Transport`].
#[derive(Clone, Debug)]
pub struct HttpTodoApi {
    client: Client,
    base_url: String,
}

impl HttpTodoApi {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client with configuration from the environment
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`] and [`HttpTodoApi::new`].
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&ClientConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[tracing::instrument(skip(self, query), fields(cursor = ?query.cursor))]
    async fn fetch_page(&self, query: ListQuery) -> Result<Vec<Todo>, ClientError> {
        let response = self
            .client
            .get(self.url("/todos"))
            .query(&list_params(&query))
            .send()
            .await
            .map_err(transport)?;

        decode(response).await
    }

    #[tracing::instrument(skip(self, text))]
    async fn post_todo(&self, mood: Mood, text: String) -> Result<Todo, ClientError> {
        let response = self
            .client
            .post(self.url("/todos"))
            .json(&CreateTodoBody { mood, text: &text })
            .send()
            .await
            .map_err(transport)?;

        decode(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn post_completion(&self, id: TodoId) -> Result<Todo, ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/todos/{id}")))
            .send()
            .await
            .map_err(transport)?;

        decode(response).await
    }
}

impl TodoApi for HttpTodoApi {
    fn list_todos(&self, query: ListQuery) -> ApiFuture<'_, Vec<Todo>> {
        Box::pin(self.fetch_page(query))
    }

    fn create_todo(&self, mood: Mood, text: String) -> ApiFuture<'_, Todo> {
        Box::pin(self.post_todo(mood, text))
    }

    fn accomplish_todo(&self, id: TodoId) -> ApiFuture<'_, Todo> {
        Box::pin(self.post_completion(id))
    }
}

#[allow(clippy::needless_pass_by_value)] // used as a map_err callback
fn transport(err: reqwest::Error) -> ClientError {
    tracing::warn!(error = %err, timeout = err.is_timeout(), "Request failed");
    ClientError::Transport(err.to_string())
}

/// Map a response to the decoded body or the matching error.
async fn decode<T>(response: Response) -> Result<T, ClientError>
where
    T: for<'de> Deserialize<'de>,
{
    match response.status() {
        StatusCode::OK => response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string())),
        status => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or(body, |error| error.message);

            Err(match status {
                StatusCode::BAD_REQUEST => ClientError::Validation(message),
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                _ => ClientError::UnexpectedStatus {
                    status: status.as_u16(),
                    message,
                },
            })
        }
    }
}
