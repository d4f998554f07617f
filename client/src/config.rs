//! Client configuration.

use crate::error::ClientError;
use std::time::Duration;

/// Where the collection API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including the mount path, without a trailing slash
    pub base_url: String,
    /// Upper bound on one request, connect to last byte
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/todo_api".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a config for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// - `TODO_API_URL` (default `http://localhost:3000/todo_api`)
    /// - `TODO_API_TIMEOUT_SECS` (default 10)
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if the timeout is not a whole
    /// number of seconds.
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let base_url = std::env::var("TODO_API_URL").unwrap_or(defaults.base_url);

        let request_timeout = match std::env::var("TODO_API_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ClientError::InvalidConfig(format!("TODO_API_TIMEOUT_SECS: {e}")))?,
            Err(_) => defaults.request_timeout,
        };

        Ok(Self::new(base_url).with_timeout(request_timeout))
    }
}
