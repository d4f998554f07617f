//! Prometheus exporter for the server's metrics.
//!
//! Installs the global `metrics` recorder and serves `/metrics` on its own
//! listener, separate from the API.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Install the Prometheus recorder and start its HTTP listener.
///
/// Must be called from inside a Tokio runtime, and only once per process.
///
/// # Errors
///
/// Returns [`MetricsError`] if the exporter cannot be built or installed.
pub fn install(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
        )
        .map_err(|e| MetricsError::Build(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    register_metrics();
    tracing::info!(%addr, "Metrics available at http://{addr}/metrics");
    Ok(())
}

fn register_metrics() {
    // Todo store
    describe_histogram!(
        "todos.list.duration_seconds",
        "Time taken to run one list query"
    );
    describe_counter!("todos.created.total", "Todos created, by mood");
    describe_counter!(
        "todos.completed.total",
        "Completion requests that found their todo"
    );

    // Reducer runtime
    describe_counter!("store.commands.total", "Actions sent to reducer stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run a reducer"
    );
    describe_counter!("store.effects.executed", "Effects executed, by type");
}
