//! Task-local trace context for web requests.
//!
//! `RequestTrace` scopes every request future with its trace id so that
//! error rendering and log statements deep inside handlers can pick it up
//! without threading it through function arguments.

use tokio::task_local;

task_local! {
    static TRACE_ID: String;
}

const UNKNOWN: &str = "unknown";

/// Trace id of the current request, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    current().unwrap_or_else(|| UNKNOWN.to_string())
}

/// Trace id of the current request, if any.
pub fn current() -> Option<String> {
    TRACE_ID.try_with(|id| id.clone()).ok()
}

/// Run a future within a trace context.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
