#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod state;
pub mod web;

// Re-exports for public API
pub use config::app::AppConfig;
pub use config::db::{ConnectionDescriptor, DbKind, PoolSettings, TlsMode};
pub use db::session::{with_session, Session};
pub use error::AppError;
pub use errors::domain::DomainError;
pub use infra::db::{close_pool, open_pool};
pub use infra::schema::ensure_schema;
pub use infra::state::build_state;
pub use middleware::request_trace::RequestTrace;
pub use middleware::structured_logger::StructuredLogger;
pub use middleware::trace_span::TraceSpan;
pub use state::app_state::AppState;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    backend_test_support::logging::init();
}
