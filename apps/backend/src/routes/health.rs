use actix_web::{web, HttpResponse};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use serde_json::json;
use time::OffsetDateTime;
use tracing::warn;

use crate::db::require_db;
use crate::error::AppError;
use crate::infra::schema::schema_version;
use crate::state::app_state::AppState;
use crate::web::trace_ctx;

/// Deployment target reported by the greeting.
pub const DEPLOYED_ON: &str = "Google Cloud Run + Neon";

pub async fn root() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(json!({ "Hello": "World", "deployed": DEPLOYED_ON })))
}

/// Liveness: answers without touching the store.
async fn health() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(json!({ "status": "healthy" })))
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    app_version: &'static str,
    db: &'static str,
    schema: String,
    time: String,
}

/// Readiness: the store answers a trivial query and reports its schema.
async fn ready(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let db = require_db(&app_state)?;

    db.query_one(sea_orm::Statement::from_string(
        db.get_database_backend(),
        "SELECT 1 as health_check".to_string(),
    ))
    .await
    .map_err(|e| {
        warn!(trace_id = %trace_ctx::trace_id(), error = %e, "readiness probe failed");
        AppError::db_unavailable("Database did not answer the readiness probe")
    })?;

    let schema = match schema_version(db).await {
        Ok(Some(version)) => version,
        Ok(None) => "no_migrations".to_string(),
        Err(_) => "unknown".to_string(),
    };

    let time = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    Ok(HttpResponse::Ok().json(ReadyResponse {
        status: "ready",
        app_version: env!("CARGO_PKG_VERSION"),
        db: "ok",
        schema,
        time,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(health))
        .route("/ready", web::get().to(ready));
}
