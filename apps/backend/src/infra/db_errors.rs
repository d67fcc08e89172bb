//! SeaORM -> DomainError translation helpers.
//!
//! Adapters return `sea_orm::DbErr`; everything above them sees
//! `DomainError`, produced here with sanitized, PII-safe detail.

use migration::USERS_USERNAME_UNIQUE;
use sea_orm::{DbErr, SqlErr};
use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::logging::pii::Redacted;
use crate::web::trace_ctx;

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

fn is_unique_violation_text(msg: &str) -> bool {
    mentions_sqlstate(msg, "23505")
        || msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
}

/// Pick the domain conflict for a unique violation.
///
/// Postgres names the index (`idx_users_username_unique`); SQLite names the
/// column (`UNIQUE constraint failed: users.username`).
fn unique_conflict(detail: &str) -> DomainError {
    if detail.contains(USERS_USERNAME_UNIQUE) || detail.contains("users.username") {
        return DomainError::conflict(ConflictKind::UniqueUsername, "Username already taken");
    }
    DomainError::conflict(
        ConflictKind::Other("Unique".into()),
        "Unique constraint violation",
    )
}

/// Translate a `DbErr` into a `DomainError`.
pub fn map_db_err(e: DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        DbErr::RecordNotFound(_) => {
            return DomainError::not_found(
                NotFoundKind::Other("Record".into()),
                "Record not found",
            );
        }
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&detail), "Unique constraint violation");
        return unique_conflict(&detail);
    }

    if is_unique_violation_text(&error_msg) {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unique constraint violation");
        return unique_conflict(&error_msg);
    }

    if error_msg.contains("timeout") || error_msg.contains("timed out") {
        warn!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Database timeout");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %Redacted(&error_msg), "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}

impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        map_db_err(e)
    }
}
