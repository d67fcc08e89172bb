//! Request-scoped unit of work.
//!
//! A [`Session`] owns one transaction, and therefore one pooled connection,
//! for the lifetime of a request. Work is discarded unless explicitly
//! committed. Closing, or simply dropping, the session rolls back whatever
//! is still open and hands the connection back to the pool, so a cancelled
//! request cannot leak a connection.

use futures::future::BoxFuture;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tracing::warn;

use crate::db::require_db;
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::state::app_state::AppState;
use crate::web::trace_ctx;

pub struct Session {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
}

impl Session {
    /// Begin a session, drawing a connection from the pool.
    pub async fn open(db: &DatabaseConnection) -> Result<Self, DomainError> {
        let txn = db.begin().await?;
        Ok(Self {
            db: db.clone(),
            txn: Some(txn),
        })
    }

    /// The active transaction; a new one is begun if the previous one was
    /// committed.
    pub async fn conn(&mut self) -> Result<&DatabaseTransaction, DomainError> {
        let txn = match self.txn.take() {
            Some(txn) => txn,
            None => self.db.begin().await?,
        };
        Ok(self.txn.insert(txn))
    }

    /// Make everything done so far durable.
    pub async fn commit(&mut self) -> Result<(), DomainError> {
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
        }
        Ok(())
    }

    /// Roll back uncommitted work and release the connection.
    pub async fn close(mut self) -> Result<(), DbErr> {
        match self.txn.take() {
            Some(txn) => txn.rollback().await,
            None => Ok(()),
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }
}

/// Run `f` inside a fresh session and close it on every path.
///
/// The closure decides what to commit; anything it leaves uncommitted is
/// rolled back. A failure while closing is logged and does not mask the
/// closure's own result.
pub async fn with_session<R, F>(state: &AppState, f: F) -> Result<R, AppError>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<R, AppError>>,
{
    let db = require_db(state)?;
    let mut session = Session::open(db).await?;

    let out = f(&mut session).await;

    if let Err(e) = session.close().await {
        warn!(trace_id = %trace_ctx::trace_id(), error = %e, "session=close_failed");
    }
    out
}
