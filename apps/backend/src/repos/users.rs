//! User repository: the only place user records are created or read.
//!
//! Every operation runs on the caller's [`Session`]; `create` commits its
//! own insert, reads never write.

use crate::adapters::users_sea as users_adapter;
use crate::db::session::Session;
use crate::errors::domain::{DomainError, NotFoundKind};

/// User domain model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

/// Fields a caller supplies to create a user; the id is always assigned by
/// the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            full_name: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }
        if self.email.trim().is_empty() {
            return Err(DomainError::validation("email must not be empty"));
        }
        Ok(())
    }
}

/// Insert a user and commit. A taken username is
/// `DomainError::Conflict(ConflictKind::UniqueUsername, ..)`.
pub async fn create(session: &mut Session, new_user: NewUser) -> Result<User, DomainError> {
    new_user.validate()?;

    let mut dto = users_adapter::UserCreate::new(new_user.username, new_user.email);
    if let Some(full_name) = new_user.full_name {
        dto = dto.with_full_name(full_name);
    }

    let txn = session.conn().await?;
    let user = users_adapter::create_user(txn, dto).await?;
    session.commit().await?;
    Ok(User::from(user))
}

pub async fn get_by_id(session: &mut Session, id: i64) -> Result<User, DomainError> {
    let txn = session.conn().await?;
    users_adapter::find_user_by_id(txn, id)
        .await?
        .map(User::from)
        .ok_or_else(|| DomainError::not_found(NotFoundKind::User, format!("User {id} not found")))
}

/// Every user, ordered by id ascending.
pub async fn list_all(session: &mut Session) -> Result<Vec<User>, DomainError> {
    let txn = session.conn().await?;
    let users = users_adapter::list_users(txn).await?;
    Ok(users.into_iter().map(User::from).collect())
}

impl From<crate::entities::users::Model> for User {
    fn from(model: crate::entities::users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
        }
    }
}
