use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::session::with_session;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::ValidatedJson;
use crate::repos::users::{self, NewUser, User};
use crate::state::app_state::AppState;
use crate::web::trace_ctx;

/// Body of `POST /users`. The id is assigned by the store, so supplying
/// one (or any other unexpected field) is rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            full_name: req.full_name,
        }
    }
}

fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| {
        AppError::bad_request(
            ErrorCode::InvalidUserId,
            format!("Invalid user id: {raw}"),
        )
    })
}

async fn create_user(
    app_state: web::Data<AppState>,
    body: ValidatedJson<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let new_user = NewUser::from(body.into_inner());

    let user = with_session(&app_state, |session| {
        Box::pin(async move { users::create(session, new_user).await.map_err(AppError::from) })
    })
    .await?;

    info!(trace_id = %trace_ctx::trace_id(), user_id = user.id, "user created");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

async fn list_users(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = with_session(&app_state, |session| {
        Box::pin(async move { users::list_all(session).await.map_err(AppError::from) })
    })
    .await?;

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

async fn get_user(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_user_id(&path.into_inner())?;

    let user = with_session(&app_state, |session| {
        Box::pin(async move { users::get_by_id(session, id).await.map_err(AppError::from) })
    })
    .await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::post().to(create_user))
        .route("", web::get().to(list_users))
        .route("/{id}", web::get().to(get_user));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_id_accepts_integers() {
        assert_eq!(parse_user_id("42").unwrap(), 42);
    }

    #[test]
    fn parse_user_id_rejects_garbage() {
        let err = parse_user_id("abc").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidUserId);
        assert_eq!(err.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn create_request_rejects_client_supplied_id() {
        let result = serde_json::from_str::<CreateUserRequest>(
            r#"{"id": 1, "username": "ada", "email": "ada@example.com"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_request_full_name_is_optional() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"username": "ada", "email": "ada@example.com"}"#).unwrap();
        assert_eq!(req.full_name, None);
    }
}
