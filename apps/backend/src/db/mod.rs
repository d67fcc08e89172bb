pub mod session;

use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::state::app_state::AppState;

/// Centralized helper to access the shared pool from AppState.
///
/// Returns `AppError::DbUnavailable` when the state was built without a
/// database.
pub fn require_db(state: &AppState) -> Result<&DatabaseConnection, AppError> {
    state
        .db()
        .ok_or_else(|| AppError::db_unavailable("Database is not configured"))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    use super::*;

    #[test]
    fn test_require_db_without_db() {
        let app_state = AppState::without_db();

        let result = require_db(&app_state);
        assert!(matches!(result, Err(AppError::DbUnavailable { .. })));
    }

    #[test]
    fn test_require_db_error_response_is_503() {
        let app_state = AppState::without_db();

        let Err(error) = require_db(&app_state) else {
            panic!("Expected error");
        };
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
