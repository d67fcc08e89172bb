mod common;

use std::time::Duration;

use sea_orm::{ConnectionTrait, Statement};
use user_service::db::session::{with_session, Session};
use user_service::error::AppError;
use user_service::repos::users::{self, NewUser};

use crate::common::{count_users, db_of, sqlite_state};

#[tokio::test]
async fn with_session_returns_body_result_and_commits_only_what_was_committed() {
    let state = sqlite_state().await;

    let user = with_session(&state, |session| {
        Box::pin(async move {
            users::create(session, NewUser::new("kept", "k@example.com"))
                .await
                .map_err(AppError::from)
        })
    })
    .await
    .unwrap();

    assert_eq!(user.username, "kept");
    assert_eq!(count_users(db_of(&state)).await, 1);
}

#[tokio::test]
async fn with_session_rolls_back_uncommitted_writes() {
    let state = sqlite_state().await;

    with_session(&state, |session| {
        Box::pin(async move {
            let conn = session.conn().await.map_err(AppError::from)?;
            conn.execute(Statement::from_string(
                conn.get_database_backend(),
                "INSERT INTO users (username, email) VALUES ('uncommitted', 'u@example.com')"
                    .to_string(),
            ))
            .await?;
            Ok::<(), AppError>(())
        })
    })
    .await
    .unwrap();

    assert_eq!(count_users(db_of(&state)).await, 0);
}

#[tokio::test]
async fn failed_body_still_releases_the_connection() {
    let state = sqlite_state().await;

    for _ in 0..3 {
        let result = with_session(&state, |session| {
            Box::pin(async move {
                users::get_by_id(session, 77)
                    .await
                    .map_err(AppError::from)
            })
        })
        .await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    // The single pooled connection is free again
    let mut session = Session::open(db_of(&state)).await.unwrap();
    assert!(session.in_transaction());
    session.close().await.unwrap();
}

#[tokio::test]
async fn cancelled_request_releases_its_session() {
    let state = sqlite_state().await;

    let cancelled = tokio::time::timeout(
        Duration::from_millis(100),
        with_session(&state, |session| {
            Box::pin(async move {
                let conn = session.conn().await.map_err(AppError::from)?;
                conn.execute(Statement::from_string(
                    conn.get_database_backend(),
                    "INSERT INTO users (username, email) VALUES ('abandoned', 'a@example.com')"
                        .to_string(),
                ))
                .await?;
                futures::future::pending::<()>().await;
                Ok::<(), AppError>(())
            })
        }),
    )
    .await;
    assert!(cancelled.is_err(), "body should have been cancelled");

    // The dropped session rolled back and returned its connection
    assert_eq!(count_users(db_of(&state)).await, 0);
}
