//! End-to-end checks against a real Postgres (TLS required).
//!
//! Run with `DATABASE_URL=postgresql://... cargo test -p user-service -- --ignored`.

mod common;

use backend_test_support::unique_helpers::{unique_email, unique_username};
use sea_orm::{ConnectionTrait, Statement};
use user_service::config::db::{ConnectionDescriptor, PoolSettings};
use user_service::db::session::Session;
use user_service::errors::domain::{ConflictKind, DomainError};
use user_service::infra::db::{bootstrap_db, close_pool, open_pool};
use user_service::infra::schema::ensure_schema;
use user_service::repos::users::{self, NewUser};

fn descriptor() -> ConnectionDescriptor {
    let raw = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    ConnectionDescriptor::parse(&raw).expect("DATABASE_URL must be a valid Postgres URL")
}

#[tokio::test]
#[ignore = "requires database"]
async fn schema_initializer_is_idempotent_on_postgres() {
    let db = open_pool(&descriptor(), &PoolSettings::default()).unwrap();

    ensure_schema(&db).await.unwrap();
    ensure_schema(&db).await.unwrap();

    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS cnt FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = 'users'"
                .to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<i64>("", "cnt").unwrap(), 1);

    close_pool(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn session_settings_are_applied_per_connection() {
    let db = bootstrap_db(&descriptor(), &PoolSettings::default())
        .await
        .unwrap();

    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT current_setting('application_name') AS app, \
             current_setting('TimeZone') AS tz"
                .to_string(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<String>("", "app").unwrap(), "user-service");
    assert_eq!(row.try_get::<String>("", "tz").unwrap(), "UTC");

    close_pool(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires database"]
async fn concurrent_sessions_are_independent_and_one_create_wins() {
    let db = bootstrap_db(&descriptor(), &PoolSettings::default())
        .await
        .unwrap();
    let username = unique_username("pg-race");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let username = username.clone();
        handles.push(tokio::spawn(async move {
            let mut session = Session::open(&db).await?;
            let result =
                users::create(&mut session, NewUser::new(username, unique_email("race"))).await;
            let _ = session.close().await;
            result
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(DomainError::Conflict(ConflictKind::UniqueUsername, _)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(ok, 1);

    close_pool(db).await;
}

// Needs no server: nothing listens on port 1
#[tokio::test]
async fn unreachable_host_surfaces_as_db_unavailable() {
    let descriptor = ConnectionDescriptor::parse("postgres://u:p@127.0.0.1:1/none").unwrap();
    let settings = PoolSettings {
        acquire_timeout_ms: 200,
        ..PoolSettings::default()
    };
    let db = open_pool(&descriptor, &settings).unwrap();

    let err = ensure_schema(&db).await.unwrap_err();
    assert!(matches!(err, user_service::AppError::DbUnavailable { .. }));
}
