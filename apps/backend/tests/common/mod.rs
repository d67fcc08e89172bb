#![allow(dead_code)]

// tests/common/mod.rs
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use user_service::config::db::ConnectionDescriptor;
use user_service::infra::state::build_state;
use user_service::state::app_state::AppState;

// Logging is auto-installed for every test binary that declares `mod common`
#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

/// Fresh state over a private in-memory store with the schema applied.
pub async fn sqlite_state() -> AppState {
    build_state()
        .with_db(ConnectionDescriptor::sqlite_memory())
        .build()
        .await
        .expect("build sqlite test state")
}

pub fn db_of(state: &AppState) -> &DatabaseConnection {
    state.db().expect("test state has a database")
}

pub async fn count_users(db: &DatabaseConnection) -> i64 {
    db.query_one(Statement::from_string(
        db.get_database_backend(),
        "SELECT COUNT(*) AS cnt FROM users".to_string(),
    ))
    .await
    .expect("count query")
    .expect("count row")
    .try_get::<i64>("", "cnt")
    .expect("cnt column")
}

/// Initialize an actix test service wired exactly like `main.rs`.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(user_service::middleware::StructuredLogger)
                .wrap(user_service::middleware::TraceSpan)
                .wrap(user_service::middleware::RequestTrace)
                .app_data(actix_web::web::Data::new($state))
                .configure(user_service::routes::configure),
        )
        .await
    };
}
