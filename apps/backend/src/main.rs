use actix_web::{web, App, HttpServer};
use tracing::{error, info};
use user_service::config::app::AppConfig;
use user_service::infra::db::close_pool;
use user_service::infra::state::build_state;
use user_service::middleware::request_trace::RequestTrace;
use user_service::middleware::structured_logger::StructuredLogger;
use user_service::middleware::trace_span::TraceSpan;
use user_service::routes;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: docker run --env-file
    // - Local dev: source env files manually (e.g., set -a; . ./.env; set +a)
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "startup=failed stage=config");
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "startup=begin host={} port={} db={}",
        config.host,
        config.port,
        config.database.redacted_url()
    );

    let app_state = match build_state()
        .with_db(config.database.clone())
        .with_pool_settings(config.pool.clone())
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "startup=failed stage=bootstrap");
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    println!("✅ Database ready");
    println!(
        "🚀 Starting user-service on http://{}:{}",
        config.host, config.port
    );

    // Keep a handle so the pool can be closed after the server stops
    let pool = app_state.db().cloned();

    // Wrap AppState with web::Data before passing to HttpServer
    let data = web::Data::new(app_state);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    info!("shutdown=complete");

    result
}
