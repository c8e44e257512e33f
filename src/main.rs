use techbook_api::config::Config;
use techbook_api::db::Database;
use techbook_api::server;
use techbook_api::store::PgStore;

/// Entry point for the database-backed TechBook API.
///
/// The pool connects lazily, so the server starts even when PostgreSQL is
/// down; requests then fail with 500 and `/api/health` reports
/// `disconnected` until the database comes back.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::connect_lazy(&config.database)?;
    if db.check_health().await {
        tracing::info!("Database connection established");
        db.verify_schema().await;
    } else {
        tracing::warn!("Database unreachable at startup, serving in fallback mode");
    }

    server::run(PgStore::new(db), config).await
}
