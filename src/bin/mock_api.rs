//! Database-free TechBook API serving a fixed demo catalog from memory.
//!
//! Answers the same routes and envelopes as the main binary, which makes it
//! suitable for storefront development. State is lost on restart.

use techbook_api::config::Config;
use techbook_api::server;
use techbook_api::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    server::init_tracing();

    let config = Config::from_env()?;
    tracing::info!("Mock API starting with the demo catalog");

    server::run(MemoryStore::seeded(), config).await
}
