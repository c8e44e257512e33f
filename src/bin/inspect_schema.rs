//! Utility to inspect the database schema and print the TechBook tables.

use techbook_api::config::Config;
use techbook_api::db::Database;

const TABLES: [&str; 2] = ["produtos", "contatos"];

/// Connects with the regular configuration and lists the columns of each
/// table the API reads, flagging the ones that are missing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let db = Database::connect_lazy(&config.database)?;

    for table in TABLES {
        // Get columns for this table
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text, is_nullable::text \
             FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&db.pool)
        .await?;

        if columns.is_empty() {
            println!("- {}: MISSING", table);
            continue;
        }

        println!("- {}", table);
        for (col, type_, nullable) in columns {
            let null_marker = if nullable == "YES" { "" } else { " not null" };
            println!("  - {}: {}{}", col, type_, null_marker);
        }
        println!();
    }

    db.close().await;
    Ok(())
}
