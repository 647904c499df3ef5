//! Utility to inspect the target tables and print their column layout.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

use client_profile_migrator::models::{CLIENT_PROFILES_TABLE, USERS_TABLE};

/// Main entry point for the schema inspection utility.
///
/// Connects to the database and lists the columns of the lookup and target tables,
/// so the row shape can be confirmed before a migration run.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DB_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or DB_URL must be set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    for table in [USERS_TABLE, CLIENT_PROFILES_TABLE] {
        let columns: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position"
        )
        .bind(table)
        .fetch_all(&pool)
        .await?;

        if columns.is_empty() {
            println!("{}: not found in schema 'public'", table);
            println!();
            continue;
        }

        println!("{}:", table);
        for (col, type_, nullable) in columns {
            let null_marker = if nullable == "YES" { "" } else { " NOT NULL" };
            println!("  - {}: {}{}", col, type_, null_marker);
        }
        println!();
    }

    Ok(())
}
