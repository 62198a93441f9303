//! Database schema
//!
//! The schema carries a single version number in `PRAGMA user_version`.
//! There is no migration path: a database at any other version has both
//! tables dropped and recreated, discarding their rows.

use crate::config::SCHEMA_VERSION;
use crate::error::Result;
use sqlx::sqlite::SqlitePool;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Initialize database with schema
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Initializing database schema");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    let current_version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    tracing::info!("Current database version: {}", current_version);

    if current_version == SCHEMA_VERSION {
        return Ok(());
    }

    if current_version != 0 {
        tracing::warn!(
            "Schema version {} does not match {}, discarding existing notes",
            current_version,
            SCHEMA_VERSION
        );
    }

    recreate_tables(pool).await?;

    tracing::info!("Database initialization complete");
    Ok(())
}

async fn recreate_tables(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS attachments")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DROP TABLE IF EXISTS notes")
        .execute(&mut *tx)
        .await?;

    for statement in SCHEMA_SQL.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    // PRAGMA arguments cannot be bound
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Schema version {} created", SCHEMA_VERSION);
    Ok(())
}
