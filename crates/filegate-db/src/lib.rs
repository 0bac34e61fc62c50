//! FileGate persistence layer
//!
//! Repository traits for users, tenants, file records and the audit log, with
//! PostgreSQL implementations and (behind the `memory` feature) in-memory ones.

pub mod db;

pub use db::*;

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::path::Path;

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}
