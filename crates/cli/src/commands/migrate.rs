//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time. They are never applied by the server on startup.

use thiserror::Error;

use emporium_storefront::db;

use super::{DATABASE_URL_VAR, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending storefront migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&url).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}
