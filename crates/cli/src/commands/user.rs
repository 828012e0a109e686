//! Customer management commands.

use thiserror::Error;

use emporium_core::Email;
use emporium_storefront::db::{self, RepositoryError, UserRepository};

use super::{DATABASE_URL_VAR, database_url};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Customer already exists with email: {0}")]
    UserExists(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

/// Create a customer and return their ID.
///
/// # Errors
///
/// Returns `UserError` for an invalid or taken email, or a database failure.
pub async fn create(email: &str, name: &str) -> Result<i32, UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;
    let url = database_url().ok_or(UserError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = db::create_pool(&url).await?;

    tracing::info!("Creating customer: {email}");
    let user = UserRepository::new(&pool)
        .create(&email, name.trim())
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(email.to_string()),
            e => UserError::Repository(e),
        })?;

    tracing::info!("Customer created! ID: {}, Email: {}", user.id, user.email);
    Ok(user.id.as_i32())
}
