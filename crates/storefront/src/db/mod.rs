//! Database operations for storefront `PostgreSQL`.
//!
//! ## Tables (schema `storefront`)
//!
//! - `user` - Customers, looked up by email
//! - `product` - Catalog with denormalized rating and review count
//! - `address` - Customer addresses (soft delete via `is_active`)
//! - `cart` - One JSON item list per customer
//! - `shipping_method` / `payment_method` - Pricing catalogs
//! - `review` / `review_vote` - Reviews and helpfulness votes
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod catalog;
pub mod products;
pub mod reviews;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate review).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Parse a text column into a domain enum, reporting bad values as corruption.
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} in database: {e}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::address::AddressType;

    use super::*;

    #[test]
    fn test_parse_column() {
        let kind: AddressType = parse_column("billing", "address_type").unwrap();
        assert_eq!(kind, AddressType::Billing);

        let err = parse_column::<AddressType>("office", "address_type").unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("address_type")));
    }
}
