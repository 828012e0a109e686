//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;

/// Primary connection string variable.
pub const DATABASE_URL_VAR: &str = "STOREFRONT_DATABASE_URL";

/// Storefront connection string, falling back to `DATABASE_URL`.
///
/// Loads `.env` first when present.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
