//! Integration test support for Emporium.
//!
//! # Running Tests
//!
//! ```bash
//! # Offline tests: pure rules and request validation
//! cargo test -p emporium-integration-tests
//!
//! # Live tests against a running, seeded storefront
//! STOREFRONT_URL=http://127.0.0.1:3000 cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `pricing_rules` - Shipping and payment rules over the bundled catalog
//! - `cart_checkout` - Cart reducer and checkout wizard together
//! - `storefront_requests` - Router-level validation without a database
//! - `storefront_live` - HTTP round trips against a live server (ignored)

#![allow(clippy::missing_panics_doc)]

pub mod fixtures;

use axum::Router;
use sqlx::postgres::PgPoolOptions;

use emporium_storefront::config::StorefrontConfig;
use emporium_storefront::routes;
use emporium_storefront::state::AppState;

/// Connection string that is never dialed; see [`offline_app`].
const UNUSED_DATABASE_URL: &str = "postgres://emporium@127.0.0.1:1/emporium_test";

/// The storefront router over a lazy pool that never connects.
///
/// Suitable for requests that are rejected before any query runs.
#[must_use]
pub fn offline_app() -> Router {
    let config = StorefrontConfig::from_lookup(|key| {
        (key == "STOREFRONT_DATABASE_URL").then(|| UNUSED_DATABASE_URL.to_owned())
    })
    .expect("test configuration is valid");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(UNUSED_DATABASE_URL)
        .expect("lazy pool accepts the URL");

    routes::routes().with_state(AppState::new(config, pool))
}

/// Base URL of a running storefront for live tests.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_owned())
}
