//! Domain models for storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Every model serializes to the camelCase JSON the API
//! returns.

pub mod address;
pub mod product;
pub mod review;
pub mod user;

pub use address::Address;
pub use product::Product;
pub use review::Review;
pub use user::User;
