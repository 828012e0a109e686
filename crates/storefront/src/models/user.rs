//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use emporium_core::{Email, UserId};

/// A storefront customer.
///
/// Requests identify the customer by email; handlers resolve it to a `User`
/// before touching any customer-owned data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name shown next to reviews.
    pub name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
