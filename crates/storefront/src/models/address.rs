//! Address domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use emporium_core::address::{AddressFields, AddressSnapshot};
use emporium_core::{AddressId, UserId};

/// A customer's postal address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub fields: AddressFields,
    pub full_name: String,
    pub formatted_address: String,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Build an address, deriving the display name and one-line form.
    #[must_use]
    pub fn new(
        id: AddressId,
        user_id: UserId,
        fields: AddressFields,
        is_default: bool,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            full_name: fields.full_name(),
            formatted_address: fields.formatted(),
            fields,
            is_default,
            is_active,
            created_at,
            updated_at,
        }
    }

    /// The fields the default-address planner looks at.
    #[must_use]
    pub const fn snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            id: self.id,
            address_type: self.fields.address_type,
            is_default: self.is_default,
            created_at: self.created_at,
        }
    }
}
