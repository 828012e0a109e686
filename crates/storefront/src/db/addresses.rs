//! Customer address storage.
//!
//! Every write runs in one transaction that first takes a per-customer
//! advisory lock and then locks the customer's active rows. Concurrent writes
//! for the same customer are therefore applied one after another, and the
//! default flags computed by [`emporium_core::address`] are written together
//! with the change that caused them.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, instrument};

use emporium_core::address::{
    AddressError, AddressFields, AddressPatch, AddressSnapshot, AddressType, default_for_new,
    demotions_for, promotion_after_delete,
};
use emporium_core::{AddressId, UserId};

use super::{RepositoryError, parse_column};
use crate::models::Address;

/// First key of the advisory lock pair that serializes address writes.
const ADDRESS_LOCK_CLASS: i32 = 0x4144;

const ADDRESS_COLUMNS: &str = "id, user_id, address_type, title, first_name, last_name, company, \
     phone, address_line1, address_line2, city, state, postal_code, country, is_default, \
     is_active, created_at, updated_at";

/// Failure of an address write: either bad input or storage.
#[derive(Debug, Error)]
pub enum AddressWriteError {
    #[error(transparent)]
    Invalid(#[from] AddressError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    address_type: String,
    title: String,
    first_name: String,
    last_name: String,
    company: String,
    phone: String,
    address_line1: String,
    address_line2: String,
    city: String,
    state: String,
    postal_code: String,
    country: String,
    is_default: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let fields = AddressFields {
            address_type: parse_column(&row.address_type, "address_type")?,
            title: row.title,
            first_name: row.first_name,
            last_name: row.last_name,
            company: row.company,
            phone: row.phone,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code.trim_end().to_owned(),
            country: row.country,
        };

        Ok(Self::new(
            row.id,
            row.user_id,
            fields,
            row.is_default,
            row.is_active,
            row.created_at,
            row.updated_at,
        ))
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active addresses of a customer, default first, then newest first.
    ///
    /// With `kind`, only addresses of that type or of type `both` are listed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: UserId,
        kind: Option<AddressType>,
    ) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM storefront.address
            WHERE user_id = $1
              AND is_active
              AND ($2::text IS NULL OR address_type = $2 OR address_type = 'both')
            ORDER BY is_default DESC, created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .bind(kind.map(AddressType::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Address::try_from).collect()
    }

    /// One active address of a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM storefront.address
            WHERE id = $1 AND user_id = $2 AND is_active
            "
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::try_from).transpose()
    }

    /// Store a new address.
    ///
    /// The customer's first active address becomes the default whatever was
    /// requested. A new default clears the defaults it overlaps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    #[instrument(skip(self, fields), fields(address_type = %fields.address_type))]
    pub async fn create(
        &self,
        user_id: UserId,
        fields: &AddressFields,
        requested_default: bool,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let active = lock_active(&mut tx, user_id).await?;

        let is_default = default_for_new(requested_default, active.len());

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            INSERT INTO storefront.address
                (user_id, address_type, title, first_name, last_name, company, phone,
                 address_line1, address_line2, city, state, postal_code, country, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(fields.address_type.as_str())
        .bind(&fields.title)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.company)
        .bind(&fields.phone)
        .bind(&fields.address_line1)
        .bind(&fields.address_line2)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.postal_code)
        .bind(&fields.country)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;
        let address = Address::try_from(row)?;

        if is_default {
            let demote = demotions_for(address.id, fields.address_type, &snapshots(&active));
            set_default(&mut tx, &demote, false).await?;
        }

        tx.commit().await?;
        debug!(id = %address.id, is_default, "Created address");
        Ok(address)
    }

    /// Apply a partial update to an active address.
    ///
    /// # Errors
    ///
    /// Returns `AddressWriteError::Invalid` if the merged address fails
    /// validation, `RepositoryError::NotFound` if the customer has no such
    /// active address, and `RepositoryError::Database` if a statement fails.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        patch: &AddressPatch,
    ) -> Result<Address, AddressWriteError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let active = lock_active(&mut tx, user_id).await?;

        let current = active
            .iter()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let fields = patch.apply(&current.fields)?;
        let is_default = patch.is_default.unwrap_or(current.is_default);

        let address = update_row(&mut tx, id, &fields, is_default).await?;

        if is_default {
            let demote = demotions_for(id, fields.address_type, &snapshots(&active));
            set_default(&mut tx, &demote, false).await?;
        }

        tx.commit().await.map_err(RepositoryError::from)?;
        debug!(is_default, "Updated address");
        Ok(address)
    }

    /// Soft-delete an active address.
    ///
    /// Deleting the default hands the flag to the newest remaining active
    /// address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer has no such active
    /// address, and `RepositoryError::Database` if a statement fails.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let active = lock_active(&mut tx, user_id).await?;

        let target = active
            .iter()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            UPDATE storefront.address
            SET is_active = FALSE, is_default = FALSE, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let plan = promotion_after_delete(&target.snapshot(), &snapshots(&active));
        set_default(&mut tx, &plan.demote, false).await?;
        if let Some(promoted) = plan.promote {
            set_default(&mut tx, &[promoted], true).await?;
        }

        tx.commit().await?;
        debug!(promoted = ?plan.promote, "Deleted address");
        Ok(())
    }
}

fn snapshots(active: &[Address]) -> Vec<AddressSnapshot> {
    active.iter().map(Address::snapshot).collect()
}

/// Take the customer's address lock and load their active addresses.
async fn lock_active(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Vec<Address>, RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(ADDRESS_LOCK_CLASS)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    let rows = sqlx::query_as::<_, AddressRow>(&format!(
        r"
        SELECT {ADDRESS_COLUMNS}
        FROM storefront.address
        WHERE user_id = $1 AND is_active
        ORDER BY created_at, id
        FOR UPDATE
        "
    ))
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter().map(Address::try_from).collect()
}

async fn set_default(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[AddressId],
    value: bool,
) -> Result<(), RepositoryError> {
    if ids.is_empty() {
        return Ok(());
    }
    let ids: Vec<i32> = ids.iter().map(AddressId::as_i32).collect();

    sqlx::query(
        r"
        UPDATE storefront.address
        SET is_default = $2, updated_at = now()
        WHERE id = ANY($1)
        ",
    )
    .bind(ids)
    .bind(value)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn update_row(
    tx: &mut Transaction<'_, Postgres>,
    id: AddressId,
    fields: &AddressFields,
    is_default: bool,
) -> Result<Address, RepositoryError> {
    let row = sqlx::query_as::<_, AddressRow>(&format!(
        r"
        UPDATE storefront.address
        SET address_type = $2, title = $3, first_name = $4, last_name = $5, company = $6,
            phone = $7, address_line1 = $8, address_line2 = $9, city = $10, state = $11,
            postal_code = $12, country = $13, is_default = $14, updated_at = now()
        WHERE id = $1
        RETURNING {ADDRESS_COLUMNS}
        "
    ))
    .bind(id)
    .bind(fields.address_type.as_str())
    .bind(&fields.title)
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.company)
    .bind(&fields.phone)
    .bind(&fields.address_line1)
    .bind(&fields.address_line2)
    .bind(&fields.city)
    .bind(&fields.state)
    .bind(&fields.postal_code)
    .bind(&fields.country)
    .bind(is_default)
    .fetch_one(&mut **tx)
    .await?;

    Address::try_from(row)
}
