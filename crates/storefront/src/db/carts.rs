//! Saved carts, one per customer.
//!
//! Changes go through [`CartRepository::update`], which holds a per-customer
//! advisory lock for the whole read-modify-write so concurrent requests for
//! the same customer are applied one after another.

use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, instrument};

use emporium_core::UserId;
use emporium_core::cart::{CartItem, CartState};

use super::RepositoryError;

/// First key of the advisory lock pair that serializes cart writes.
const CART_LOCK_CLASS: i32 = 0x4341;

/// Repository for saved carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Items saved for `user_id`; empty when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails or the stored
    /// JSON does not decode.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        select_items(self.pool, user_id).await
    }

    /// Load the cart of `user_id` under its lock, apply `change` and save the
    /// result when its items differ.
    ///
    /// Returns the cart as `change` left it. Nothing is written when `change`
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the error of `change`, or `RepositoryError::Database` (converted
    /// into `E`) if locking, loading or saving fails.
    #[instrument(skip(self, change))]
    pub async fn update<F, E>(&self, user_id: UserId, change: F) -> Result<CartState, E>
    where
        F: FnOnce(CartState) -> Result<CartState, E>,
        E: From<RepositoryError>,
    {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(CART_LOCK_CLASS)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        let before = select_items(&mut *tx, user_id).await?;
        let cart = change(CartState::from_items(before.clone()))?;

        if cart.items() != before.as_slice() {
            upsert_items(&mut *tx, user_id, cart.items()).await?;
            debug!(items = cart.items().len(), "Saved cart");
        }

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(cart)
    }
}

async fn select_items(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let row: Option<(Json<Vec<CartItem>>,)> = sqlx::query_as(
        r"
        SELECT items
        FROM storefront.cart
        WHERE user_id = $1
        ",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|(Json(items),)| items).unwrap_or_default())
}

async fn upsert_items(
    executor: impl PgExecutor<'_>,
    user_id: UserId,
    items: &[CartItem],
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO storefront.cart (user_id, items, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id)
        DO UPDATE SET items = EXCLUDED.items, updated_at = now()
        ",
    )
    .bind(user_id)
    .bind(Json(items))
    .execute(executor)
    .await?;

    Ok(())
}
