//! In-memory cache for the shipping and payment catalogs.
//!
//! Both catalogs are read on every pricing and checkout request but only
//! change when `emp-cli seed catalog` runs, so they are held for the
//! configured TTL (`STOREFRONT_CATALOG_CACHE_TTL_SECS`).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use emporium_core::pricing::{PaymentMethod, ShippingMethod};

use crate::db::{CatalogRepository, RepositoryError};

/// Cache key for the catalogs.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    ShippingMethods,
    PaymentMethods,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    ShippingMethods(Arc<Vec<ShippingMethod>>),
    PaymentMethods(Arc<Vec<PaymentMethod>>),
}

/// Shipping and payment catalogs, loaded from `PostgreSQL` on a miss.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogCache {
    /// Create an empty cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { cache }
    }

    /// All shipping methods, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog has to be loaded and the load fails.
    #[instrument(skip(self, pool))]
    pub async fn shipping_methods(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<Vec<ShippingMethod>>, RepositoryError> {
        if let Some(CacheValue::ShippingMethods(methods)) =
            self.cache.get(&CacheKey::ShippingMethods).await
        {
            debug!("Cache hit for shipping methods");
            return Ok(methods);
        }

        let methods = Arc::new(CatalogRepository::new(pool).shipping_methods().await?);
        self.cache
            .insert(
                CacheKey::ShippingMethods,
                CacheValue::ShippingMethods(Arc::clone(&methods)),
            )
            .await;
        Ok(methods)
    }

    /// All payment methods, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog has to be loaded and the load fails.
    #[instrument(skip(self, pool))]
    pub async fn payment_methods(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<Vec<PaymentMethod>>, RepositoryError> {
        if let Some(CacheValue::PaymentMethods(methods)) =
            self.cache.get(&CacheKey::PaymentMethods).await
        {
            debug!("Cache hit for payment methods");
            return Ok(methods);
        }

        let methods = Arc::new(CatalogRepository::new(pool).payment_methods().await?);
        self.cache
            .insert(
                CacheKey::PaymentMethods,
                CacheValue::PaymentMethods(Arc::clone(&methods)),
            )
            .await;
        Ok(methods)
    }

    /// Drop both catalogs so the next request reloads them.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_all_empties_cache() {
        let catalog = CatalogCache::new(Duration::from_secs(60));
        catalog
            .cache
            .insert(
                CacheKey::PaymentMethods,
                CacheValue::PaymentMethods(Arc::new(Vec::new())),
            )
            .await;
        assert!(catalog.cache.get(&CacheKey::PaymentMethods).await.is_some());

        catalog.invalidate_all().await;
        assert!(catalog.cache.get(&CacheKey::PaymentMethods).await.is_none());
    }
}
