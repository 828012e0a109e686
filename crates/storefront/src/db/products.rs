//! Product catalog queries.

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use emporium_core::ProductId;
use emporium_core::catalog::{ProductFilter, ProductSort, ValidProduct};
use emporium_core::review::{Rating, RatingSummary};

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image, category, stock, rating, num_reviews, created_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        query.push(PRODUCT_COLUMNS);
        query.push(" FROM storefront.product WHERE TRUE");

        if let Some(pattern) = filter.search_pattern() {
            query.push(" AND (name ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR description ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR category ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ");
            query.push_bind(category.clone());
        }
        if let Some(min) = filter.min_price {
            query.push(" AND price >= ");
            query.push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND price <= ");
            query.push_bind(max);
        }

        query.push(match filter.sort {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceLow => " ORDER BY price ASC, id ASC",
            ProductSort::PriceHigh => " ORDER BY price DESC, id ASC",
            ProductSort::Rating => " ORDER BY rating DESC, num_reviews DESC, id ASC",
            ProductSort::Popular => " ORDER BY num_reviews DESC, rating DESC, id ASC",
        });

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Insert a validated product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &ValidProduct) -> Result<Product, RepositoryError> {
        let created = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO storefront.product (name, description, price, image, category, stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.category)
        .bind(product.stock)
        .fetch_one(self.pool)
        .await?;

        debug!(id = %created.id, "Created product");
        Ok(created)
    }

    /// Rating summary over a product's approved reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::DataCorruption` if a stored rating is out of range.
    #[instrument(skip(self))]
    pub async fn rating_summary(&self, id: ProductId) -> Result<RatingSummary, RepositoryError> {
        if self.get(id).await?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let ratings: Vec<(i16,)> = sqlx::query_as(
            r"
            SELECT rating
            FROM storefront.review
            WHERE product_id = $1 AND approved
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let ratings = ratings
            .into_iter()
            .map(|(value,)| {
                Rating::try_from(i64::from(value)).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RatingSummary::from_ratings(ratings))
    }
}
