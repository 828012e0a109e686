//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use emporium_core::ProductId;
use emporium_core::cart::CartProduct;

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    pub stock: i32,
    /// Average of approved review ratings, one decimal.
    pub rating: Decimal,
    pub num_reviews: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The details a cart line keeps about this product.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            product_id: self.id,
            name: self.name.clone(),
            price: self.price,
            category: self.category.clone(),
            image: self.image.clone(),
            stock: Some(self.stock),
        }
    }
}
