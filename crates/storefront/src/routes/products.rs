//! Product route handlers.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use emporium_core::ProductId;
use emporium_core::catalog::{ProductDraft, ProductFilter};
use emporium_core::review::RatingSummary;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// Product listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<String>,
}

impl ProductQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter::new(
            self.search.as_deref(),
            self.category.as_deref(),
            self.min_price,
            self.max_price,
            self.sort_by.as_deref(),
        )
    }
}

/// List products.
///
/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(&query.filter())
        .await?;
    Ok(Json(products))
}

/// Create a product.
///
/// POST /api/products
#[instrument(skip(state, draft))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = draft.validate()?;
    let created = ProductRepository::new(state.pool())
        .create(&product)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Show one product.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
}

/// Rating summary over the product's approved reviews.
///
/// GET /api/products/{id}/rating
#[instrument(skip(state))]
pub async fn rating(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<RatingSummary>> {
    let summary = ProductRepository::new(state.pool())
        .rating_summary(id)
        .await?;
    Ok(Json(summary))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::catalog::ProductSort;

    use super::*;

    #[test]
    fn test_query_to_filter() {
        let query: ProductQuery = serde_json::from_value(serde_json::json!({
            "search": "  kulaklik ",
            "category": "",
            "minPrice": "100",
            "sortBy": "price-high"
        }))
        .unwrap();

        let filter = query.filter();
        assert_eq!(filter.search.as_deref(), Some("kulaklik"));
        assert_eq!(filter.category, None);
        assert_eq!(filter.min_price, Some(Decimal::ONE_HUNDRED));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.sort, ProductSort::PriceHigh);
    }
}
