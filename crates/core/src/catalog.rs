//! Product catalog rules.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

const NAME_MAX: usize = 60;
const DESCRIPTION_MAX: usize = 200;

/// Product validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Please provide a {0} for this product.")]
    Missing(&'static str),

    #[error("Name cannot be more than 60 characters")]
    NameTooLong,

    #[error("Description cannot be more than 200 characters")]
    DescriptionTooLong,

    #[error("Price must be between 0 and 99999")]
    PriceOutOfRange,

    #[error("Stock cannot be negative")]
    NegativeStock,
}

/// A product as submitted for creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

/// A product ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    pub stock: i32,
}

impl ProductDraft {
    /// # Errors
    ///
    /// Returns the first [`ProductError`] found.
    pub fn validate(&self) -> Result<ValidProduct, ProductError> {
        let name = present(self.name.as_deref(), "name")?;
        let description = present(self.description.as_deref(), "description")?;
        let price = self.price.ok_or(ProductError::Missing("price"))?;
        let image = present(self.image.as_deref(), "image")?;
        let category = present(self.category.as_deref(), "category")?;

        if name.chars().count() > NAME_MAX {
            return Err(ProductError::NameTooLong);
        }
        if description.chars().count() > DESCRIPTION_MAX {
            return Err(ProductError::DescriptionTooLong);
        }
        if price < Decimal::ZERO || price > Decimal::from(99_999) {
            return Err(ProductError::PriceOutOfRange);
        }
        if self.stock < 0 {
            return Err(ProductError::NegativeStock);
        }

        Ok(ValidProduct {
            name,
            description,
            price,
            image,
            category,
            stock: self.stock,
        })
    }
}

fn present(value: Option<&str>, field: &'static str) -> Result<String, ProductError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(ProductError::Missing(field))
}

/// Listing order for products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    Rating,
    /// Most reviewed first.
    Popular,
}

impl ProductSort {
    /// Parse a sort key; unknown keys fall back to newest first.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price-low") => Self::PriceLow,
            Some("price-high") => Self::PriceHigh,
            Some("rating") => Self::Rating,
            Some("popular") => Self::Popular,
            _ => Self::Newest,
        }
    }
}

/// Filters for the product listing. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductFilter {
    #[must_use]
    pub fn new(
        search: Option<&str>,
        category: Option<&str>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
        sort: Option<&str>,
    ) -> Self {
        let non_empty = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        Self {
            search: non_empty(search),
            category: non_empty(category),
            min_price,
            max_price,
            sort: ProductSort::parse(sort),
        }
    }

    /// `ILIKE` pattern for the search term, with wildcards in the term
    /// escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}
