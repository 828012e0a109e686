//! Shipping and payment method catalogs.
//!
//! Both catalogs are small and change only when seeded, so callers normally go
//! through [`crate::cache::CatalogCache`] instead of querying directly.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use emporium_core::pricing::{
    CardBrand, EstimatedDays, PaymentMethod, RegionalRule, ShippingMethod, Weekday, WeightRule,
};
use emporium_core::{PaymentMethodId, ShippingMethodId};

use super::{RepositoryError, parse_column};

#[derive(sqlx::FromRow)]
struct ShippingMethodRow {
    id: ShippingMethodId,
    name: String,
    description: String,
    method_type: String,
    base_price: Decimal,
    free_shipping_threshold: Decimal,
    estimated_days_min: i32,
    estimated_days_max: i32,
    regional_pricing: Json<Vec<RegionalRule>>,
    weight_rules: Json<Vec<WeightRule>>,
    icon: Option<String>,
    color: String,
    is_active: bool,
    is_popular: bool,
    features: Vec<String>,
    restrictions: Vec<String>,
    available_days: Vec<String>,
    cutoff_time: NaiveTime,
    min_order_value: Decimal,
    max_order_value: Option<Decimal>,
}

impl TryFrom<ShippingMethodRow> for ShippingMethod {
    type Error = RepositoryError;

    fn try_from(row: ShippingMethodRow) -> Result<Self, Self::Error> {
        let days = |value: i32, column: &str| {
            u32::try_from(value).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative {column} in database"))
            })
        };

        let available_days = row
            .available_days
            .iter()
            .map(|day| parse_column::<Weekday>(day, "available_days"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            method_type: parse_column(&row.method_type, "method_type")?,
            base_price: row.base_price,
            free_shipping_threshold: row.free_shipping_threshold,
            estimated_days: EstimatedDays {
                min: days(row.estimated_days_min, "estimated_days_min")?,
                max: days(row.estimated_days_max, "estimated_days_max")?,
            },
            regional_pricing: row.regional_pricing.0,
            weight_rules: row.weight_rules.0,
            icon: row.icon,
            color: row.color,
            is_active: row.is_active,
            is_popular: row.is_popular,
            features: row.features,
            restrictions: row.restrictions,
            available_days,
            cutoff_time: row.cutoff_time,
            min_order_value: row.min_order_value,
            max_order_value: row.max_order_value,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentMethodRow {
    id: PaymentMethodId,
    name: String,
    description: String,
    method_type: String,
    icon: Option<String>,
    color: String,
    is_active: bool,
    is_popular: bool,
    processing_fee: Decimal,
    processing_fee_percent: Decimal,
    min_amount: Decimal,
    max_amount: Option<Decimal>,
    supported_cards: Vec<String>,
    features: Vec<String>,
    restrictions: Vec<String>,
    processing_time: String,
    security_level: String,
}

impl TryFrom<PaymentMethodRow> for PaymentMethod {
    type Error = RepositoryError;

    fn try_from(row: PaymentMethodRow) -> Result<Self, Self::Error> {
        let supported_cards = row
            .supported_cards
            .iter()
            .map(|card| parse_column::<CardBrand>(card, "supported_cards"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            method_type: parse_column(&row.method_type, "method_type")?,
            icon: row.icon,
            color: row.color,
            is_active: row.is_active,
            is_popular: row.is_popular,
            processing_fee: row.processing_fee,
            processing_fee_percent: row.processing_fee_percent,
            min_amount: row.min_amount,
            max_amount: row.max_amount,
            supported_cards,
            features: row.features,
            restrictions: row.restrictions,
            processing_time: row.processing_time,
            security_level: parse_column(&row.security_level, "security_level")?,
        })
    }
}

/// Repository for the shipping and payment catalogs.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All shipping methods, active or not, by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored enum value is unknown.
    #[instrument(skip(self))]
    pub async fn shipping_methods(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShippingMethodRow>(
            r"
            SELECT id, name, description, method_type, base_price, free_shipping_threshold,
                   estimated_days_min, estimated_days_max, regional_pricing, weight_rules,
                   icon, color, is_active, is_popular, features, restrictions,
                   available_days, cutoff_time, min_order_value, max_order_value
            FROM storefront.shipping_method
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ShippingMethod::try_from).collect()
    }

    /// All payment methods, active or not, by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored enum value is unknown.
    #[instrument(skip(self))]
    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentMethodRow>(
            r"
            SELECT id, name, description, method_type, icon, color, is_active, is_popular,
                   processing_fee, processing_fee_percent, min_amount, max_amount,
                   supported_cards, features, restrictions, processing_time, security_level
            FROM storefront.payment_method
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PaymentMethod::try_from).collect()
    }
}
