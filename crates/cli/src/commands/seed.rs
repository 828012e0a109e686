//! Seed the storefront catalog from YAML.
//!
//! The bundled files under `crates/cli/seed/` are compiled in; `--file`
//! loads another file with the same layout. Files are parsed and validated
//! before any database connection is made.

use std::path::Path;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{error, info};

use emporium_core::catalog::ProductDraft;
use emporium_core::pricing::{
    CardBrand, EstimatedDays, PaymentMethodType, RegionalRule, SecurityLevel, ShippingMethodType,
    Weekday, WeightRule,
};
use emporium_storefront::db::{self, ProductRepository};

use super::{DATABASE_URL_VAR, database_url};

const BUNDLED_CATALOG: &str = include_str!("../../seed/catalog.yaml");
const BUNDLED_PRODUCTS: &str = include_str!("../../seed/products.yaml");

fn default_color() -> String {
    "#3b82f6".to_owned()
}

const fn default_true() -> bool {
    true
}

fn default_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_processing_time() -> String {
    "Instant".to_owned()
}

const fn default_security_level() -> SecurityLevel {
    SecurityLevel::High
}

/// Shipping and payment catalog file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethodSeed>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethodSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: ShippingMethodType,
    pub base_price: Decimal,
    #[serde(default)]
    pub free_shipping_threshold: Decimal,
    pub estimated_days: EstimatedDays,
    #[serde(default)]
    pub regional_pricing: Vec<RegionalRule>,
    #[serde(default)]
    pub weight_rules: Vec<WeightRule>,
    pub icon: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default)]
    pub available_days: Vec<Weekday>,
    #[serde(default = "default_cutoff")]
    pub cutoff_time: NaiveTime,
    #[serde(default)]
    pub min_order_value: Decimal,
    pub max_order_value: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub icon: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub processing_fee: Decimal,
    #[serde(default)]
    pub processing_fee_percent: Decimal,
    #[serde(default)]
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    #[serde(default)]
    pub supported_cards: Vec<CardBrand>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub restrictions: Vec<String>,
    #[serde(default = "default_processing_time")]
    pub processing_time: String,
    #[serde(default = "default_security_level")]
    pub security_level: SecurityLevel,
}

/// Check a catalog file, returning one message per problem.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    for method in &catalog.shipping_methods {
        let name = &method.name;
        if name.trim().is_empty() {
            errors.push("shipping method without a name".to_owned());
        }
        if method.base_price < Decimal::ZERO {
            errors.push(format!("{name}: negative base price"));
        }
        if method.estimated_days.min > method.estimated_days.max {
            errors.push(format!("{name}: estimatedDays.min is above max"));
        }
        if method
            .weight_rules
            .windows(2)
            .any(|pair| matches!(pair, [a, b] if a.max_weight >= b.max_weight))
        {
            errors.push(format!("{name}: weightRules must be ordered by maxWeight"));
        }
        if method
            .regional_pricing
            .iter()
            .any(|rule| rule.price_multiplier <= Decimal::ZERO)
        {
            errors.push(format!("{name}: priceMultiplier must be positive"));
        }
        if method
            .max_order_value
            .is_some_and(|max| max < method.min_order_value)
        {
            errors.push(format!("{name}: maxOrderValue is below minOrderValue"));
        }
    }

    for method in &catalog.payment_methods {
        let name = &method.name;
        if name.trim().is_empty() {
            errors.push("payment method without a name".to_owned());
        }
        if method.processing_fee < Decimal::ZERO {
            errors.push(format!("{name}: negative processingFee"));
        }
        if method.max_amount.is_some_and(|max| max < method.min_amount) {
            errors.push(format!("{name}: maxAmount is below minAmount"));
        }
    }

    errors
}

/// Read `file`, or the bundled text when no file is given.
async fn read_source(file: Option<&Path>, bundled: &'static str) -> std::io::Result<String> {
    match file {
        Some(path) => {
            info!(path = %path.display(), "Loading seed file");
            tokio::fs::read_to_string(path).await
        }
        None => Ok(bundled.to_owned()),
    }
}

async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let url = database_url().ok_or_else(|| format!("{DATABASE_URL_VAR} not set"))?;
    let pool = db::create_pool(&url).await?;
    info!("Connected to database");
    Ok(pool)
}

/// Load shipping and payment methods, updating existing rows by name.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_source(file, BUNDLED_CATALOG).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;
    info!(
        shipping = catalog.shipping_methods.len(),
        payment = catalog.payment_methods.len(),
        "Parsed catalog"
    );

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let (mut inserted, mut updated) = (0_usize, 0_usize);
    for method in &catalog.shipping_methods {
        if upsert_shipping_method(&mut tx, method).await? {
            inserted += 1;
        } else {
            updated += 1;
        }
    }
    for method in &catalog.payment_methods {
        if upsert_payment_method(&mut tx, method).await? {
            inserted += 1;
        } else {
            updated += 1;
        }
    }
    tx.commit().await?;

    info!("Catalog seeding complete!");
    info!("  Methods inserted: {inserted}");
    info!("  Methods updated: {updated}");
    Ok(())
}

/// Returns true when a new row was inserted.
async fn upsert_shipping_method(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    method: &ShippingMethodSeed,
) -> Result<bool, Box<dyn std::error::Error>> {
    let available_days: Vec<String> = method
        .available_days
        .iter()
        .map(|day| day.as_str().to_owned())
        .collect();

    let inserted = sqlx::query_scalar::<_, bool>(
        r"
        INSERT INTO storefront.shipping_method (
            name, description, method_type, base_price, free_shipping_threshold,
            estimated_days_min, estimated_days_max, regional_pricing, weight_rules,
            icon, color, is_active, is_popular, features, restrictions,
            available_days, cutoff_time, min_order_value, max_order_value
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        ON CONFLICT (name) DO UPDATE SET
            description = EXCLUDED.description,
            method_type = EXCLUDED.method_type,
            base_price = EXCLUDED.base_price,
            free_shipping_threshold = EXCLUDED.free_shipping_threshold,
            estimated_days_min = EXCLUDED.estimated_days_min,
            estimated_days_max = EXCLUDED.estimated_days_max,
            regional_pricing = EXCLUDED.regional_pricing,
            weight_rules = EXCLUDED.weight_rules,
            icon = EXCLUDED.icon,
            color = EXCLUDED.color,
            is_active = EXCLUDED.is_active,
            is_popular = EXCLUDED.is_popular,
            features = EXCLUDED.features,
            restrictions = EXCLUDED.restrictions,
            available_days = EXCLUDED.available_days,
            cutoff_time = EXCLUDED.cutoff_time,
            min_order_value = EXCLUDED.min_order_value,
            max_order_value = EXCLUDED.max_order_value
        RETURNING (xmax = 0)
        ",
    )
    .bind(&method.name)
    .bind(&method.description)
    .bind(method.method_type.as_str())
    .bind(method.base_price)
    .bind(method.free_shipping_threshold)
    .bind(i32::try_from(method.estimated_days.min)?)
    .bind(i32::try_from(method.estimated_days.max)?)
    .bind(Json(&method.regional_pricing))
    .bind(Json(&method.weight_rules))
    .bind(&method.icon)
    .bind(&method.color)
    .bind(method.is_active)
    .bind(method.is_popular)
    .bind(&method.features)
    .bind(&method.restrictions)
    .bind(&available_days)
    .bind(method.cutoff_time)
    .bind(method.min_order_value)
    .bind(method.max_order_value)
    .fetch_one(&mut **tx)
    .await?;

    info!(name = %method.name, inserted, "Shipping method seeded");
    Ok(inserted)
}

/// Returns true when a new row was inserted.
async fn upsert_payment_method(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    method: &PaymentMethodSeed,
) -> Result<bool, Box<dyn std::error::Error>> {
    let supported_cards: Vec<String> = method
        .supported_cards
        .iter()
        .map(|card| card.as_str().to_owned())
        .collect();

    let inserted = sqlx::query_scalar::<_, bool>(
        r"
        INSERT INTO storefront.payment_method (
            name, description, method_type, icon, color, is_active, is_popular,
            processing_fee, processing_fee_percent, min_amount, max_amount,
            supported_cards, features, restrictions, processing_time, security_level
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (name) DO UPDATE SET
            description = EXCLUDED.description,
            method_type = EXCLUDED.method_type,
            icon = EXCLUDED.icon,
            color = EXCLUDED.color,
            is_active = EXCLUDED.is_active,
            is_popular = EXCLUDED.is_popular,
            processing_fee = EXCLUDED.processing_fee,
            processing_fee_percent = EXCLUDED.processing_fee_percent,
            min_amount = EXCLUDED.min_amount,
            max_amount = EXCLUDED.max_amount,
            supported_cards = EXCLUDED.supported_cards,
            features = EXCLUDED.features,
            restrictions = EXCLUDED.restrictions,
            processing_time = EXCLUDED.processing_time,
            security_level = EXCLUDED.security_level
        RETURNING (xmax = 0)
        ",
    )
    .bind(&method.name)
    .bind(&method.description)
    .bind(method.method_type.as_str())
    .bind(&method.icon)
    .bind(&method.color)
    .bind(method.is_active)
    .bind(method.is_popular)
    .bind(method.processing_fee)
    .bind(method.processing_fee_percent)
    .bind(method.min_amount)
    .bind(method.max_amount)
    .bind(&supported_cards)
    .bind(&method.features)
    .bind(&method.restrictions)
    .bind(&method.processing_time)
    .bind(method.security_level.as_str())
    .fetch_one(&mut **tx)
    .await?;

    info!(name = %method.name, inserted, "Payment method seeded");
    Ok(inserted)
}

/// Load sample products, skipping names already in the catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a product is
/// invalid, or a database operation fails.
pub async fn products(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = read_source(file, BUNDLED_PRODUCTS).await?;
    let drafts: Vec<ProductDraft> = serde_yaml::from_str(&content)?;

    let products = drafts
        .iter()
        .enumerate()
        .map(|(i, draft)| draft.validate().map_err(|e| format!("product #{}: {e}", i + 1)))
        .collect::<Result<Vec<_>, _>>()?;
    info!(products = products.len(), "Parsed products");

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);

    let (mut inserted, mut skipped) = (0_usize, 0_usize);
    for product in &products {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.product WHERE name = $1)",
        )
        .bind(&product.name)
        .fetch_one(&pool)
        .await?;

        if exists {
            skipped += 1;
            continue;
        }
        let created = repo.create(product).await?;
        info!(id = %created.id, name = %created.name, "Product seeded");
        inserted += 1;
    }

    info!("Product seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}
