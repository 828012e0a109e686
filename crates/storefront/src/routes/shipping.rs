//! Shipping option and quote handlers.

use axum::{Json, extract::State};
use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::ShippingMethodId;
use emporium_core::pricing::{
    AppliedRule, DeliveryEstimate, ShipmentRequest, ShippingMethodType, ShippingOption,
    available_shipping_methods,
};

use super::{ApiJson, ApiQuery, positive_amount};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query for listing shipping options.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuery {
    pub order_value: Option<String>,
    pub weight: Option<String>,
    pub region: Option<String>,
}

/// Shipping options for an order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOptionsResponse {
    pub methods: Vec<ShippingOption>,
    pub order_value: Decimal,
    pub region: String,
    pub total_methods: usize,
}

/// List the shipping methods that can ship an order.
///
/// GET /api/shipping?orderValue=&weight=&region=
///
/// # Errors
///
/// Returns `AppError::BadRequest` when `orderValue` is missing or not positive.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShippingQuery>,
) -> Result<Json<ShippingOptionsResponse>> {
    let order_value = positive_amount(query.order_value.as_deref(), "Invalid order value")?;
    let weight = query
        .weight
        .as_deref()
        .map(|raw| positive_amount(Some(raw), "Invalid weight"))
        .transpose()?;
    let request = ShipmentRequest::new(order_value, weight, query.region.as_deref());

    let methods = state.catalog().shipping_methods(state.pool()).await?;
    let options = available_shipping_methods(&methods, &request, Local::now().naive_local());

    Ok(Json(ShippingOptionsResponse {
        total_methods: options.len(),
        methods: options,
        order_value,
        region: request.region,
    }))
}

/// Body for quoting one method.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub method_id: Option<ShippingMethodId>,
    pub order_value: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub region: Option<String>,
}

/// Inputs and rules behind a quote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub order_value: Decimal,
    pub weight: Decimal,
    pub region: String,
    pub base_price: Decimal,
    pub free_shipping_threshold: Decimal,
    pub applied_rules: Vec<AppliedRule>,
}

/// A single method's cost breakdown.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub method_id: ShippingMethodId,
    pub name: String,
    #[serde(rename = "type")]
    pub method_type: ShippingMethodType,
    pub cost: Decimal,
    pub original_price: Decimal,
    pub is_free: bool,
    pub savings: Decimal,
    pub estimated_delivery: DeliveryEstimate,
    pub calculation: Calculation,
}

/// Quote one shipping method for an order.
///
/// POST /api/shipping/calculate
///
/// # Errors
///
/// Returns `AppError::BadRequest` for missing inputs, an inactive method or a
/// rejected order value, and `AppError::NotFound` for an unknown method.
#[instrument(skip(state))]
pub async fn calculate(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CalculateRequest>,
) -> Result<Json<CalculateResponse>> {
    let (Some(method_id), Some(order_value)) = (body.method_id, body.order_value) else {
        return Err(AppError::BadRequest(
            "Method ID and order value are required".to_owned(),
        ));
    };
    if order_value.is_zero() {
        return Err(AppError::BadRequest(
            "Method ID and order value are required".to_owned(),
        ));
    }

    let methods = state.catalog().shipping_methods(state.pool()).await?;
    let method = methods
        .iter()
        .find(|m| m.id == method_id)
        .ok_or_else(|| AppError::NotFound("Shipping method not found".to_owned()))?;

    let request = ShipmentRequest::new(order_value, body.weight, body.region.as_deref());
    let quote = method.quote(&request)?;
    let estimated_delivery = method.estimated_delivery(&request.region, Local::now().naive_local());

    Ok(Json(CalculateResponse {
        method_id: method.id,
        name: method.name.clone(),
        method_type: method.method_type,
        cost: quote.cost,
        original_price: quote.original_price,
        is_free: quote.is_free,
        savings: quote.savings,
        estimated_delivery,
        calculation: Calculation {
            order_value,
            weight: request.weight,
            region: request.region,
            base_price: method.base_price,
            free_shipping_threshold: method.free_shipping_threshold,
            applied_rules: quote.applied_rules,
        },
    }))
}
