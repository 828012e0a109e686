//! Payment method handlers.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::pricing::{PaymentOption, available_payment_methods};

use super::{ApiQuery, positive_amount};
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub order_amount: Option<String>,
}

/// Payment options for an amount.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptionsResponse {
    pub methods: Vec<PaymentOption>,
    pub order_amount: Decimal,
    pub total_methods: usize,
}

/// List the payment methods that accept an order amount, with their fees.
///
/// GET /api/payment/methods?orderAmount=
///
/// # Errors
///
/// Returns `AppError::BadRequest` when `orderAmount` is missing or not positive.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PaymentQuery>,
) -> Result<Json<PaymentOptionsResponse>> {
    let order_amount = positive_amount(query.order_amount.as_deref(), "Invalid order amount")?;

    let methods = state.catalog().payment_methods(state.pool()).await?;
    let options = available_payment_methods(&methods, order_amount);

    Ok(Json(PaymentOptionsResponse {
        total_methods: options.len(),
        methods: options,
        order_amount,
    }))
}
