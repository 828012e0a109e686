//! Checkout handler.
//!
//! Drives the [`CheckoutWizard`] through address, shipping, summary and
//! payment in one request, then empties the customer's cart. No order is
//! stored; the response is the confirmation.

use axum::{Json, extract::State};
use chrono::Local;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use emporium_core::cart::CartAction;
use emporium_core::checkout::{CheckoutError, CheckoutWizard, OrderConfirmation};
use emporium_core::pricing::ShipmentRequest;
use emporium_core::{AddressId, PaymentMethodId, ShippingMethodId};

use super::cart::load_cart;
use super::{ApiJson, resolve_user};
use crate::db::{AddressRepository, CartRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Checkout body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_email: Option<String>,
    pub address_id: Option<AddressId>,
    pub shipping_method_id: Option<ShippingMethodId>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub weight: Option<Decimal>,
    /// Shipping region; the address city when absent.
    pub region: Option<String>,
}

/// Requested shipping region, or the address city when none is given.
fn shipping_region(requested: Option<&str>, city: &str) -> String {
    requested
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .unwrap_or(city)
        .to_owned()
}

/// Place an order from the saved cart.
///
/// POST /api/checkout
///
/// # Errors
///
/// Returns 400 when a step has no selection, the cart is empty or changed
/// meanwhile, or a method rejects the order, and 404 for an unknown address
/// or method.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<Json<OrderConfirmation>> {
    let user = resolve_user(&state, body.user_email.as_deref()).await?;
    let mut cart = load_cart(&state, user.id).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }
    let before = cart.items().to_vec();
    let mut wizard = CheckoutWizard::new();

    // Address
    if let Some(address_id) = body.address_id {
        let address = AddressRepository::new(state.pool())
            .get(user.id, address_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Address not found".to_owned()))?;
        wizard.select_address(address.id);

        let region = shipping_region(body.region.as_deref(), &address.fields.city);
        wizard.advance()?;

        // Shipping
        if let Some(method_id) = body.shipping_method_id {
            let methods = state.catalog().shipping_methods(state.pool()).await?;
            let method = methods
                .iter()
                .find(|m| m.id == method_id)
                .ok_or_else(|| AppError::NotFound("Shipping method not found".to_owned()))?;

            let request = ShipmentRequest::new(cart.total(), body.weight, Some(region.as_str()));
            let quote = method.quote(&request)?;
            let eta = method.estimated_delivery(&request.region, Local::now().naive_local());
            info!(method = %method.name, cost = %quote.cost, eta = %eta.date, "Shipping selected");
            wizard.select_shipping(method.id, quote.cost);
        }
    }
    wizard.advance()?;
    // Summary always passes.
    wizard.advance()?;

    // Payment
    if let (Some(method_id), Some(shipping)) = (body.payment_method_id, wizard.selections().shipping)
    {
        let methods = state.catalog().payment_methods(state.pool()).await?;
        let method = methods
            .iter()
            .find(|m| m.id == method_id)
            .ok_or_else(|| AppError::NotFound("Payment method not found".to_owned()))?;

        let amount = cart.total() + shipping.cost;
        if !method.is_available_for_amount(amount) {
            return Err(AppError::BadRequest(
                "Payment method is not available for this order".to_owned(),
            ));
        }
        wizard.select_payment(method.id, method.calculate_fee(amount));
    }

    let confirmation = wizard.complete(&mut cart)?;
    CartRepository::new(state.pool())
        .update(user.id, |saved| {
            if saved.items() != before.as_slice() {
                return Err(AppError::BadRequest(
                    "Cart changed during checkout, please review it".to_owned(),
                ));
            }
            Ok(saved.reduce(CartAction::Clear))
        })
        .await?;

    info!(reference = %confirmation.reference, total = %confirmation.total, "Order placed");
    Ok(Json(confirmation))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_region_falls_back_to_city() {
        assert_eq!(shipping_region(Some("Anadolu"), "Konya"), "Anadolu");
        assert_eq!(shipping_region(None, "Konya"), "Konya");
        assert_eq!(shipping_region(Some(""), "Konya"), "Konya");
        assert_eq!(shipping_region(Some("   "), "Konya"), "Konya");
    }

    #[test]
    fn test_request_fields_are_optional() {
        let body: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "userEmail": "ayse@example.com"
        }))
        .unwrap();

        assert!(body.address_id.is_none());
        assert!(body.shipping_method_id.is_none());
        assert!(body.weight.is_none());
    }

    #[test]
    fn test_request_reads_camel_case_ids() {
        let body: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "userEmail": "ayse@example.com",
            "addressId": 3,
            "shippingMethodId": 1,
            "paymentMethodId": 2,
            "weight": "2.5",
            "region": "Konya"
        }))
        .unwrap();

        assert_eq!(body.address_id, Some(AddressId::new(3)));
        assert_eq!(body.shipping_method_id, Some(ShippingMethodId::new(1)));
        assert_eq!(body.payment_method_id, Some(PaymentMethodId::new(2)));
        assert_eq!(body.weight, Some(Decimal::new(25, 1)));
        assert_eq!(body.region.as_deref(), Some("Konya"));
    }
}
