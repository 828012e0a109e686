//! Pricing rules for shipping and payment methods.
//!
//! Shipping and payment methods are small static catalogs. Each method
//! carries its own rule set; the functions here evaluate those rules for a
//! given order without touching storage.
//!
//! # Shipping
//!
//! 1. Inactive methods and order values outside `[min, max]` are rejected.
//! 2. An order at or above a positive free-shipping threshold ships for free.
//! 3. Otherwise: base price x regional multiplier + weight-tier surcharge.
//!
//! # Payment
//!
//! A flat fee plus a percentage of the order amount. A negative percentage
//! is a discount (bank transfer incentive).

pub mod payment;
pub mod shipping;

use rust_decimal::Decimal;
use thiserror::Error;

pub use payment::{
    CardBrand, PaymentMethod, PaymentMethodType, PaymentOption, SecurityLevel,
    available_payment_methods,
};
pub use shipping::{
    AppliedRule, DeliveryEstimate, EstimatedDays, RegionalRule, ShipmentRequest, ShippingMethod,
    ShippingMethodType, ShippingOption, ShippingQuote, WeightRule, Weekday,
    available_shipping_methods,
};

/// Region assumed when the caller does not name one.
pub const DEFAULT_REGION: &str = "Istanbul";

/// Parcel weight in kilograms assumed when the caller does not give one.
#[must_use]
pub const fn default_weight() -> Decimal {
    Decimal::ONE
}

/// Errors raised while evaluating a shipping method for an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The method has been switched off.
    #[error("Shipping method is not active")]
    InactiveMethod,

    /// The order value falls outside the method's accepted range.
    #[error("{}", describe_range(.order_value, .minimum, .maximum))]
    OrderValueOutOfRange {
        order_value: Decimal,
        minimum: Decimal,
        maximum: Option<Decimal>,
    },
}

fn describe_range(order_value: &Decimal, minimum: &Decimal, maximum: &Option<Decimal>) -> String {
    match maximum {
        Some(max) if order_value > max => format!("Maximum order value is {max}"),
        _ => format!("Minimum order value is {minimum}"),
    }
}
