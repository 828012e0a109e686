//! Four-step checkout wizard.
//!
//! ```text
//! Address -> Shipping -> Summary -> Payment -> complete()
//! ```
//!
//! Moving forward requires the current step to be complete; moving back is
//! always allowed except from the first step. [`CheckoutWizard::complete`]
//! empties the cart and hands back an [`OrderConfirmation`]. No order is
//! stored.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::cart::{CartAction, CartState};
use crate::types::{AddressId, PaymentMethodId, ShippingMethodId, round_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Address,
    Shipping,
    Summary,
    Payment,
}

impl CheckoutStep {
    /// 1-based position shown in the progress bar.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Address => 1,
            Self::Shipping => 2,
            Self::Summary => 3,
            Self::Payment => 4,
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Address => Some(Self::Shipping),
            Self::Shipping => Some(Self::Summary),
            Self::Summary => Some(Self::Payment),
            Self::Payment => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Address => None,
            Self::Shipping => Some(Self::Address),
            Self::Summary => Some(Self::Shipping),
            Self::Payment => Some(Self::Summary),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Complete the {} step first", .0.label())]
    StepIncomplete(CheckoutStep),

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Orders can only be placed from the payment step")]
    NotAtFinalStep,

    #[error("Your cart is empty")]
    EmptyCart,
}

impl CheckoutStep {
    const fn label(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Shipping => "shipping",
            Self::Summary => "summary",
            Self::Payment => "payment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSelection {
    pub method_id: ShippingMethodId,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSelection {
    pub method_id: PaymentMethodId,
    pub fee: Decimal,
}

/// What the customer has picked so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSelections {
    pub address_id: Option<AddressId>,
    pub shipping: Option<ShippingSelection>,
    pub payment: Option<PaymentSelection>,
}

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub reference: Uuid,
    pub address_id: AddressId,
    pub shipping_method_id: ShippingMethodId,
    pub payment_method_id: PaymentMethodId,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub payment_fee: Decimal,
    pub total: Decimal,
    pub item_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    selections: CheckoutSelections,
}

impl Default for CheckoutWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutWizard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            step: CheckoutStep::Address,
            selections: CheckoutSelections {
                address_id: None,
                shipping: None,
                payment: None,
            },
        }
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn selections(&self) -> &CheckoutSelections {
        &self.selections
    }

    pub fn select_address(&mut self, address_id: AddressId) {
        self.selections.address_id = Some(address_id);
    }

    pub fn select_shipping(&mut self, method_id: ShippingMethodId, cost: Decimal) {
        self.selections.shipping = Some(ShippingSelection { method_id, cost });
    }

    pub fn select_payment(&mut self, method_id: PaymentMethodId, fee: Decimal) {
        self.selections.payment = Some(PaymentSelection { method_id, fee });
    }

    /// Whether the current step has what it needs.
    #[must_use]
    pub const fn can_proceed(&self) -> bool {
        match self.step {
            CheckoutStep::Address => self.selections.address_id.is_some(),
            CheckoutStep::Shipping => self.selections.shipping.is_some(),
            CheckoutStep::Summary => true,
            CheckoutStep::Payment => self.selections.payment.is_some(),
        }
    }

    /// Move to the next step. On the payment step this only checks that a
    /// method was picked; use [`CheckoutWizard::complete`] to finish.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::StepIncomplete`] when the current step is not done.
    pub fn advance(&mut self) -> Result<CheckoutStep, CheckoutError> {
        if !self.can_proceed() {
            return Err(CheckoutError::StepIncomplete(self.step));
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Move to the previous step.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::AtFirstStep`] on the address step.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let previous = self.step.previous().ok_or(CheckoutError::AtFirstStep)?;
        self.step = previous;
        Ok(previous)
    }

    /// Place the order: empty `cart` and return the confirmation.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::NotAtFinalStep`] before the payment step,
    /// [`CheckoutError::StepIncomplete`] without a payment method, and
    /// [`CheckoutError::EmptyCart`] when there is nothing to buy. The cart is
    /// untouched on error.
    pub fn complete(&self, cart: &mut CartState) -> Result<OrderConfirmation, CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::NotAtFinalStep);
        }
        let (Some(address_id), Some(shipping), Some(payment)) = (
            self.selections.address_id,
            self.selections.shipping,
            self.selections.payment,
        ) else {
            return Err(CheckoutError::StepIncomplete(self.step));
        };
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let subtotal = round_cents(cart.total());
        let confirmation = OrderConfirmation {
            reference: Uuid::new_v4(),
            address_id,
            shipping_method_id: shipping.method_id,
            payment_method_id: payment.method_id,
            subtotal,
            shipping_cost: shipping.cost,
            payment_fee: payment.fee,
            total: round_cents(subtotal + shipping.cost + payment.fee),
            item_count: cart.item_count(),
        };

        cart.apply(CartAction::Clear);
        Ok(confirmation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartProduct;
    use crate::types::ProductId;

    fn cart() -> CartState {
        CartState::new()
            .reduce(CartAction::AddItem(CartProduct {
                product_id: ProductId::new(1),
                name: "Lamp".to_owned(),
                price: Decimal::new(100, 0),
                category: "Home".to_owned(),
                image: String::new(),
                stock: None,
            }))
            .reduce(CartAction::UpdateQuantity {
                product_id: ProductId::new(1),
                quantity: 2,
            })
    }

    fn at_payment() -> CheckoutWizard {
        let mut wizard = CheckoutWizard::new();
        wizard.select_address(AddressId::new(7));
        wizard.advance().unwrap();
        wizard.select_shipping(ShippingMethodId::new(1), Decimal::new(2999, 2));
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        wizard
    }

    #[test]
    fn test_forward_is_gated() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(
            wizard.advance(),
            Err(CheckoutError::StepIncomplete(CheckoutStep::Address))
        );
        wizard.select_address(AddressId::new(1));
        assert_eq!(wizard.advance(), Ok(CheckoutStep::Shipping));
        assert_eq!(
            wizard.advance(),
            Err(CheckoutError::StepIncomplete(CheckoutStep::Shipping))
        );
    }

    #[test]
    fn test_summary_always_proceeds() {
        let wizard = at_payment();
        assert_eq!(wizard.step(), CheckoutStep::Payment);
    }

    #[test]
    fn test_back() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(wizard.back(), Err(CheckoutError::AtFirstStep));

        let mut wizard = at_payment();
        assert_eq!(wizard.back(), Ok(CheckoutStep::Summary));
        assert_eq!(wizard.back(), Ok(CheckoutStep::Shipping));
        // Selections survive going back.
        assert!(wizard.can_proceed());
    }

    #[test]
    fn test_complete_requires_payment_step() {
        let wizard = CheckoutWizard::new();
        let mut cart = cart();
        assert_eq!(
            wizard.complete(&mut cart),
            Err(CheckoutError::NotAtFinalStep)
        );
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_complete_requires_payment_method() {
        let wizard = at_payment();
        let mut cart = cart();
        assert_eq!(
            wizard.complete(&mut cart),
            Err(CheckoutError::StepIncomplete(CheckoutStep::Payment))
        );
    }

    #[test]
    fn test_complete_empty_cart() {
        let mut wizard = at_payment();
        wizard.select_payment(PaymentMethodId::new(1), Decimal::ZERO);
        let mut cart = CartState::new();
        assert_eq!(wizard.complete(&mut cart), Err(CheckoutError::EmptyCart));
    }

    #[test]
    fn test_complete_clears_cart_and_totals() {
        let mut wizard = at_payment();
        wizard.select_payment(PaymentMethodId::new(3), Decimal::new(500, 2));
        let mut cart = cart();

        let confirmation = wizard.complete(&mut cart).unwrap();
        assert_eq!(confirmation.subtotal, Decimal::new(200, 0));
        assert_eq!(confirmation.total, Decimal::new(23499, 2));
        assert_eq!(confirmation.item_count, 2);
        assert_eq!(confirmation.address_id, AddressId::new(7));
        assert!(cart.is_empty());
    }
}
