//! Cart reducer and checkout wizard working together.

#![allow(clippy::unwrap_used)]

use emporium_core::cart::{CartAction, CartState, require_session};
use emporium_core::checkout::{CheckoutError, CheckoutStep, CheckoutWizard};
use emporium_core::pricing::ShipmentRequest;
use emporium_core::{AddressId, ProductId, UserId};
use emporium_integration_tests::fixtures::{dec, payment_catalog, product, shipping_catalog};

fn filled_cart() -> CartState {
    CartState::new()
        .reduce(CartAction::AddItem(product(1, "iPhone 14 Pro", "999.99", Some(15))))
        .reduce(CartAction::AddItem(product(1, "iPhone 14 Pro", "999.99", Some(15))))
        .reduce(CartAction::AddItem(product(3, "Nike Air Max", "129.99", Some(25))))
}

#[test]
fn test_cart_totals_follow_actions() {
    let cart = filled_cart();
    assert_eq!(cart.total(), dec("2129.97"));
    assert_eq!(cart.item_count(), 3);
    assert!(cart.is_open());

    let cart = cart
        .reduce(CartAction::UpdateQuantity {
            product_id: ProductId::new(1),
            quantity: 0,
        })
        .reduce(CartAction::SetOpen(false));
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.total(), dec("129.99"));
    assert!(!cart.is_open());
}

#[test]
fn test_guest_is_sent_to_login_with_return_path() {
    let err = require_session(None, "/product/3").unwrap_err();
    assert_eq!(err.redirect, "/login?callbackUrl=%2Fproduct%2F3");

    assert_eq!(
        require_session(Some(UserId::new(7)), "/").unwrap(),
        UserId::new(7)
    );
}

#[test]
fn test_full_checkout_with_bank_transfer_discount() {
    let mut cart = filled_cart();
    let shipping = &shipping_catalog()[0];
    let transfer = &payment_catalog()[2];
    let mut wizard = CheckoutWizard::new();

    wizard.select_address(AddressId::new(11));
    assert_eq!(wizard.advance().unwrap(), CheckoutStep::Shipping);

    let quote = shipping
        .quote(&ShipmentRequest::new(cart.total(), None, Some("Istanbul")))
        .unwrap();
    wizard.select_shipping(shipping.id, quote.cost);
    assert_eq!(wizard.advance().unwrap(), CheckoutStep::Summary);
    assert_eq!(wizard.advance().unwrap(), CheckoutStep::Payment);

    let amount = cart.total() + quote.cost;
    assert!(transfer.is_available_for_amount(amount));
    wizard.select_payment(transfer.id, transfer.calculate_fee(amount));

    let confirmation = wizard.complete(&mut cart).unwrap();
    assert_eq!(confirmation.subtotal, dec("2129.97"));
    assert_eq!(confirmation.shipping_cost, dec("0.00"));
    assert_eq!(confirmation.payment_fee, dec("-63.90"));
    assert_eq!(confirmation.total, dec("2066.07"));
    assert_eq!(confirmation.item_count, 3);
    assert!(cart.is_empty());
}

#[test]
fn test_wizard_refuses_to_skip_steps() {
    let mut wizard = CheckoutWizard::new();
    assert_eq!(
        wizard.advance().unwrap_err(),
        CheckoutError::StepIncomplete(CheckoutStep::Address)
    );
    assert_eq!(wizard.back().unwrap_err(), CheckoutError::AtFirstStep);

    let mut cart = filled_cart();
    assert_eq!(
        wizard.complete(&mut cart).unwrap_err(),
        CheckoutError::NotAtFinalStep
    );
    assert_eq!(cart.item_count(), 3);
}

#[test]
fn test_empty_cart_cannot_be_ordered() {
    let mut wizard = CheckoutWizard::new();
    wizard.select_address(AddressId::new(1));
    wizard.advance().unwrap();
    wizard.select_shipping(shipping_catalog()[0].id, dec("29.99"));
    wizard.advance().unwrap();
    wizard.advance().unwrap();
    wizard.select_payment(payment_catalog()[0].id, dec("0.75"));

    let mut cart = CartState::new();
    assert_eq!(
        wizard.complete(&mut cart).unwrap_err(),
        CheckoutError::EmptyCart
    );
}
