//! Shipping and payment rules evaluated over the bundled catalog.

#![allow(clippy::unwrap_used)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use emporium_core::pricing::{
    AppliedRule, ShipmentRequest, ShippingMethodType, available_payment_methods,
    available_shipping_methods,
};
use emporium_integration_tests::fixtures::{dec, payment_catalog, shipping_catalog};

fn monday_at(hour: u32) -> NaiveDateTime {
    NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
    )
}

// =============================================================================
// Shipping
// =============================================================================

#[test]
fn test_inland_region_heavy_parcel_pays_multiplier_and_surcharge() {
    let standard = &shipping_catalog()[0];
    let request = ShipmentRequest::new(dec("150"), Some(dec("10")), Some("konya"));

    let quote = standard.quote(&request).unwrap();

    // 29.99 x 1.2 + 15 = 50.988
    assert_eq!(quote.cost, dec("50.99"));
    assert!(!quote.is_free);
    assert_eq!(quote.savings, dec("0"));
    assert!(matches!(
        quote.applied_rules.as_slice(),
        [
            AppliedRule::RegionalPricing { .. },
            AppliedRule::WeightSurcharge { .. }
        ]
    ));
}

#[test]
fn test_threshold_makes_shipping_free_and_skips_other_rules() {
    let standard = &shipping_catalog()[0];
    let request = ShipmentRequest::new(dec("300"), Some(dec("25")), Some("Erzurum"));

    let quote = standard.quote(&request).unwrap();

    assert!(quote.is_free);
    assert_eq!(quote.cost, dec("0.00"));
    assert_eq!(quote.savings, dec("29.99"));
    assert_eq!(quote.applied_rules.len(), 1);
}

#[test]
fn test_unknown_region_and_oversized_parcel_pay_base_price() {
    let standard = &shipping_catalog()[0];
    let request = ShipmentRequest::new(dec("100"), Some(dec("40")), Some("Trabzon"));

    assert_eq!(standard.calculate_cost(&request).unwrap(), dec("29.99"));
}

#[test]
fn test_listing_sorted_by_base_price_and_drops_capped_methods() {
    let catalog = shipping_catalog();
    let now = monday_at(10);

    let all = available_shipping_methods(
        &catalog,
        &ShipmentRequest::new(dec("2500"), None, None),
        now,
    );
    let types: Vec<_> = all.iter().map(|o| o.method_type).collect();
    assert_eq!(
        types,
        vec![
            ShippingMethodType::Standard,
            ShippingMethodType::Fast,
            ShippingMethodType::Express,
            ShippingMethodType::SameDay,
        ]
    );
    assert!(all.iter().all(|o| o.is_free));

    // Same-day stops at 3000.
    let big = available_shipping_methods(
        &catalog,
        &ShipmentRequest::new(dec("3500"), None, None),
        now,
    );
    assert_eq!(big.len(), 3);
    assert!(big.iter().all(|o| o.method_type != ShippingMethodType::SameDay));
}

#[test]
fn test_inactive_methods_are_not_offered() {
    let mut catalog = shipping_catalog();
    catalog[1].is_active = false;

    let options = available_shipping_methods(
        &catalog,
        &ShipmentRequest::new(dec("100"), None, None),
        monday_at(10),
    );
    assert_eq!(options.len(), 3);
    assert!(options.iter().all(|o| o.method_type != ShippingMethodType::Fast));
}

#[test]
fn test_delivery_estimate_adds_regional_and_dispatch_days() {
    let standard = &shipping_catalog()[0];

    // 7 days + 1 regional + 1 for listed dispatch days.
    let estimate = standard.estimated_delivery("Konya", monday_at(10));
    assert_eq!(estimate.business_days, 9);
    assert_eq!(estimate.date, NaiveDate::from_ymd_opt(2026, 10, 28).unwrap());
    assert_eq!(estimate.formatted, "Wednesday, 28 October 2026");
}

#[test]
fn test_same_day_after_cutoff_moves_to_tomorrow() {
    let same_day = &shipping_catalog()[3];

    let estimate = same_day.estimated_delivery("Istanbul", monday_at(16));
    assert_eq!(estimate.business_days, 1);
    assert_eq!(estimate.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
}

// =============================================================================
// Payment
// =============================================================================

#[test]
fn test_payment_options_popular_first_then_by_name() {
    let options = available_payment_methods(&payment_catalog(), dec("1000"));

    let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Kapıda Ödeme", "Kredi/Banka Kartı", "Dijital Cüzdan", "Havale/EFT"]
    );

    let fees: Vec<_> = options.iter().map(|o| o.fee).collect();
    assert_eq!(
        fees,
        vec![dec("5.00"), dec("25.00"), dec("15.00"), dec("-30.00")]
    );
}

#[test]
fn test_payment_limits_filter_methods() {
    let catalog = payment_catalog();

    let small = available_payment_methods(&catalog, dec("50"));
    assert!(small.iter().all(|o| o.name != "Havale/EFT"));

    let large = available_payment_methods(&catalog, dec("2500"));
    assert!(large.iter().all(|o| o.name != "Kapıda Ödeme"));
    assert_eq!(large.len(), 3);
}

#[test]
fn test_card_fee_rounds_half_up() {
    let card = &payment_catalog()[0];
    // 2.5% of 99.99 = 2.49975
    assert_eq!(card.calculate_fee(dec("99.99")), dec("2.50"));
}
