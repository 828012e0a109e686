//! Catalog fixtures mirroring the bundled seed data.

use chrono::NaiveTime;
use rust_decimal::Decimal;

use emporium_core::cart::CartProduct;
use emporium_core::pricing::{
    CardBrand, EstimatedDays, PaymentMethod, PaymentMethodType, RegionalRule, SecurityLevel,
    ShippingMethod, ShippingMethodType, Weekday, WeightRule,
};
use emporium_core::{PaymentMethodId, ProductId, ShippingMethodId};

/// Parse a decimal literal.
#[must_use]
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

fn cutoff(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).expect("valid hour")
}

fn region(name: &str, cities: &[&str], multiplier: &str, additional_days: u32) -> RegionalRule {
    RegionalRule {
        region: name.to_owned(),
        cities: cities.iter().map(|c| (*c).to_owned()).collect(),
        price_multiplier: dec(multiplier),
        additional_days,
    }
}

fn weight(max: &str, additional: &str) -> WeightRule {
    WeightRule {
        max_weight: dec(max),
        additional_price: dec(additional),
    }
}

const WEEKDAYS: [Weekday; 5] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
];

fn shipping(
    id: i32,
    name: &str,
    method_type: ShippingMethodType,
    base_price: &str,
    threshold: &str,
    days: (u32, u32),
    cutoff_hour: u32,
) -> ShippingMethod {
    ShippingMethod {
        id: ShippingMethodId::new(id),
        name: name.to_owned(),
        description: String::new(),
        method_type,
        base_price: dec(base_price),
        free_shipping_threshold: dec(threshold),
        estimated_days: EstimatedDays {
            min: days.0,
            max: days.1,
        },
        regional_pricing: Vec::new(),
        weight_rules: Vec::new(),
        icon: None,
        color: "#3b82f6".to_owned(),
        is_active: true,
        is_popular: false,
        features: Vec::new(),
        restrictions: Vec::new(),
        available_days: WEEKDAYS.to_vec(),
        cutoff_time: cutoff(cutoff_hour),
        min_order_value: Decimal::ZERO,
        max_order_value: None,
    }
}

/// The four bundled shipping methods.
#[must_use]
pub fn shipping_catalog() -> Vec<ShippingMethod> {
    let metro = ["Istanbul", "Ankara", "Izmir"];

    let mut standard = shipping(
        1,
        "Standart Teslimat",
        ShippingMethodType::Standard,
        "29.99",
        "300",
        (3, 7),
        15,
    );
    standard.regional_pricing = vec![
        region("Istanbul", &metro, "1", 0),
        region("Anadolu", &["Konya", "Kayseri", "Sivas", "Erzurum"], "1.2", 1),
    ];
    standard.weight_rules = vec![weight("5", "0"), weight("15", "15"), weight("30", "35")];

    let mut fast = shipping(
        2,
        "Hızlı Teslimat",
        ShippingMethodType::Fast,
        "49.99",
        "500",
        (1, 3),
        14,
    );
    fast.is_popular = true;
    fast.regional_pricing = vec![
        region("Istanbul", &metro, "1", 0),
        region("Anadolu", &["Konya", "Kayseri", "Sivas"], "1.3", 1),
    ];
    fast.weight_rules = vec![weight("5", "0"), weight("15", "20"), weight("30", "45")];

    let mut express = shipping(
        3,
        "Ekspres Teslimat",
        ShippingMethodType::Express,
        "79.99",
        "1000",
        (1, 1),
        12,
    );
    express.regional_pricing = vec![region("Istanbul", &metro, "1", 0)];
    express.weight_rules = vec![weight("5", "0"), weight("15", "25")];
    express.max_order_value = Some(dec("5000"));

    let mut same_day = shipping(
        4,
        "Aynı Gün Teslimat",
        ShippingMethodType::SameDay,
        "119.99",
        "2000",
        (0, 0),
        15,
    );
    same_day.regional_pricing = vec![region("Istanbul", &["Istanbul"], "1", 0)];
    same_day.weight_rules = vec![weight("2", "0")];
    same_day.max_order_value = Some(dec("3000"));
    same_day.available_days.push(Weekday::Saturday);

    vec![standard, fast, express, same_day]
}

fn payment(id: i32, name: &str, method_type: PaymentMethodType) -> PaymentMethod {
    PaymentMethod {
        id: PaymentMethodId::new(id),
        name: name.to_owned(),
        description: String::new(),
        method_type,
        icon: None,
        color: "#3b82f6".to_owned(),
        is_active: true,
        is_popular: false,
        processing_fee: Decimal::ZERO,
        processing_fee_percent: Decimal::ZERO,
        min_amount: Decimal::ZERO,
        max_amount: None,
        supported_cards: Vec::new(),
        features: Vec::new(),
        restrictions: Vec::new(),
        processing_time: "Instant".to_owned(),
        security_level: SecurityLevel::High,
    }
}

/// The four bundled payment methods.
#[must_use]
pub fn payment_catalog() -> Vec<PaymentMethod> {
    let mut card = payment(1, "Kredi/Banka Kartı", PaymentMethodType::CreditCard);
    card.is_popular = true;
    card.processing_fee_percent = dec("2.5");
    card.supported_cards = vec![
        CardBrand::Visa,
        CardBrand::Mastercard,
        CardBrand::Troy,
        CardBrand::AmericanExpress,
    ];

    let mut cash = payment(2, "Kapıda Ödeme", PaymentMethodType::CashOnDelivery);
    cash.is_popular = true;
    cash.processing_fee = dec("5.00");
    cash.max_amount = Some(dec("2000"));
    cash.security_level = SecurityLevel::Medium;

    let mut transfer = payment(3, "Havale/EFT", PaymentMethodType::BankTransfer);
    transfer.processing_fee_percent = dec("-3");
    transfer.min_amount = dec("100");

    let mut wallet = payment(4, "Dijital Cüzdan", PaymentMethodType::DigitalWallet);
    wallet.processing_fee_percent = dec("1.5");

    vec![card, cash, transfer, wallet]
}

/// A product ready to add to a cart.
#[must_use]
pub fn product(id: i32, name: &str, price: &str, stock: Option<i32>) -> CartProduct {
    CartProduct {
        product_id: ProductId::new(id),
        name: name.to_owned(),
        price: dec(price),
        category: "Elektronik".to_owned(),
        image: format!("https://picsum.photos/seed/{id}/400/300"),
        stock,
    }
}
