//! Shipping method rules: cost, delivery estimate and availability.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PricingError;
use crate::types::{ShippingMethodId, round_cents};

/// Delivery speed class of a shipping method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShippingMethodType {
    Standard,
    Fast,
    Express,
    SameDay,
}

impl ShippingMethodType {
    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Fast => "fast",
            Self::Express => "express",
            Self::SameDay => "same-day",
        }
    }
}

impl fmt::Display for ShippingMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "fast" => Ok(Self::Fast),
            "express" => Ok(Self::Express),
            "same-day" => Ok(Self::SameDay),
            other => Err(format!("unknown shipping method type: {other}")),
        }
    }
}

/// Day of the week a method dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monday" => Ok(Self::Monday),
            "tuesday" => Ok(Self::Tuesday),
            "wednesday" => Ok(Self::Wednesday),
            "thursday" => Ok(Self::Thursday),
            "friday" => Ok(Self::Friday),
            "saturday" => Ok(Self::Saturday),
            "sunday" => Ok(Self::Sunday),
            other => Err(format!("unknown weekday: {other}")),
        }
    }
}

const fn default_multiplier() -> Decimal {
    Decimal::ONE
}

/// Regional pricing rule. Matches when the requested region equals the rule's
/// region name or one of its cities, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalRule {
    pub region: String,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default = "default_multiplier")]
    pub price_multiplier: Decimal,
    #[serde(default)]
    pub additional_days: u32,
}

impl RegionalRule {
    /// Whether this rule applies to `region`.
    #[must_use]
    pub fn matches(&self, region: &str) -> bool {
        let wanted = region.to_lowercase();
        self.region.to_lowercase() == wanted
            || self.cities.iter().any(|city| city.to_lowercase() == wanted)
    }
}

/// Weight tier: parcels up to `max_weight` kg pay `additional_price` extra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRule {
    pub max_weight: Decimal,
    #[serde(default)]
    pub additional_price: Decimal,
}

/// Advertised delivery window in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatedDays {
    pub min: u32,
    pub max: u32,
}

/// A shipping method from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub id: ShippingMethodId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: ShippingMethodType,
    pub base_price: Decimal,
    /// Zero disables free shipping.
    pub free_shipping_threshold: Decimal,
    pub estimated_days: EstimatedDays,
    pub regional_pricing: Vec<RegionalRule>,
    pub weight_rules: Vec<WeightRule>,
    pub icon: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub is_popular: bool,
    pub features: Vec<String>,
    pub restrictions: Vec<String>,
    pub available_days: Vec<Weekday>,
    pub cutoff_time: NaiveTime,
    /// Zero means no lower bound.
    pub min_order_value: Decimal,
    pub max_order_value: Option<Decimal>,
}

/// What the customer is shipping and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRequest {
    pub order_value: Decimal,
    /// Parcel weight in kilograms.
    pub weight: Decimal,
    pub region: String,
}

impl ShipmentRequest {
    /// Build a request, falling back to the default weight and region.
    #[must_use]
    pub fn new(order_value: Decimal, weight: Option<Decimal>, region: Option<&str>) -> Self {
        Self {
            order_value,
            weight: weight.unwrap_or_else(super::default_weight),
            region: region
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(super::DEFAULT_REGION)
                .to_owned(),
        }
    }
}

/// A pricing rule that contributed to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppliedRule {
    FreeShipping {
        description: String,
        discount: Decimal,
    },
    RegionalPricing {
        description: String,
        multiplier: Decimal,
    },
    WeightSurcharge {
        description: String,
        surcharge: Decimal,
    },
}

/// Cost of shipping an order with one method, with the rules that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuote {
    pub cost: Decimal,
    pub original_price: Decimal,
    pub is_free: bool,
    pub savings: Decimal,
    pub applied_rules: Vec<AppliedRule>,
}

/// Expected delivery date for a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEstimate {
    pub date: NaiveDate,
    pub formatted: String,
    pub business_days: u32,
}

/// A method offered for an order, priced and dated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    pub id: ShippingMethodId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: ShippingMethodType,
    pub cost: Decimal,
    pub original_price: Decimal,
    pub is_free: bool,
    pub estimated_delivery: DeliveryEstimate,
    pub icon: Option<String>,
    pub color: String,
    pub is_popular: bool,
    pub features: Vec<String>,
    pub savings: Decimal,
}

impl ShippingMethod {
    /// Shipping cost for an order, rounded to the cent.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InactiveMethod`] for a disabled method and
    /// [`PricingError::OrderValueOutOfRange`] when the order value is below
    /// the minimum or above the maximum.
    pub fn calculate_cost(&self, request: &ShipmentRequest) -> Result<Decimal, PricingError> {
        self.quote(request).map(|quote| quote.cost)
    }

    /// Price an order and report which rules were applied.
    ///
    /// A met free-shipping threshold short-circuits the regional and weight
    /// rules, so a free quote lists only the free-shipping rule.
    ///
    /// # Errors
    ///
    /// Same as [`ShippingMethod::calculate_cost`].
    pub fn quote(&self, request: &ShipmentRequest) -> Result<ShippingQuote, PricingError> {
        self.check_order_value(request.order_value)?;

        if self.qualifies_for_free_shipping(request.order_value) {
            return Ok(ShippingQuote {
                cost: round_cents(Decimal::ZERO),
                original_price: self.base_price,
                is_free: true,
                savings: self.base_price,
                applied_rules: vec![AppliedRule::FreeShipping {
                    description: format!(
                        "Free shipping for orders over {}",
                        self.free_shipping_threshold
                    ),
                    discount: self.base_price,
                }],
            });
        }

        let mut applied_rules = Vec::new();
        let mut cost = self.base_price;

        if let Some(rule) = self.regional_rule(&request.region) {
            cost *= rule.price_multiplier;
            if rule.price_multiplier != Decimal::ONE {
                applied_rules.push(AppliedRule::RegionalPricing {
                    description: format!("Regional pricing for {}", request.region),
                    multiplier: rule.price_multiplier,
                });
            }
        }

        if let Some(rule) = self.weight_rule(request.weight) {
            cost += rule.additional_price;
            if rule.additional_price > Decimal::ZERO {
                applied_rules.push(AppliedRule::WeightSurcharge {
                    description: format!("Additional charge for {}kg", request.weight),
                    surcharge: rule.additional_price,
                });
            }
        }

        let cost = round_cents(cost);
        Ok(ShippingQuote {
            cost,
            original_price: self.base_price,
            is_free: cost.is_zero(),
            savings: if cost.is_zero() {
                self.base_price
            } else {
                Decimal::ZERO
            },
            applied_rules,
        })
    }

    /// Expected delivery for `region` when ordering at `now` (store local time).
    ///
    /// Starts from the slowest advertised day count and adds the regional
    /// delay. One more day is added when `now` is past the cutoff, and also
    /// whenever the method lists dispatch weekdays at all, whether or not
    /// today is one of them.
    #[must_use]
    pub fn estimated_delivery(&self, region: &str, now: NaiveDateTime) -> DeliveryEstimate {
        let mut days = self.estimated_days.max;

        if let Some(rule) = self.regional_rule(region) {
            days += rule.additional_days;
        }

        if now.time() > self.cutoff_time || !self.available_days.is_empty() {
            days += 1;
        }

        let date = now
            .date()
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        DeliveryEstimate {
            date,
            formatted: format_delivery_date(date),
            business_days: days,
        }
    }

    /// First regional rule matching `region`.
    #[must_use]
    pub fn regional_rule(&self, region: &str) -> Option<&RegionalRule> {
        self.regional_pricing.iter().find(|rule| rule.matches(region))
    }

    /// Tightest weight tier that still covers `weight`.
    #[must_use]
    pub fn weight_rule(&self, weight: Decimal) -> Option<&WeightRule> {
        self.weight_rules
            .iter()
            .filter(|rule| weight <= rule.max_weight)
            .min_by(|a, b| a.max_weight.cmp(&b.max_weight))
    }

    fn qualifies_for_free_shipping(&self, order_value: Decimal) -> bool {
        self.free_shipping_threshold > Decimal::ZERO && order_value >= self.free_shipping_threshold
    }

    fn check_order_value(&self, order_value: Decimal) -> Result<(), PricingError> {
        if !self.is_active {
            return Err(PricingError::InactiveMethod);
        }

        let below = self.min_order_value > Decimal::ZERO && order_value < self.min_order_value;
        let above = self
            .max_order_value
            .is_some_and(|max| max > Decimal::ZERO && order_value > max);

        if below || above {
            return Err(PricingError::OrderValueOutOfRange {
                order_value,
                minimum: self.min_order_value,
                maximum: self.max_order_value,
            });
        }
        Ok(())
    }

    fn to_option(&self, quote: &ShippingQuote, estimate: DeliveryEstimate) -> ShippingOption {
        ShippingOption {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            method_type: self.method_type,
            cost: quote.cost,
            original_price: quote.original_price,
            is_free: quote.is_free,
            estimated_delivery: estimate,
            icon: self.icon.clone(),
            color: self.color.clone(),
            is_popular: self.is_popular,
            features: self.features.clone(),
            savings: quote.savings,
        }
    }
}

/// Methods that can ship this order, cheapest base price first.
///
/// A method whose rules reject the order is left out rather than reported.
#[must_use]
pub fn available_shipping_methods(
    methods: &[ShippingMethod],
    request: &ShipmentRequest,
    now: NaiveDateTime,
) -> Vec<ShippingOption> {
    let mut active: Vec<&ShippingMethod> = methods.iter().filter(|m| m.is_active).collect();
    active.sort_by(|a, b| a.base_price.cmp(&b.base_price));

    active
        .into_iter()
        .filter_map(|method| {
            let quote = method.quote(request).ok()?;
            let estimate = method.estimated_delivery(&request.region, now);
            Some(method.to_option(&quote, estimate))
        })
        .collect()
}

fn format_delivery_date(date: NaiveDate) -> String {
    format!(
        "{}, {} {}",
        date.format("%A"),
        date.day(),
        date.format("%B %Y")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::new(
            date.parse::<NaiveDate>().unwrap(),
            time.parse::<NaiveTime>().unwrap(),
        )
    }

    fn standard() -> ShippingMethod {
        ShippingMethod {
            id: ShippingMethodId::new(1),
            name: "Standard Delivery".to_owned(),
            description: "Free over 300".to_owned(),
            method_type: ShippingMethodType::Standard,
            base_price: d("29.99"),
            free_shipping_threshold: d("300"),
            estimated_days: EstimatedDays { min: 3, max: 7 },
            regional_pricing: vec![RegionalRule {
                region: "Anadolu".to_owned(),
                cities: vec!["Konya".to_owned(), "Kayseri".to_owned()],
                price_multiplier: d("1.2"),
                additional_days: 1,
            }],
            weight_rules: vec![
                WeightRule {
                    max_weight: d("15"),
                    additional_price: d("15"),
                },
                WeightRule {
                    max_weight: d("5"),
                    additional_price: d("0"),
                },
            ],
            icon: None,
            color: "#10b981".to_owned(),
            is_active: true,
            is_popular: false,
            features: vec![],
            restrictions: vec![],
            available_days: vec![],
            cutoff_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            min_order_value: Decimal::ZERO,
            max_order_value: None,
        }
    }

    #[test]
    fn test_weight_surcharge_without_regional_rule() {
        let request = ShipmentRequest::new(d("250"), Some(d("10")), Some("Istanbul"));
        assert_eq!(standard().calculate_cost(&request).unwrap(), d("44.99"));
    }

    #[test]
    fn test_threshold_met_is_free_regardless_of_weight_and_region() {
        let method = standard();
        for (weight, region) in [("10", "Istanbul"), ("100", "Konya"), ("1", "nowhere")] {
            let request = ShipmentRequest::new(d("300"), Some(d(weight)), Some(region));
            let quote = method.quote(&request).unwrap();
            assert!(quote.cost.is_zero());
            assert!(quote.is_free);
            assert_eq!(quote.savings, d("29.99"));
            assert_eq!(quote.applied_rules.len(), 1);
        }
    }

    #[test]
    fn test_zero_threshold_never_free() {
        let mut method = standard();
        method.free_shipping_threshold = Decimal::ZERO;
        let request = ShipmentRequest::new(d("100000"), Some(d("1")), None);
        assert_eq!(method.calculate_cost(&request).unwrap(), d("29.99"));
    }

    #[test]
    fn test_regional_multiplier_matches_city_case_insensitively() {
        let request = ShipmentRequest::new(d("100"), Some(d("2")), Some("kONYA"));
        let quote = standard().quote(&request).unwrap();
        // 29.99 * 1.2 = 35.988
        assert_eq!(quote.cost, d("35.99"));
        assert!(matches!(
            quote.applied_rules.as_slice(),
            [AppliedRule::RegionalPricing { .. }]
        ));
    }

    #[test]
    fn test_weight_above_all_tiers_adds_nothing() {
        let request = ShipmentRequest::new(d("100"), Some(d("40")), None);
        assert_eq!(standard().calculate_cost(&request).unwrap(), d("29.99"));
    }

    #[test]
    fn test_weight_rule_picks_smallest_covering_tier() {
        let method = standard();
        assert_eq!(method.weight_rule(d("5")).unwrap().max_weight, d("5"));
        assert_eq!(method.weight_rule(d("5.01")).unwrap().max_weight, d("15"));
    }

    #[test]
    fn test_inactive_method_rejected() {
        let mut method = standard();
        method.is_active = false;
        let request = ShipmentRequest::new(d("100"), None, None);
        assert_eq!(
            method.calculate_cost(&request),
            Err(PricingError::InactiveMethod)
        );
    }

    #[test]
    fn test_order_value_bounds() {
        let mut method = standard();
        method.min_order_value = d("50");
        method.max_order_value = Some(d("5000"));

        let low = ShipmentRequest::new(d("49.99"), None, None);
        assert!(matches!(
            method.calculate_cost(&low),
            Err(PricingError::OrderValueOutOfRange { .. })
        ));

        let high = ShipmentRequest::new(d("5000.01"), None, None);
        assert!(matches!(
            method.calculate_cost(&high),
            Err(PricingError::OrderValueOutOfRange { .. })
        ));

        let edge = ShipmentRequest::new(d("5000"), None, None);
        assert!(method.calculate_cost(&edge).is_ok());
    }

    #[test]
    fn test_delivery_before_cutoff_without_weekdays() {
        let estimate = standard().estimated_delivery("Istanbul", at("2026-10-19", "10:00:00"));
        assert_eq!(estimate.business_days, 7);
        assert_eq!(estimate.date, "2026-10-26".parse::<NaiveDate>().unwrap());
    }

    #[test]
    fn test_delivery_after_cutoff_and_regional_delay() {
        let estimate = standard().estimated_delivery("Kayseri", at("2026-10-19", "15:00:01"));
        assert_eq!(estimate.business_days, 9);
    }

    #[test]
    fn test_delivery_any_weekday_list_adds_a_day() {
        let mut method = standard();
        method.available_days = vec![Weekday::Monday];
        // Monday morning, before cutoff, and Monday is allowed: still +1.
        let estimate = method.estimated_delivery("Istanbul", at("2026-10-19", "09:00:00"));
        assert_eq!(estimate.business_days, 8);
    }

    #[test]
    fn test_available_methods_skip_failures_and_sort_by_price() {
        let cheap = standard();
        let mut pricey = standard();
        pricey.id = ShippingMethodId::new(2);
        pricey.base_price = d("79.99");
        pricey.max_order_value = Some(d("100"));
        let mut off = standard();
        off.id = ShippingMethodId::new(3);
        off.base_price = d("1");
        off.is_active = false;
        let mut fast = standard();
        fast.id = ShippingMethodId::new(4);
        fast.base_price = d("49.99");

        let methods = vec![pricey, fast, off, cheap];
        let request = ShipmentRequest::new(d("250"), None, None);
        let options = available_shipping_methods(&methods, &request, at("2026-10-19", "08:00:00"));

        let ids: Vec<i32> = options.iter().map(|o| o.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_request_defaults() {
        let request = ShipmentRequest::new(d("10"), None, Some("  "));
        assert_eq!(request.weight, Decimal::ONE);
        assert_eq!(request.region, "Istanbul");
    }
}
