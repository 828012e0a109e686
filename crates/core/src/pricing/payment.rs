//! Payment method fees and availability.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{PaymentMethodId, round_cents};

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethodType {
    CreditCard,
    CashOnDelivery,
    BankTransfer,
    DigitalWallet,
}

impl PaymentMethodType {
    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::CashOnDelivery => "cash-on-delivery",
            Self::BankTransfer => "bank-transfer",
            Self::DigitalWallet => "digital-wallet",
        }
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit-card" => Ok(Self::CreditCard),
            "cash-on-delivery" => Ok(Self::CashOnDelivery),
            "bank-transfer" => Ok(Self::BankTransfer),
            "digital-wallet" => Ok(Self::DigitalWallet),
            other => Err(format!("unknown payment method type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Low,
    Medium,
    High,
}

impl SecurityLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown security level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    AmericanExpress,
    Discover,
    Troy,
}

impl CardBrand {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::AmericanExpress => "american-express",
            Self::Discover => "discover",
            Self::Troy => "troy",
        }
    }
}

impl FromStr for CardBrand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visa" => Ok(Self::Visa),
            "mastercard" => Ok(Self::Mastercard),
            "american-express" => Ok(Self::AmericanExpress),
            "discover" => Ok(Self::Discover),
            "troy" => Ok(Self::Troy),
            other => Err(format!("unknown card brand: {other}")),
        }
    }
}

/// A payment method from the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub icon: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub is_popular: bool,
    /// Flat fee charged on every order.
    pub processing_fee: Decimal,
    /// Percentage of the order amount; negative values are discounts.
    pub processing_fee_percent: Decimal,
    /// Zero means no lower bound.
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub supported_cards: Vec<CardBrand>,
    pub features: Vec<String>,
    pub restrictions: Vec<String>,
    pub processing_time: String,
    pub security_level: SecurityLevel,
}

/// A method offered for an order, with its fee computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOption {
    pub id: PaymentMethodId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub icon: Option<String>,
    pub color: String,
    pub is_popular: bool,
    pub processing_fee: Decimal,
    pub processing_fee_percent: Decimal,
    pub fee: Decimal,
    pub supported_cards: Vec<CardBrand>,
    pub features: Vec<String>,
    pub restrictions: Vec<String>,
    pub processing_time: String,
    pub security_level: SecurityLevel,
}

impl PaymentMethod {
    /// Fee for paying `amount` with this method, rounded to the cent.
    ///
    /// Inactive methods charge nothing. Fees beyond the `Decimal` range
    /// saturate.
    #[must_use]
    pub fn calculate_fee(&self, amount: Decimal) -> Decimal {
        if !self.is_active {
            return round_cents(Decimal::ZERO);
        }

        let percent = amount.saturating_mul(self.processing_fee_percent) / Decimal::ONE_HUNDRED;
        round_cents(self.processing_fee.saturating_add(percent))
    }

    /// Whether the method accepts an order of `amount`.
    #[must_use]
    pub fn is_available_for_amount(&self, amount: Decimal) -> bool {
        if !self.is_active {
            return false;
        }
        if self.min_amount > Decimal::ZERO && amount < self.min_amount {
            return false;
        }
        !self
            .max_amount
            .is_some_and(|max| max > Decimal::ZERO && amount > max)
    }

    fn to_option(&self, amount: Decimal) -> PaymentOption {
        PaymentOption {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            method_type: self.method_type,
            icon: self.icon.clone(),
            color: self.color.clone(),
            is_popular: self.is_popular,
            processing_fee: self.processing_fee,
            processing_fee_percent: self.processing_fee_percent,
            fee: self.calculate_fee(amount),
            supported_cards: self.supported_cards.clone(),
            features: self.features.clone(),
            restrictions: self.restrictions.clone(),
            processing_time: self.processing_time.clone(),
            security_level: self.security_level,
        }
    }
}

/// Methods accepting `amount`, popular ones first, then by name.
#[must_use]
pub fn available_payment_methods(methods: &[PaymentMethod], amount: Decimal) -> Vec<PaymentOption> {
    let mut available: Vec<&PaymentMethod> = methods
        .iter()
        .filter(|m| m.is_available_for_amount(amount))
        .collect();
    available.sort_by(|a, b| b.is_popular.cmp(&a.is_popular).then_with(|| a.name.cmp(&b.name)));

    available
        .into_iter()
        .map(|method| method.to_option(amount))
        .collect()
}
