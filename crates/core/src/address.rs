//! Postal addresses and the one-default-per-scope rule.
//!
//! A customer may keep several addresses. Within every overlapping type scope
//! (see [`AddressType::overlaps`]) at most one active address is the default.
//! The planner functions below work on [`AddressSnapshot`]s of a customer's
//! active addresses and say which rows to demote or promote; storage applies
//! the plan inside a single per-customer transaction.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::AddressId;

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{5}$").expect("Invalid regex"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-\s()]{10,15}$").expect("Invalid regex"));

/// Country used when none is supplied.
pub const DEFAULT_COUNTRY: &str = "Turkey";

const NAME_MAX: usize = 50;
const COMPANY_MAX: usize = 100;
const LINE_MAX: usize = 200;

/// What an address may be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Shipping,
    Billing,
    #[default]
    Both,
}

impl AddressType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Billing => "billing",
            Self::Both => "both",
        }
    }

    /// Whether two addresses compete for the same default slot.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self == other || self == Self::Both || other == Self::Both
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipping" => Ok(Self::Shipping),
            "billing" => Ok(Self::Billing),
            "both" => Ok(Self::Both),
            other => Err(AddressError::InvalidType(other.to_owned())),
        }
    }
}

/// Address validation failures. Messages are shown to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Postal code must be 5 digits")]
    InvalidPostalCode,

    #[error("Invalid phone number format")]
    InvalidPhone,

    #[error("Invalid address type: {0}")]
    InvalidType(String),
}

/// Validated, trimmed address contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    #[serde(rename = "type")]
    pub address_type: AddressType,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl AddressFields {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Non-empty address parts joined by ", ".
    #[must_use]
    pub fn formatted(&self) -> String {
        [
            &self.address_line1,
            &self.address_line2,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Address as submitted for creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl NewAddress {
    /// Trim and check every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`AddressError`] found, checking required fields in
    /// form order before formats.
    pub fn validate(&self) -> Result<AddressFields, AddressError> {
        let title = required(self.title.as_deref(), "title")?;
        let first_name = required(self.first_name.as_deref(), "firstName")?;
        let last_name = required(self.last_name.as_deref(), "lastName")?;
        let phone = required(self.phone.as_deref(), "phone")?;
        let address_line1 = required(self.address_line1.as_deref(), "addressLine1")?;
        let city = required(self.city.as_deref(), "city")?;
        let state = required(self.state.as_deref(), "state")?;
        let postal_code = required(self.postal_code.as_deref(), "postalCode")?;

        let country = self
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
            .to_owned();

        let fields = AddressFields {
            address_type: self.address_type.unwrap_or_default(),
            title,
            first_name,
            last_name,
            company: optional(self.company.as_deref()),
            phone,
            address_line1,
            address_line2: optional(self.address_line2.as_deref()),
            city,
            state,
            postal_code,
            country,
        };
        check_fields(&fields)?;
        Ok(fields)
    }
}

/// Partial update. `None` keeps the stored value; so does a blank value for a
/// required field. Optional fields (company, second line) may be cleared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

impl AddressPatch {
    /// Check the formats of the fields that are present, before the stored
    /// address is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidPostalCode`] or
    /// [`AddressError::InvalidPhone`].
    pub fn validate(&self) -> Result<(), AddressError> {
        if let Some(code) = self.postal_code.as_deref().map(str::trim)
            && !code.is_empty()
            && !POSTAL_CODE.is_match(code)
        {
            return Err(AddressError::InvalidPostalCode);
        }
        if let Some(phone) = self.phone.as_deref().map(str::trim)
            && !phone.is_empty()
            && !PHONE.is_match(phone)
        {
            return Err(AddressError::InvalidPhone);
        }
        Ok(())
    }

    /// Produce the updated contents of `current`.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] when a provided field is malformed or too
    /// long.
    pub fn apply(&self, current: &AddressFields) -> Result<AddressFields, AddressError> {
        let mut next = current.clone();

        if let Some(kind) = self.address_type {
            next.address_type = kind;
        }
        overwrite(&mut next.title, self.title.as_deref());
        overwrite(&mut next.first_name, self.first_name.as_deref());
        overwrite(&mut next.last_name, self.last_name.as_deref());
        overwrite(&mut next.phone, self.phone.as_deref());
        overwrite(&mut next.address_line1, self.address_line1.as_deref());
        overwrite(&mut next.city, self.city.as_deref());
        overwrite(&mut next.state, self.state.as_deref());
        overwrite(&mut next.postal_code, self.postal_code.as_deref());
        overwrite(&mut next.country, self.country.as_deref());
        if let Some(company) = &self.company {
            next.company = company.trim().to_owned();
        }
        if let Some(line2) = &self.address_line2 {
            next.address_line2 = line2.trim().to_owned();
        }

        check_fields(&next)?;
        Ok(next)
    }
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, AddressError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(AddressError::Required(field))
}

fn optional(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_owned()
}

fn overwrite(slot: &mut String, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        v.clone_into(slot);
    }
}

fn check_len(value: &str, field: &'static str, max: usize) -> Result<(), AddressError> {
    if value.chars().count() > max {
        return Err(AddressError::TooLong { field, max });
    }
    Ok(())
}

fn check_fields(fields: &AddressFields) -> Result<(), AddressError> {
    if !POSTAL_CODE.is_match(&fields.postal_code) {
        return Err(AddressError::InvalidPostalCode);
    }
    if !PHONE.is_match(&fields.phone) {
        return Err(AddressError::InvalidPhone);
    }

    check_len(&fields.title, "title", NAME_MAX)?;
    check_len(&fields.first_name, "firstName", NAME_MAX)?;
    check_len(&fields.last_name, "lastName", NAME_MAX)?;
    check_len(&fields.company, "company", COMPANY_MAX)?;
    check_len(&fields.address_line1, "addressLine1", LINE_MAX)?;
    check_len(&fields.address_line2, "addressLine2", LINE_MAX)?;
    check_len(&fields.city, "city", NAME_MAX)?;
    check_len(&fields.state, "state", NAME_MAX)?;
    check_len(&fields.country, "country", NAME_MAX)
}

/// The parts of an active address the default planner needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSnapshot {
    pub id: AddressId,
    pub address_type: AddressType,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Default flag changes to write alongside an address mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultPlan {
    pub promote: Option<AddressId>,
    pub demote: Vec<AddressId>,
}

/// Whether a newly created address becomes the default.
///
/// The first active address always does.
#[must_use]
pub const fn default_for_new(requested: bool, active_count: usize) -> bool {
    requested || active_count == 0
}

/// Defaults to clear when `target` (of `kind`) becomes the default.
#[must_use]
pub fn demotions_for(
    target: AddressId,
    kind: AddressType,
    active: &[AddressSnapshot],
) -> Vec<AddressId> {
    active
        .iter()
        .filter(|a| a.id != target && a.is_default && a.address_type.overlaps(kind))
        .map(|a| a.id)
        .collect()
}

/// What to promote after `deleted` is soft-deleted.
///
/// Only a default address hands its flag on, to the newest remaining active
/// address. The promoted address then clears any other default in its scope.
#[must_use]
pub fn promotion_after_delete(deleted: &AddressSnapshot, active: &[AddressSnapshot]) -> DefaultPlan {
    if !deleted.is_default {
        return DefaultPlan::default();
    }

    let remaining: Vec<AddressSnapshot> = active
        .iter()
        .filter(|a| a.id != deleted.id)
        .copied()
        .collect();

    let Some(next) = remaining
        .iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
    else {
        return DefaultPlan::default();
    };

    DefaultPlan {
        promote: Some(next.id),
        demote: demotions_for(next.id, next.address_type, &remaining),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn form() -> NewAddress {
        NewAddress {
            address_type: None,
            title: Some(" Home ".to_owned()),
            first_name: Some("Ayse".to_owned()),
            last_name: Some("Yilmaz".to_owned()),
            company: None,
            phone: Some("(0555) 123-4567".to_owned()),
            address_line1: Some("Bagdat Cad. 12".to_owned()),
            address_line2: Some("  ".to_owned()),
            city: Some("Istanbul".to_owned()),
            state: Some("Kadikoy".to_owned()),
            postal_code: Some("34710".to_owned()),
            country: None,
            is_default: false,
        }
    }

    fn snap(id: i32, kind: AddressType, is_default: bool, minute: u32) -> AddressSnapshot {
        AddressSnapshot {
            id: AddressId::new(id),
            address_type: kind,
            is_default,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_validate_trims_and_defaults() {
        let fields = form().validate().unwrap();
        assert_eq!(fields.title, "Home");
        assert_eq!(fields.address_type, AddressType::Both);
        assert_eq!(fields.country, "Turkey");
        assert_eq!(fields.address_line2, "");
        assert_eq!(fields.full_name(), "Ayse Yilmaz");
        assert_eq!(
            fields.formatted(),
            "Bagdat Cad. 12, Istanbul, Kadikoy, 34710, Turkey"
        );
    }

    #[test]
    fn test_validate_required_fields() {
        let mut missing = form();
        missing.city = Some("   ".to_owned());
        assert_eq!(
            missing.validate().unwrap_err(),
            AddressError::Required("city")
        );
    }

    #[test]
    fn test_validate_postal_code() {
        for bad in ["3471", "347100", "34a10"] {
            let mut f = form();
            f.postal_code = Some(bad.to_owned());
            assert_eq!(f.validate().unwrap_err(), AddressError::InvalidPostalCode);
        }
    }

    #[test]
    fn test_validate_phone() {
        for bad in ["555-1234", "+90 555 123 4567 89", "0555abc1234"] {
            let mut f = form();
            f.phone = Some(bad.to_owned());
            assert_eq!(f.validate().unwrap_err(), AddressError::InvalidPhone);
        }
        let mut ok = form();
        ok.phone = Some("05551234567".to_owned());
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_length_caps() {
        let mut f = form();
        f.address_line1 = Some("x".repeat(201));
        assert_eq!(
            f.validate().unwrap_err(),
            AddressError::TooLong {
                field: "addressLine1",
                max: 200
            }
        );
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let current = form().validate().unwrap();
        let patch = AddressPatch {
            city: Some("Ankara".to_owned()),
            title: Some(String::new()),
            company: Some(" Acme ".to_owned()),
            ..AddressPatch::default()
        };
        let next = patch.apply(&current).unwrap();
        assert_eq!(next.city, "Ankara");
        assert_eq!(next.title, "Home");
        assert_eq!(next.company, "Acme");
        assert_eq!(next.postal_code, current.postal_code);
    }

    #[test]
    fn test_patch_validates_provided_fields() {
        let current = form().validate().unwrap();
        let patch = AddressPatch {
            postal_code: Some("1234".to_owned()),
            ..AddressPatch::default()
        };
        assert_eq!(patch.validate(), Err(AddressError::InvalidPostalCode));
        assert_eq!(
            patch.apply(&current).unwrap_err(),
            AddressError::InvalidPostalCode
        );
    }

    #[test]
    fn test_overlap_scopes() {
        use AddressType::{Billing, Both, Shipping};
        assert!(Shipping.overlaps(Shipping));
        assert!(Shipping.overlaps(Both));
        assert!(Both.overlaps(Billing));
        assert!(!Shipping.overlaps(Billing));
    }

    #[test]
    fn test_first_address_becomes_default() {
        assert!(default_for_new(false, 0));
        assert!(!default_for_new(false, 2));
        assert!(default_for_new(true, 2));
    }

    #[test]
    fn test_setting_default_leaves_exactly_one() {
        let active = vec![
            snap(1, AddressType::Shipping, true, 0),
            snap(2, AddressType::Billing, true, 1),
            snap(3, AddressType::Shipping, false, 2),
        ];
        let demote = demotions_for(AddressId::new(3), AddressType::Shipping, &active);
        assert_eq!(demote, vec![AddressId::new(1)]);

        let demote = demotions_for(AddressId::new(3), AddressType::Both, &active);
        assert_eq!(demote, vec![AddressId::new(1), AddressId::new(2)]);
    }

    #[test]
    fn test_deleting_default_promotes_newest() {
        let active = vec![
            snap(1, AddressType::Both, true, 0),
            snap(2, AddressType::Both, false, 5),
            snap(3, AddressType::Both, false, 3),
        ];
        let plan = promotion_after_delete(&active[0], &active);
        assert_eq!(plan.promote, Some(AddressId::new(2)));
        assert!(plan.demote.is_empty());
    }

    #[test]
    fn test_promotion_clears_overlapping_default() {
        let active = vec![
            snap(1, AddressType::Shipping, true, 0),
            snap(2, AddressType::Billing, true, 1),
            snap(3, AddressType::Both, false, 9),
        ];
        let plan = promotion_after_delete(&active[0], &active);
        assert_eq!(plan.promote, Some(AddressId::new(3)));
        assert_eq!(plan.demote, vec![AddressId::new(2)]);
    }

    #[test]
    fn test_deleting_non_default_changes_nothing() {
        let active = vec![
            snap(1, AddressType::Both, true, 0),
            snap(2, AddressType::Both, false, 5),
        ];
        assert_eq!(
            promotion_after_delete(&active[1], &active),
            DefaultPlan::default()
        );
    }

    #[test]
    fn test_deleting_last_address_promotes_nothing() {
        let active = vec![snap(1, AddressType::Both, true, 0)];
        assert_eq!(promotion_after_delete(&active[0], &active).promote, None);
    }
}
