//! Address book records and selector ordering.

use serde::{Deserialize, Serialize};

use super::id::AddressId;
use super::validation::FieldError;

/// Which purpose an address-book entry is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Shipping,
    Billing,
}

impl AddressType {
    /// The wire value, as used in query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "SHIPPING",
            Self::Billing => "BILLING",
        }
    }
}

/// Address fields as entered in the address form.
///
/// Used for create and patch requests against the address book, and for
/// ad hoc addresses that are never saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    pub country_code: String,
}

impl AddressDraft {
    /// Maximum length of any free-text field.
    pub const MAX_FIELD_LENGTH: usize = 120;

    /// Validate the form, returning one error per offending field.
    ///
    /// # Errors
    ///
    /// Returns every field that is blank, too long, or malformed.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("line1", self.line1.as_str()),
            ("city", self.city.as_str()),
            ("postal_code", self.postal_code.as_str()),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "is required"));
            } else if value.len() > Self::MAX_FIELD_LENGTH {
                errors.push(FieldError::new(field, "is too long"));
            }
        }

        if self.country_code.len() != 2
            || !self.country_code.bytes().all(|b| b.is_ascii_uppercase())
        {
            errors.push(FieldError::new(
                "country_code",
                "must be a two-letter ISO country code",
            ));
        }

        if let Some(phone) = &self.phone
            && !phone.is_empty()
            && !phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
        {
            errors.push(FieldError::new("phone", "contains invalid characters"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// An address, either from the remote address book (`id` set) or entered
/// ad hoc during checkout (`id` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub id: Option<AddressId>,
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub region: Option<String>,
    pub postal_code: String,
    pub country_code: String,
}

impl Address {
    /// Build an unsaved address from form input.
    #[must_use]
    pub fn from_draft(draft: AddressDraft) -> Self {
        Self {
            id: None,
            address_type: draft.address_type,
            is_default: draft.is_default,
            first_name: draft.first_name,
            last_name: draft.last_name,
            phone: draft.phone,
            line1: draft.line1,
            line2: draft.line2,
            city: draft.city,
            region: draft.region,
            postal_code: draft.postal_code,
            country_code: draft.country_code,
        }
    }

    /// Full recipient name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Whether two addresses describe the same place and person.
    ///
    /// Identity, tag and default flag are ignored: a billing entry with the
    /// same content as the shipping address is an alias of it.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        fn norm(s: &str) -> String {
            s.trim().to_lowercase()
        }
        fn norm_opt(s: Option<&String>) -> String {
            s.map(|s| norm(s)).unwrap_or_default()
        }

        norm(&self.first_name) == norm(&other.first_name)
            && norm(&self.last_name) == norm(&other.last_name)
            && norm(&self.line1) == norm(&other.line1)
            && norm_opt(self.line2.as_ref()) == norm_opt(other.line2.as_ref())
            && norm(&self.city) == norm(&other.city)
            && norm_opt(self.region.as_ref()) == norm_opt(other.region.as_ref())
            && norm(&self.postal_code) == norm(&other.postal_code)
            && self.country_code.eq_ignore_ascii_case(&other.country_code)
            && norm_opt(self.phone.as_ref()) == norm_opt(other.phone.as_ref())
    }

    /// A copy of this address re-tagged for `address_type`, without identity.
    ///
    /// Used when billing is "same as shipping".
    #[must_use]
    pub fn retagged(&self, address_type: AddressType) -> Self {
        Self {
            id: None,
            address_type,
            is_default: false,
            ..self.clone()
        }
    }

    /// The location used for deliverability checks.
    #[must_use]
    pub fn location(&self) -> ShippingLocation {
        ShippingLocation {
            postal_code: self.postal_code.trim().to_string(),
            city: self.city.trim().to_string(),
            country_code: self.country_code.clone(),
        }
    }
}

/// The part of an address that determines deliverability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShippingLocation {
    pub postal_code: String,
    pub city: String,
    pub country_code: String,
}

/// Order addresses for presentation in a selector for `preferred`.
///
/// Addresses tagged `preferred` come first, then the rest; within each group
/// defaults lead. The sort is stable, so the address book's own order is
/// kept otherwise.
#[must_use]
pub fn order_for_selection(mut addresses: Vec<Address>, preferred: AddressType) -> Vec<Address> {
    addresses.sort_by_key(|a| (a.address_type != preferred, !a.is_default));
    addresses
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn address(id: i64, address_type: AddressType, is_default: bool) -> Address {
        Address {
            id: Some(AddressId::new(id)),
            address_type,
            is_default,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            line1: format!("{id} Analytical Way"),
            line2: None,
            city: "London".to_string(),
            region: None,
            postal_code: "N1 9GU".to_string(),
            country_code: "GB".to_string(),
        }
    }

    fn ids(addresses: &[Address]) -> Vec<i64> {
        addresses.iter().filter_map(|a| a.id).map(|id| id.as_i64()).collect()
    }

    #[test]
    fn test_shipping_selector_order() {
        let a = address(1, AddressType::Shipping, true);
        let b = address(2, AddressType::Shipping, false);
        let c = address(3, AddressType::Billing, true);

        let ordered = order_for_selection(vec![c, b, a], AddressType::Shipping);
        assert_eq!(ids(&ordered), vec![1, 2, 3]);
    }

    #[test]
    fn test_billing_selector_order() {
        let ordered = order_for_selection(
            vec![
                address(1, AddressType::Shipping, true),
                address(2, AddressType::Billing, false),
                address(3, AddressType::Billing, true),
                address(4, AddressType::Shipping, false),
            ],
            AddressType::Billing,
        );
        assert_eq!(ids(&ordered), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_ordering_is_stable_within_groups() {
        let ordered = order_for_selection(
            vec![
                address(5, AddressType::Shipping, false),
                address(6, AddressType::Shipping, false),
                address(7, AddressType::Shipping, false),
            ],
            AddressType::Shipping,
        );
        assert_eq!(ids(&ordered), vec![5, 6, 7]);
    }

    #[test]
    fn test_same_content_ignores_identity_and_tag() {
        let shipping = address(1, AddressType::Shipping, true);
        let mut billing = address(9, AddressType::Billing, false);
        billing.line1 = shipping.line1.to_uppercase();
        assert!(shipping.same_content(&billing));

        billing.postal_code = "EC1A 1BB".to_string();
        assert!(!shipping.same_content(&billing));
    }

    #[test]
    fn test_retagged_drops_identity() {
        let shipping = address(1, AddressType::Shipping, true);
        let billing = shipping.retagged(AddressType::Billing);
        assert_eq!(billing.id, None);
        assert_eq!(billing.address_type, AddressType::Billing);
        assert!(!billing.is_default);
        assert!(billing.same_content(&shipping));
    }

    #[test]
    fn test_draft_validation_reports_each_field() {
        let draft = AddressDraft {
            address_type: AddressType::Shipping,
            is_default: false,
            first_name: " ".to_string(),
            last_name: "Lovelace".to_string(),
            phone: Some("call me".to_string()),
            line1: "12 Analytical Way".to_string(),
            line2: None,
            city: String::new(),
            region: None,
            postal_code: "N1".to_string(),
            country_code: "gb".to_string(),
        };

        let errors = draft.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["first_name", "city", "country_code", "phone"]);
    }
}
