//! Sub-records captured by the individual checkout steps.

use chrono::NaiveDate;
use orchard_core::{Address, Email, FieldError, FulfillmentMethod, StoreId};
use serde::{Deserialize, Serialize};

/// Longest accepted delivery instruction.
pub const MAX_INSTRUCTIONS_LENGTH: usize = 500;

/// Who is checking out.
///
/// Set once when the account step completes; re-identifying replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutUser {
    pub email: Email,
    pub name: String,
    pub is_guest: bool,
}

/// Person receiving a home delivery, when different from the addressee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDetails {
    pub name: String,
    pub phone: String,
}

impl RecipientDetails {
    /// # Errors
    ///
    /// Returns one error per blank field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "is required"));
        }
        if self.phone.trim().is_empty() {
            errors.push(FieldError::new("phone", "is required"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Delivery window offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

/// Optional delivery preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPreferences {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time_slot: Option<TimeSlot>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub shipping_method: Option<String>,
}

impl DeliveryPreferences {
    /// Validate against `today`.
    ///
    /// # Errors
    ///
    /// Returns an error for a date in the past or overlong instructions.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.date.is_some_and(|date| date < today) {
            errors.push(FieldError::new("date", "cannot be in the past"));
        }
        if self
            .instructions
            .as_ref()
            .is_some_and(|i| i.chars().count() > MAX_INSTRUCTIONS_LENGTH)
        {
            errors.push(FieldError::new("instructions", "is too long"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Where and by whom an in-store pickup is collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupDetails {
    pub store_id: StoreId,
    pub pickup_person: String,
    pub phone: String,
    #[serde(default)]
    pub pickup_date: Option<NaiveDate>,
}

impl PickupDetails {
    /// # Errors
    ///
    /// Returns one error per blank field or a pickup date in the past.
    pub fn validate(&self, today: NaiveDate) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.pickup_person.trim().is_empty() {
            errors.push(FieldError::new("pickup_person", "is required"));
        }
        if self.phone.trim().is_empty() {
            errors.push(FieldError::new("phone", "is required"));
        }
        if self.pickup_date.is_some_and(|date| date < today) {
            errors.push(FieldError::new("pickup_date", "cannot be in the past"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// How the order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    CardOnDelivery,
    PayInStore,
    OnlineCard,
}

impl PaymentMethod {
    /// Every payment method, in display order.
    pub const ALL: [Self; 4] = [
        Self::OnlineCard,
        Self::CardOnDelivery,
        Self::CashOnDelivery,
        Self::PayInStore,
    ];

    /// Methods offered for `fulfillment`.
    #[must_use]
    pub fn options_for(fulfillment: FulfillmentMethod) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|method| method.allowed_for(fulfillment))
            .collect()
    }

    /// Whether the method can be used with `fulfillment`.
    #[must_use]
    pub const fn allowed_for(self, fulfillment: FulfillmentMethod) -> bool {
        match self {
            Self::CashOnDelivery | Self::CardOnDelivery => fulfillment.ships(),
            Self::PayInStore => !fulfillment.ships(),
            Self::OnlineCard => true,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Cash on delivery",
            Self::CardOnDelivery => "Card on delivery",
            Self::PayInStore => "Pay in store",
            Self::OnlineCard => "Card",
        }
    }
}

/// Billing address choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum BillingChoice {
    SameAsShipping,
    Address(Address),
}
