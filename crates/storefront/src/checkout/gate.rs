//! Checkout step gate.
//!
//! A checkout is a fixed sequence of steps whose shape depends on the chosen
//! fulfillment method:
//!
//! ```text
//! home delivery:   Account → Fulfillment → ShippingAddress → RecipientDetails
//!                  → DeliveryPreferences → BillingAddress → Payment
//! in-store pickup: Account → Fulfillment → PickupDetails → BillingAddress
//!                  → Payment
//! ```
//!
//! Each step has a completion flag. A step is reachable only when every step
//! before it in the active sequence is complete. Recipient details and
//! delivery preferences are optional: they complete either with data or by
//! being skipped.
//!
//! The gate performs no I/O. Callers fetch carts and talk to the API, then
//! feed the results in.

use chrono::NaiveDate;
use orchard_core::{Address, AddressType, FieldError, FulfillmentMethod};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::deliverability::{NonDeliverableLine, non_deliverable_lines};
use super::records::{
    BillingChoice, CheckoutUser, DeliveryPreferences, PaymentMethod, PickupDetails,
    RecipientDetails,
};
use crate::api::{Cart, PlacedOrder};

// =============================================================================
// Steps
// =============================================================================

/// A checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Account,
    Fulfillment,
    ShippingAddress,
    RecipientDetails,
    DeliveryPreferences,
    PickupDetails,
    BillingAddress,
    Payment,
    Submitted,
}

impl Step {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Fulfillment => "Delivery method",
            Self::ShippingAddress => "Shipping address",
            Self::RecipientDetails => "Recipient",
            Self::DeliveryPreferences => "Delivery preferences",
            Self::PickupDetails => "Pickup",
            Self::BillingAddress => "Billing address",
            Self::Payment => "Payment",
            Self::Submitted => "Order placed",
        }
    }

    /// Whether the step may be skipped.
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::RecipientDetails | Self::DeliveryPreferences)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const HOME_DELIVERY_STEPS: &[Step] = &[
    Step::Account,
    Step::Fulfillment,
    Step::ShippingAddress,
    Step::RecipientDetails,
    Step::DeliveryPreferences,
    Step::BillingAddress,
    Step::Payment,
];

const PICKUP_STEPS: &[Step] = &[
    Step::Account,
    Step::Fulfillment,
    Step::PickupDetails,
    Step::BillingAddress,
    Step::Payment,
];

const UNDECIDED_STEPS: &[Step] = &[Step::Account, Step::Fulfillment];

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by the step gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// An earlier step is not complete yet.
    #[error("{step} is not available until {blocked_by} is complete")]
    StepNotReachable { step: Step, blocked_by: Step },

    /// The step does not belong to the chosen fulfillment flow.
    #[error("{step} is not part of this checkout")]
    NotInBranch { step: Step },

    /// The order was already placed.
    #[error("this checkout has already been submitted")]
    AlreadySubmitted,

    /// There is no shipping address waiting on item removal.
    #[error("no shipping address is awaiting confirmation")]
    NoPendingShipping,

    /// Submitted data failed validation.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// The payment method cannot be used with the fulfillment method.
    #[error("{} is not available for {}", .method.label(), .fulfillment.label())]
    PaymentNotAllowed {
        method: PaymentMethod,
        fulfillment: FulfillmentMethod,
    },

    /// The order cannot be placed while a step is incomplete.
    #[error("{missing} must be completed before placing the order")]
    Incomplete { missing: Step },
}

// =============================================================================
// Session
// =============================================================================

/// Per-step completion flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub account: bool,
    pub fulfillment: bool,
    pub shipping_address: bool,
    pub recipient_details: bool,
    pub delivery_preferences: bool,
    pub pickup_details: bool,
    pub billing_address: bool,
    pub payment: bool,
}

impl Completion {
    fn flag_mut(&mut self, step: Step) -> Option<&mut bool> {
        match step {
            Step::Account => Some(&mut self.account),
            Step::Fulfillment => Some(&mut self.fulfillment),
            Step::ShippingAddress => Some(&mut self.shipping_address),
            Step::RecipientDetails => Some(&mut self.recipient_details),
            Step::DeliveryPreferences => Some(&mut self.delivery_preferences),
            Step::PickupDetails => Some(&mut self.pickup_details),
            Step::BillingAddress => Some(&mut self.billing_address),
            Step::Payment => Some(&mut self.payment),
            Step::Submitted => None,
        }
    }

    const fn get(&self, step: Step) -> bool {
        match step {
            Step::Account => self.account,
            Step::Fulfillment => self.fulfillment,
            Step::ShippingAddress => self.shipping_address,
            Step::RecipientDetails => self.recipient_details,
            Step::DeliveryPreferences => self.delivery_preferences,
            Step::PickupDetails => self.pickup_details,
            Step::BillingAddress => self.billing_address,
            Step::Payment => self.payment,
            Step::Submitted => false,
        }
    }
}

/// Result of proposing a shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "lines", rename_all = "snake_case")]
pub enum ShippingOutcome {
    /// The address was accepted and the step is complete.
    Completed,
    /// These lines cannot ship to the address. The address is held as
    /// pending until the shopper confirms their removal or cancels.
    NeedsRemoval(Vec<NonDeliverableLine>),
}

/// Progress of one step, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepProgress {
    pub step: Step,
    pub completed: bool,
    pub reachable: bool,
    pub optional: bool,
}

/// An in-progress checkout.
///
/// Stored in the visitor's session under `{tenant}_checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    cart_id: String,
    user: Option<CheckoutUser>,
    fulfillment_method: Option<FulfillmentMethod>,
    shipping_address: Option<Address>,
    pending_shipping: Option<Address>,
    recipient_details: Option<RecipientDetails>,
    delivery_preferences: Option<DeliveryPreferences>,
    pickup_details: Option<PickupDetails>,
    billing_address: Option<Address>,
    billing_same_as_shipping: bool,
    payment_method: Option<PaymentMethod>,
    completed: Completion,
    order: Option<PlacedOrder>,
}

impl CheckoutSession {
    /// Start a checkout for a cart.
    #[must_use]
    pub fn new(cart_id: impl Into<String>) -> Self {
        Self {
            cart_id: cart_id.into(),
            user: None,
            fulfillment_method: None,
            shipping_address: None,
            pending_shipping: None,
            recipient_details: None,
            delivery_preferences: None,
            pickup_details: None,
            billing_address: None,
            billing_same_as_shipping: false,
            payment_method: None,
            completed: Completion::default(),
            order: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn cart_id(&self) -> &str {
        &self.cart_id
    }

    #[must_use]
    pub const fn user(&self) -> Option<&CheckoutUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn fulfillment_method(&self) -> Option<FulfillmentMethod> {
        self.fulfillment_method
    }

    #[must_use]
    pub const fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    /// Shipping address waiting on confirmation of item removal.
    #[must_use]
    pub const fn pending_shipping(&self) -> Option<&Address> {
        self.pending_shipping.as_ref()
    }

    #[must_use]
    pub const fn recipient_details(&self) -> Option<&RecipientDetails> {
        self.recipient_details.as_ref()
    }

    #[must_use]
    pub const fn delivery_preferences(&self) -> Option<&DeliveryPreferences> {
        self.delivery_preferences.as_ref()
    }

    #[must_use]
    pub const fn pickup_details(&self) -> Option<&PickupDetails> {
        self.pickup_details.as_ref()
    }

    #[must_use]
    pub const fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    /// Whether billing has the same content as shipping.
    #[must_use]
    pub const fn billing_same_as_shipping(&self) -> bool {
        self.billing_same_as_shipping
    }

    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    #[must_use]
    pub const fn completion(&self) -> Completion {
        self.completed
    }

    /// The placed order, once submitted.
    #[must_use]
    pub const fn order(&self) -> Option<&PlacedOrder> {
        self.order.as_ref()
    }

    // -------------------------------------------------------------------------
    // Gate queries
    // -------------------------------------------------------------------------

    /// Steps of the active flow, in order.
    #[must_use]
    pub const fn sequence(&self) -> &'static [Step] {
        match self.fulfillment_method {
            Some(FulfillmentMethod::HomeDelivery) => HOME_DELIVERY_STEPS,
            Some(FulfillmentMethod::InStorePickup) => PICKUP_STEPS,
            None => UNDECIDED_STEPS,
        }
    }

    /// Whether `step` is complete.
    #[must_use]
    pub const fn is_completed(&self, step: Step) -> bool {
        match step {
            Step::Submitted => self.order.is_some(),
            _ => self.completed.get(step),
        }
    }

    /// The step the shopper should work on next.
    ///
    /// With every step complete this is `Payment`, where the order is
    /// placed; after placement it is `Submitted`.
    #[must_use]
    pub fn current_step(&self) -> Step {
        if self.order.is_some() {
            return Step::Submitted;
        }
        self.sequence()
            .iter()
            .copied()
            .find(|step| !self.is_completed(*step))
            .unwrap_or(Step::Payment)
    }

    /// Whether every step before `step` in the active flow is complete.
    #[must_use]
    pub fn is_reachable(&self, step: Step) -> bool {
        match step {
            Step::Submitted => self.order.is_some(),
            _ => self.ensure_reachable(step).is_ok(),
        }
    }

    /// Why `step` cannot be entered, if it cannot.
    ///
    /// # Errors
    ///
    /// Returns the same error the step's transition would.
    pub fn check_reachable(&self, step: Step) -> Result<(), CheckoutError> {
        self.ensure_reachable(step)
    }

    /// Whether the order can be placed now.
    #[must_use]
    pub fn ready_to_submit(&self) -> bool {
        self.order.is_none()
            && self.fulfillment_method.is_some()
            && self.sequence().iter().all(|step| self.is_completed(*step))
    }

    /// Completion and reachability of each step in the active flow.
    #[must_use]
    pub fn progress(&self) -> Vec<StepProgress> {
        self.sequence()
            .iter()
            .map(|&step| StepProgress {
                step,
                completed: self.is_completed(step),
                reachable: self.is_reachable(step),
                optional: step.is_optional(),
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Complete the account step.
    ///
    /// Identifying as a different shopper clears every address-derived step.
    ///
    /// # Errors
    ///
    /// Fails after submission.
    pub fn complete_account(&mut self, user: CheckoutUser) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::Account)?;
        if self.user.as_ref().is_some_and(|u| u.email != user.email) {
            self.reset_addresses();
        }
        self.user = Some(user);
        self.completed.account = true;
        Ok(())
    }

    /// Choose home delivery or in-store pickup.
    ///
    /// Switching methods clears the previous flow's steps and billing, and
    /// clears a payment method the new flow does not accept.
    ///
    /// # Errors
    ///
    /// Fails if the account step is incomplete or after submission.
    pub fn choose_fulfillment(&mut self, method: FulfillmentMethod) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::Fulfillment)?;
        if self.fulfillment_method.is_some_and(|current| current != method) {
            self.reset_branch();
            self.reset_billing();
            if self.payment_method.is_some_and(|p| !p.allowed_for(method)) {
                self.payment_method = None;
                self.completed.payment = false;
            }
        }
        self.fulfillment_method = Some(method);
        self.completed.fulfillment = true;
        Ok(())
    }

    /// Propose a shipping address against the current cart.
    ///
    /// If any cart line cannot ship there, the address is held as pending
    /// and the blocking lines are returned.
    ///
    /// # Errors
    ///
    /// Fails when shipping is not reachable or after submission.
    pub fn propose_shipping_address(
        &mut self,
        address: Address,
        cart: &Cart,
    ) -> Result<ShippingOutcome, CheckoutError> {
        self.ensure_reachable(Step::ShippingAddress)?;

        if self
            .shipping_address
            .as_ref()
            .is_some_and(|current| !current.same_content(&address))
        {
            self.reopen_shipping();
        }

        let blocked = non_deliverable_lines(cart);
        if !blocked.is_empty() {
            self.pending_shipping = Some(address);
            self.completed.shipping_address = false;
            return Ok(ShippingOutcome::NeedsRemoval(blocked));
        }

        self.accept_shipping(address);
        Ok(ShippingOutcome::Completed)
    }

    /// Re-check the pending address against the cart returned by the
    /// removal call.
    ///
    /// # Errors
    ///
    /// Fails when there is no pending address, when shipping is not
    /// reachable, or after submission.
    pub fn confirm_non_deliverable_removal(
        &mut self,
        cart: &Cart,
    ) -> Result<ShippingOutcome, CheckoutError> {
        self.ensure_reachable(Step::ShippingAddress)?;
        let pending = self
            .pending_shipping
            .take()
            .ok_or(CheckoutError::NoPendingShipping)?;

        let blocked = non_deliverable_lines(cart);
        if !blocked.is_empty() {
            self.pending_shipping = Some(pending);
            return Ok(ShippingOutcome::NeedsRemoval(blocked));
        }

        self.accept_shipping(pending);
        Ok(ShippingOutcome::Completed)
    }

    /// Drop the pending address and keep the cart as is.
    ///
    /// # Errors
    ///
    /// Fails when nothing is pending or after submission.
    pub fn cancel_pending_shipping(&mut self) -> Result<Address, CheckoutError> {
        self.ensure_open()?;
        self.pending_shipping
            .take()
            .ok_or(CheckoutError::NoPendingShipping)
    }

    /// # Errors
    ///
    /// Fails on invalid details, when the step is not reachable, or after
    /// submission.
    pub fn complete_recipient_details(
        &mut self,
        details: RecipientDetails,
    ) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::RecipientDetails)?;
        details.validate().map_err(CheckoutError::Validation)?;
        self.recipient_details = Some(details);
        self.completed.recipient_details = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when the step is not reachable or after submission.
    pub fn skip_recipient_details(&mut self) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::RecipientDetails)?;
        self.recipient_details = None;
        self.completed.recipient_details = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails on a past date or overlong instructions, when the step is not
    /// reachable, or after submission.
    pub fn complete_delivery_preferences(
        &mut self,
        preferences: DeliveryPreferences,
        today: NaiveDate,
    ) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::DeliveryPreferences)?;
        preferences
            .validate(today)
            .map_err(CheckoutError::Validation)?;
        self.delivery_preferences = Some(preferences);
        self.completed.delivery_preferences = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when the step is not reachable or after submission.
    pub fn skip_delivery_preferences(&mut self) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::DeliveryPreferences)?;
        self.delivery_preferences = None;
        self.completed.delivery_preferences = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails on invalid details, outside the pickup flow, when the step is
    /// not reachable, or after submission.
    pub fn complete_pickup_details(
        &mut self,
        details: PickupDetails,
        today: NaiveDate,
    ) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::PickupDetails)?;
        details.validate(today).map_err(CheckoutError::Validation)?;
        self.pickup_details = Some(details);
        self.completed.pickup_details = true;
        Ok(())
    }

    /// Complete billing, either by copying shipping or with an address.
    ///
    /// Billing aliases shipping whenever the contents match, however it was
    /// entered.
    ///
    /// # Errors
    ///
    /// Fails when copying shipping without one, when the step is not
    /// reachable, or after submission.
    pub fn complete_billing(&mut self, choice: BillingChoice) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::BillingAddress)?;

        let address = match choice {
            BillingChoice::SameAsShipping => self
                .shipping_address
                .as_ref()
                .map(|shipping| shipping.retagged(AddressType::Billing))
                .ok_or_else(|| {
                    CheckoutError::Validation(vec![FieldError::new(
                        "billing_address",
                        "there is no shipping address to copy",
                    )])
                })?,
            BillingChoice::Address(address) => address,
        };

        self.billing_same_as_shipping = self
            .shipping_address
            .as_ref()
            .is_some_and(|shipping| shipping.same_content(&address));
        self.billing_address = Some(address);
        self.completed.billing_address = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails when the method does not suit the fulfillment method, when the
    /// step is not reachable, or after submission.
    pub fn complete_payment(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        self.ensure_reachable(Step::Payment)?;
        if let Some(fulfillment) = self.fulfillment_method
            && !method.allowed_for(fulfillment)
        {
            return Err(CheckoutError::PaymentNotAllowed {
                method,
                fulfillment,
            });
        }
        self.payment_method = Some(method);
        self.completed.payment = true;
        Ok(())
    }

    /// Record the placed order.
    ///
    /// # Errors
    ///
    /// Fails when any step is incomplete or the order was already placed.
    pub fn mark_submitted(&mut self, order: PlacedOrder) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if !self.ready_to_submit() {
            return Err(CheckoutError::Incomplete {
                missing: self.current_step(),
            });
        }
        self.order = Some(order);
        Ok(())
    }

    /// Reopen a completed step for changes.
    ///
    /// Reopening the shipping address also reopens billing, recipient
    /// details and delivery preferences.
    ///
    /// # Errors
    ///
    /// Fails for steps outside the active flow or after submission.
    pub fn reopen(&mut self, step: Step) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        if !self.sequence().contains(&step) {
            return Err(CheckoutError::NotInBranch { step });
        }
        if step == Step::ShippingAddress {
            self.reopen_shipping();
        } else if let Some(flag) = self.completed.flag_mut(step) {
            *flag = false;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    const fn ensure_open(&self) -> Result<(), CheckoutError> {
        if self.order.is_some() {
            return Err(CheckoutError::AlreadySubmitted);
        }
        Ok(())
    }

    fn ensure_reachable(&self, step: Step) -> Result<(), CheckoutError> {
        self.ensure_open()?;
        let sequence = self.sequence();
        let position = match sequence.iter().position(|s| *s == step) {
            Some(position) => position,
            // Before a fulfillment method is chosen, every branch step sits
            // after the undecided prefix.
            None if self.fulfillment_method.is_none() && step != Step::Submitted => {
                sequence.len()
            }
            None => return Err(CheckoutError::NotInBranch { step }),
        };

        match sequence
            .iter()
            .take(position)
            .find(|s| !self.is_completed(**s))
        {
            Some(&blocked_by) => Err(CheckoutError::StepNotReachable { step, blocked_by }),
            None => Ok(()),
        }
    }

    fn accept_shipping(&mut self, address: Address) {
        self.pending_shipping = None;
        self.shipping_address = Some(address);
        self.completed.shipping_address = true;
    }

    fn reopen_shipping(&mut self) {
        self.completed.shipping_address = false;
        self.completed.recipient_details = false;
        self.completed.delivery_preferences = false;
        self.reset_billing();
    }

    fn reset_billing(&mut self) {
        self.billing_address = None;
        self.billing_same_as_shipping = false;
        self.completed.billing_address = false;
    }

    fn reset_branch(&mut self) {
        self.shipping_address = None;
        self.pending_shipping = None;
        self.recipient_details = None;
        self.delivery_preferences = None;
        self.pickup_details = None;
        self.completed.shipping_address = false;
        self.completed.recipient_details = false;
        self.completed.delivery_preferences = false;
        self.completed.pickup_details = false;
    }

    fn reset_addresses(&mut self) {
        self.shipping_address = None;
        self.pending_shipping = None;
        self.recipient_details = None;
        self.delivery_preferences = None;
        self.completed.shipping_address = false;
        self.completed.recipient_details = false;
        self.completed.delivery_preferences = false;
        self.reset_billing();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use orchard_core::{AddressId, CartLineId, CurrencyCode, Email, OrderId, ProductId, StoreId};
    use rust_decimal::Decimal;

    use crate::api::CartLine;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn user(email: &str) -> CheckoutUser {
        CheckoutUser {
            email: Email::parse(email).unwrap(),
            name: "Sam Shopper".to_string(),
            is_guest: true,
        }
    }

    fn address(id: i64, postal_code: &str) -> Address {
        Address {
            id: Some(AddressId::new(id)),
            address_type: AddressType::Shipping,
            is_default: true,
            first_name: "Sam".to_string(),
            last_name: "Shopper".to_string(),
            phone: None,
            line1: "1 Market St".to_string(),
            line2: None,
            city: "San Francisco".to_string(),
            region: Some("CA".to_string()),
            postal_code: postal_code.to_string(),
            country_code: "US".to_string(),
        }
    }

    fn line(id: i64, eligible: bool) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            product_id: ProductId::new(id * 10),
            title: format!("Item {id}"),
            quantity: 1,
            unit_price: Decimal::new(500, 2),
            delivery_eligible: eligible,
        }
    }

    fn cart(lines: Vec<CartLine>) -> Cart {
        Cart {
            id: "cart-1".to_string(),
            lines,
            currency_code: CurrencyCode::USD,
            subtotal: Decimal::new(1000, 2),
        }
    }

    fn order() -> PlacedOrder {
        PlacedOrder {
            id: OrderId::new(99),
            order_number: "A-1001".to_string(),
        }
    }

    /// A home-delivery checkout with everything up to payment complete.
    fn delivery_ready_for_payment() -> CheckoutSession {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(user("sam@example.com")).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::HomeDelivery)
            .unwrap();
        let outcome = session
            .propose_shipping_address(address(1, "94107"), &cart(vec![line(1, true)]))
            .unwrap();
        assert_eq!(outcome, ShippingOutcome::Completed);
        session.skip_recipient_details().unwrap();
        session
            .complete_delivery_preferences(DeliveryPreferences::default(), today())
            .unwrap();
        session.complete_billing(BillingChoice::SameAsShipping).unwrap();
        session
    }

    #[test]
    fn test_new_session_starts_at_account() {
        let session = CheckoutSession::new("cart-1");
        assert_eq!(session.current_step(), Step::Account);
        assert!(session.is_reachable(Step::Account));
        assert!(!session.is_reachable(Step::Fulfillment));
        assert!(!session.is_reachable(Step::Payment));
    }

    #[test]
    fn test_out_of_order_completion_is_rejected() {
        let mut session = CheckoutSession::new("cart-1");
        let err = session
            .complete_payment(PaymentMethod::OnlineCard)
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::StepNotReachable {
                step: Step::Payment,
                blocked_by: Step::Account,
            }
        );

        session.complete_account(user("sam@example.com")).unwrap();
        let err = session
            .complete_billing(BillingChoice::SameAsShipping)
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::StepNotReachable {
                step: Step::BillingAddress,
                blocked_by: Step::Fulfillment,
            }
        );
    }

    #[test]
    fn test_payment_requires_shipping_and_billing() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(user("sam@example.com")).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::HomeDelivery)
            .unwrap();
        assert!(!session.is_reachable(Step::Payment));

        session
            .propose_shipping_address(address(1, "94107"), &cart(vec![line(1, true)]))
            .unwrap();
        session.skip_recipient_details().unwrap();
        session.skip_delivery_preferences().unwrap();
        assert!(!session.is_reachable(Step::Payment));

        session.complete_billing(BillingChoice::SameAsShipping).unwrap();
        assert!(session.is_reachable(Step::Payment));
        assert_eq!(session.current_step(), Step::Payment);
    }

    #[test]
    fn test_pickup_flow_skips_shipping() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(user("sam@example.com")).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::InStorePickup)
            .unwrap();
        assert_eq!(session.current_step(), Step::PickupDetails);
        assert_eq!(
            session.propose_shipping_address(address(1, "94107"), &cart(vec![])),
            Err(CheckoutError::NotInBranch {
                step: Step::ShippingAddress
            })
        );

        session
            .complete_pickup_details(
                PickupDetails {
                    store_id: StoreId::new(3),
                    pickup_person: "Sam".to_string(),
                    phone: "555-0100".to_string(),
                    pickup_date: Some(today()),
                },
                today(),
            )
            .unwrap();

        let mut billing = address(2, "10001");
        billing.address_type = AddressType::Billing;
        session
            .complete_billing(BillingChoice::Address(billing))
            .unwrap();
        assert!(!session.billing_same_as_shipping());

        assert_eq!(
            session.complete_payment(PaymentMethod::CashOnDelivery),
            Err(CheckoutError::PaymentNotAllowed {
                method: PaymentMethod::CashOnDelivery,
                fulfillment: FulfillmentMethod::InStorePickup,
            })
        );
        session.complete_payment(PaymentMethod::PayInStore).unwrap();
        assert!(session.ready_to_submit());
    }

    #[test]
    fn test_same_as_shipping_needs_a_shipping_address() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(user("sam@example.com")).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::InStorePickup)
            .unwrap();
        session
            .complete_pickup_details(
                PickupDetails {
                    store_id: StoreId::new(3),
                    pickup_person: "Sam".to_string(),
                    phone: "555-0100".to_string(),
                    pickup_date: None,
                },
                today(),
            )
            .unwrap();

        assert!(matches!(
            session.complete_billing(BillingChoice::SameAsShipping),
            Err(CheckoutError::Validation(_))
        ));
    }

    #[test]
    fn test_reopening_shipping_resets_dependent_steps() {
        let mut session = delivery_ready_for_payment();
        session.complete_payment(PaymentMethod::OnlineCard).unwrap();

        session.reopen(Step::ShippingAddress).unwrap();

        let completed = session.completion();
        assert!(!completed.shipping_address);
        assert!(!completed.billing_address);
        assert!(!completed.recipient_details);
        assert!(!completed.delivery_preferences);
        assert!(completed.account);
        assert!(completed.fulfillment);
        assert_eq!(session.billing_address(), None);
        assert_eq!(session.current_step(), Step::ShippingAddress);
        assert!(!session.is_reachable(Step::Payment));
    }

    #[test]
    fn test_changing_shipping_address_resets_billing() {
        let mut session = delivery_ready_for_payment();
        assert!(session.billing_same_as_shipping());

        session
            .propose_shipping_address(address(5, "94110"), &cart(vec![line(1, true)]))
            .unwrap();

        assert!(session.completion().shipping_address);
        assert!(!session.completion().billing_address);
        assert!(!session.completion().recipient_details);
        assert_eq!(session.current_step(), Step::RecipientDetails);
    }

    #[test]
    fn test_reproposing_same_address_keeps_billing() {
        let mut session = delivery_ready_for_payment();
        let mut same = address(1, "94107");
        same.id = None;
        session
            .propose_shipping_address(same, &cart(vec![line(1, true)]))
            .unwrap();
        assert!(session.completion().billing_address);
    }

    #[test]
    fn test_non_deliverable_lines_block_shipping_until_removed() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(user("sam@example.com")).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::HomeDelivery)
            .unwrap();

        let outcome = session
            .propose_shipping_address(
                address(1, "99501"),
                &cart(vec![line(1, true), line(2, false)]),
            )
            .unwrap();
        let ShippingOutcome::NeedsRemoval(lines) = outcome else {
            panic!("expected removal prompt");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_id, CartLineId::new(2));
        assert!(!session.completion().shipping_address);
        assert!(session.pending_shipping().is_some());
        assert!(!session.is_reachable(Step::RecipientDetails));

        // The removal call has not taken effect yet.
        let outcome = session
            .confirm_non_deliverable_removal(&cart(vec![line(1, true), line(2, false)]))
            .unwrap();
        assert!(matches!(outcome, ShippingOutcome::NeedsRemoval(_)));
        assert!(session.pending_shipping().is_some());

        let outcome = session
            .confirm_non_deliverable_removal(&cart(vec![line(1, true)]))
            .unwrap();
        assert_eq!(outcome, ShippingOutcome::Completed);
        assert!(session.completion().shipping_address);
        assert_eq!(session.pending_shipping(), None);
        assert_eq!(
            session.shipping_address().map(|a| a.postal_code.as_str()),
            Some("99501")
        );
    }

    #[test]
    fn test_cancel_pending_shipping() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(user("sam@example.com")).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::HomeDelivery)
            .unwrap();
        assert_eq!(
            session.cancel_pending_shipping(),
            Err(CheckoutError::NoPendingShipping)
        );

        session
            .propose_shipping_address(address(1, "99501"), &cart(vec![line(2, false)]))
            .unwrap();
        let dropped = session.cancel_pending_shipping().unwrap();
        assert_eq!(dropped.postal_code, "99501");
        assert!(!session.completion().shipping_address);
        assert_eq!(
            session.confirm_non_deliverable_removal(&cart(vec![])),
            Err(CheckoutError::NoPendingShipping)
        );
    }

    #[test]
    fn test_switching_fulfillment_resets_branch_and_billing() {
        let mut session = delivery_ready_for_payment();
        session
            .complete_payment(PaymentMethod::CashOnDelivery)
            .unwrap();

        session
            .choose_fulfillment(FulfillmentMethod::InStorePickup)
            .unwrap();

        assert_eq!(session.shipping_address(), None);
        assert_eq!(session.billing_address(), None);
        assert_eq!(session.payment_method(), None);
        assert_eq!(session.current_step(), Step::PickupDetails);
    }

    #[test]
    fn test_choosing_same_fulfillment_keeps_progress() {
        let mut session = delivery_ready_for_payment();
        session.reopen(Step::Fulfillment).unwrap();
        assert_eq!(session.current_step(), Step::Fulfillment);
        assert!(!session.is_reachable(Step::BillingAddress));

        session
            .choose_fulfillment(FulfillmentMethod::HomeDelivery)
            .unwrap();
        assert!(session.completion().billing_address);
        assert_eq!(session.current_step(), Step::Payment);
    }

    #[test]
    fn test_different_user_resets_addresses() {
        let mut session = delivery_ready_for_payment();
        session.complete_account(user("sam@example.com")).unwrap();
        assert!(session.completion().billing_address);

        session.complete_account(user("alex@example.com")).unwrap();
        assert_eq!(session.shipping_address(), None);
        assert_eq!(session.billing_address(), None);
        assert_eq!(session.current_step(), Step::ShippingAddress);
    }

    #[test]
    fn test_submission_locks_the_session() {
        let mut session = delivery_ready_for_payment();
        assert_eq!(
            session.mark_submitted(order()),
            Err(CheckoutError::Incomplete {
                missing: Step::Payment
            })
        );

        session.complete_payment(PaymentMethod::OnlineCard).unwrap();
        session.mark_submitted(order()).unwrap();

        assert_eq!(session.current_step(), Step::Submitted);
        assert!(session.is_reachable(Step::Submitted));
        assert_eq!(
            session.reopen(Step::Payment),
            Err(CheckoutError::AlreadySubmitted)
        );
        assert_eq!(
            session.mark_submitted(order()),
            Err(CheckoutError::AlreadySubmitted)
        );
    }

    #[test]
    fn test_progress_lists_active_flow() {
        let session = delivery_ready_for_payment();
        let progress = session.progress();
        assert_eq!(progress.len(), HOME_DELIVERY_STEPS.len());
        assert!(progress[..6].iter().all(|p| p.completed));
        assert!(!progress[6].completed);
        assert!(progress[6].reachable);
        assert!(progress[3].optional);
    }

    #[test]
    fn test_session_survives_json_round_trip() {
        let session = delivery_ready_for_payment();
        let json = serde_json::to_string(&session).unwrap();
        let restored: CheckoutSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}
