//! Checkout flow.
//!
//! [`CheckoutSession`] holds the completion flags and sub-records of one
//! checkout and enforces step order. It is pure: the service layer performs
//! the remote calls and feeds carts and placed orders into it.

mod deliverability;
mod gate;
mod payload;
mod records;

pub use deliverability::{NonDeliverableLine, line_ids, non_deliverable_lines};
pub use gate::{CheckoutError, CheckoutSession, Completion, ShippingOutcome, Step, StepProgress};
pub use payload::OrderPayload;
pub use records::{
    BillingChoice, CheckoutUser, DeliveryPreferences, MAX_INSTRUCTIONS_LENGTH, PaymentMethod,
    PickupDetails, RecipientDetails, TimeSlot,
};
