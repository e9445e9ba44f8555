//! Order payload assembled from a completed checkout.

use orchard_core::{Address, Email, FulfillmentMethod};
use serde::Serialize;

use super::gate::{CheckoutError, CheckoutSession};
use super::records::{DeliveryPreferences, PaymentMethod, PickupDetails, RecipientDetails};

/// Body of `POST orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderPayload {
    pub cart_id: String,
    pub email: Email,
    pub customer_name: String,
    pub is_guest: bool,
    pub fulfillment_method: FulfillmentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    pub billing_address: Address,
    pub billing_same_as_shipping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<RecipientDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_preferences: Option<DeliveryPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<PickupDetails>,
    pub payment_method: PaymentMethod,
}

impl OrderPayload {
    /// Assemble the payload from a checkout ready for submission.
    ///
    /// Only the records of the active fulfillment flow are included.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Incomplete`] naming the first unfinished step,
    /// or [`CheckoutError::AlreadySubmitted`].
    pub fn assemble(session: &CheckoutSession) -> Result<Self, CheckoutError> {
        if session.order().is_some() {
            return Err(CheckoutError::AlreadySubmitted);
        }
        let incomplete = || CheckoutError::Incomplete {
            missing: session.current_step(),
        };
        if !session.ready_to_submit() {
            return Err(incomplete());
        }

        let user = session.user().ok_or_else(incomplete)?;
        let fulfillment_method = session.fulfillment_method().ok_or_else(incomplete)?;
        let billing_address = session.billing_address().cloned().ok_or_else(incomplete)?;
        let payment_method = session.payment_method().ok_or_else(incomplete)?;

        let ships = fulfillment_method.ships();
        let delivery_preferences = session
            .delivery_preferences()
            .filter(|_| ships)
            .cloned();

        Ok(Self {
            cart_id: session.cart_id().to_string(),
            email: user.email.clone(),
            customer_name: user.name.clone(),
            is_guest: user.is_guest,
            fulfillment_method,
            shipping_address: session.shipping_address().filter(|_| ships).cloned(),
            billing_address,
            billing_same_as_shipping: session.billing_same_as_shipping(),
            recipient: session.recipient_details().filter(|_| ships).cloned(),
            shipping_method: delivery_preferences
                .as_ref()
                .and_then(|prefs| prefs.shipping_method.clone()),
            delivery_preferences,
            pickup: session.pickup_details().filter(|_| !ships).cloned(),
            payment_method,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use orchard_core::{AddressId, AddressType, CartLineId, CurrencyCode, ProductId, StoreId};
    use rust_decimal::Decimal;

    use crate::api::{Cart, CartLine};
    use crate::checkout::records::{BillingChoice, CheckoutUser};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
    }

    fn shopper() -> CheckoutUser {
        CheckoutUser {
            email: Email::parse("sam@example.com").unwrap(),
            name: "Sam Shopper".to_string(),
            is_guest: false,
        }
    }

    fn shipping() -> Address {
        Address {
            id: Some(AddressId::new(1)),
            address_type: AddressType::Shipping,
            is_default: true,
            first_name: "Sam".to_string(),
            last_name: "Shopper".to_string(),
            phone: Some("555-0100".to_string()),
            line1: "1 Market St".to_string(),
            line2: None,
            city: "San Francisco".to_string(),
            region: Some("CA".to_string()),
            postal_code: "94107".to_string(),
            country_code: "US".to_string(),
        }
    }

    fn deliverable_cart() -> Cart {
        Cart {
            id: "cart-1".to_string(),
            lines: vec![CartLine {
                id: CartLineId::new(1),
                product_id: ProductId::new(10),
                title: "Apples".to_string(),
                quantity: 2,
                unit_price: Decimal::new(250, 2),
                delivery_eligible: true,
            }],
            currency_code: CurrencyCode::USD,
            subtotal: Decimal::new(500, 2),
        }
    }

    #[test]
    fn test_home_delivery_payload() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(shopper()).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::HomeDelivery)
            .unwrap();
        session
            .propose_shipping_address(shipping(), &deliverable_cart())
            .unwrap();
        session
            .complete_recipient_details(RecipientDetails {
                name: "Alex".to_string(),
                phone: "555-0199".to_string(),
            })
            .unwrap();
        session
            .complete_delivery_preferences(
                DeliveryPreferences {
                    shipping_method: Some("express".to_string()),
                    ..DeliveryPreferences::default()
                },
                today(),
            )
            .unwrap();
        session.complete_billing(BillingChoice::SameAsShipping).unwrap();

        assert!(matches!(
            OrderPayload::assemble(&session),
            Err(CheckoutError::Incomplete { .. })
        ));

        session
            .complete_payment(PaymentMethod::CardOnDelivery)
            .unwrap();
        let payload = OrderPayload::assemble(&session).unwrap();

        assert_eq!(payload.cart_id, "cart-1");
        assert!(payload.billing_same_as_shipping);
        assert_eq!(payload.billing_address.address_type, AddressType::Billing);
        assert_eq!(payload.billing_address.id, None);
        assert_eq!(payload.shipping_method.as_deref(), Some("express"));
        assert_eq!(payload.recipient.map(|r| r.name), Some("Alex".to_string()));
        assert!(payload.pickup.is_none());

        let json = serde_json::to_value(
            OrderPayload::assemble(&session).unwrap(),
        )
        .unwrap();
        assert_eq!(json["fulfillment_method"], "home_delivery");
        assert_eq!(json["payment_method"], "card_on_delivery");
    }

    #[test]
    fn test_pickup_payload_omits_shipping() {
        let mut session = CheckoutSession::new("cart-1");
        session.complete_account(shopper()).unwrap();
        session
            .choose_fulfillment(FulfillmentMethod::InStorePickup)
            .unwrap();
        session
            .complete_pickup_details(
                PickupDetails {
                    store_id: StoreId::new(4),
                    pickup_person: "Sam".to_string(),
                    phone: "555-0100".to_string(),
                    pickup_date: None,
                },
                today(),
            )
            .unwrap();
        let mut billing = shipping();
        billing.address_type = AddressType::Billing;
        session
            .complete_billing(BillingChoice::Address(billing))
            .unwrap();
        session.complete_payment(PaymentMethod::PayInStore).unwrap();

        let payload = OrderPayload::assemble(&session).unwrap();
        assert!(payload.shipping_address.is_none());
        assert!(payload.delivery_preferences.is_none());
        assert_eq!(payload.pickup.map(|p| p.store_id), Some(StoreId::new(4)));

        let json = serde_json::to_value(OrderPayload::assemble(&session).unwrap()).unwrap();
        assert!(json.get("shipping_address").is_none());
    }
}
