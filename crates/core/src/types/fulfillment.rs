//! Fulfillment method chosen during checkout.

use serde::{Deserialize, Serialize};

/// How the order reaches the customer.
///
/// Chosen once per checkout; the choice decides whether the shipping-address
/// branch or the pickup branch of the checkout is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMethod {
    HomeDelivery,
    InStorePickup,
}

impl FulfillmentMethod {
    /// Whether this method ships to an address.
    #[must_use]
    pub const fn ships(self) -> bool {
        matches!(self, Self::HomeDelivery)
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HomeDelivery => "Home delivery",
            Self::InStorePickup => "In-store pickup",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&FulfillmentMethod::HomeDelivery).unwrap(),
            "\"home_delivery\""
        );
        assert_eq!(
            serde_json::from_str::<FulfillmentMethod>("\"in_store_pickup\"").unwrap(),
            FulfillmentMethod::InStorePickup
        );
    }
}
