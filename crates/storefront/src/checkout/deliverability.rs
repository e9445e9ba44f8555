//! Deliverability check of a cart against a shipping location.

use orchard_core::{CartLineId, ProductId};
use serde::{Deserialize, Serialize};

use crate::api::Cart;

/// A cart line that cannot ship to the proposed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonDeliverableLine {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
}

/// Lines of `cart` that are not eligible for delivery.
///
/// `cart` must have been fetched for the location being checked.
#[must_use]
pub fn non_deliverable_lines(cart: &Cart) -> Vec<NonDeliverableLine> {
    cart.lines
        .iter()
        .filter(|line| !line.delivery_eligible)
        .map(|line| NonDeliverableLine {
            line_id: line.id,
            product_id: line.product_id,
            title: line.title.clone(),
            quantity: line.quantity,
        })
        .collect()
}

/// Line ids to send to the removal endpoint.
#[must_use]
pub fn line_ids(lines: &[NonDeliverableLine]) -> Vec<CartLineId> {
    lines.iter().map(|line| line.line_id).collect()
}
