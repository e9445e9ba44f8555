//! Checkout route handlers.
//!
//! Every step is a JSON endpoint that returns the updated checkout. Steps
//! out of order are refused with 409 and the step that blocks them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use orchard_core::{Address, FulfillmentMethod, Price};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

use crate::api::{Cart, PlacedOrder, ShippingMethod, Store};
use crate::checkout::{
    CheckoutSession, DeliveryPreferences, PaymentMethod, PickupDetails, RecipientDetails,
    ShippingOutcome, Step, StepProgress,
};
use crate::error::Result;
use crate::filters;
use crate::middleware::Storage;
use crate::services::checkout::{BillingSelection, CheckoutService, ShippingSelection};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Checkout as returned to the client.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    #[serde(flatten)]
    pub checkout: CheckoutSession,
    pub current_step: Step,
    pub steps: Vec<StepProgress>,
    pub ready_to_submit: bool,
    pub payment_options: Vec<PaymentMethod>,
}

impl From<CheckoutSession> for CheckoutView {
    fn from(checkout: CheckoutSession) -> Self {
        let payment_options = checkout
            .fulfillment_method()
            .map(PaymentMethod::options_for)
            .unwrap_or_default();
        Self {
            current_step: checkout.current_step(),
            steps: checkout.progress(),
            ready_to_submit: checkout.ready_to_submit(),
            payment_options,
            checkout,
        }
    }
}

/// Response to a shipping address proposal.
#[derive(Debug, Serialize)]
pub struct ShippingResponse {
    pub checkout: CheckoutView,
    pub outcome: ShippingOutcome,
}

/// Response to cancelling a pending address.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub checkout: CheckoutView,
    pub cancelled: Address,
}

/// Response to placing the order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub checkout: CheckoutView,
    pub order: PlacedOrder,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub cart_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FulfillmentRequest {
    pub method: FulfillmentMethod,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
pub struct ReopenRequest {
    pub step: Step,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub cart_id: Option<String>,
}

// =============================================================================
// Session
// =============================================================================

/// Current checkout.
pub async fn show(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage).current().await?;
    Ok(Json(checkout.into()))
}

/// Start checkout for a cart.
#[instrument(skip(state, storage, body))]
pub async fn start(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<StartRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .start(&body.cart_id)
        .await?;
    Ok(Json(checkout.into()))
}

/// The checkout's cart, priced for the last shipping location.
pub async fn cart(State(state): State<AppState>, Storage(storage): Storage) -> Result<Json<Cart>> {
    let cart = CheckoutService::new(state.api(), &storage).cart().await?;
    Ok(Json(cart))
}

// =============================================================================
// Steps
// =============================================================================

pub async fn fulfillment(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<FulfillmentRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .choose_fulfillment(body.method)
        .await?;
    Ok(Json(checkout.into()))
}

/// Select a shipping address.
///
/// Responds with `needs_removal` and the blocking lines when part of the
/// cart cannot ship there.
pub async fn shipping(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(selection): Json<ShippingSelection>,
) -> Result<Json<ShippingResponse>> {
    let (checkout, outcome) = CheckoutService::new(state.api(), &storage)
        .select_shipping(selection)
        .await?;
    Ok(Json(ShippingResponse {
        checkout: checkout.into(),
        outcome,
    }))
}

pub async fn confirm_removal(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<ShippingResponse>> {
    let (checkout, outcome) = CheckoutService::new(state.api(), &storage)
        .confirm_removal()
        .await?;
    Ok(Json(ShippingResponse {
        checkout: checkout.into(),
        outcome,
    }))
}

pub async fn cancel_pending(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<CancelResponse>> {
    let (checkout, cancelled) = CheckoutService::new(state.api(), &storage)
        .cancel_pending()
        .await?;
    Ok(Json(CancelResponse {
        checkout: checkout.into(),
        cancelled,
    }))
}

pub async fn recipient(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(details): Json<RecipientDetails>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .recipient(Some(details))
        .await?;
    Ok(Json(checkout.into()))
}

pub async fn skip_recipient(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .recipient(None)
        .await?;
    Ok(Json(checkout.into()))
}

pub async fn delivery_preferences(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(preferences): Json<DeliveryPreferences>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .delivery_preferences(Some(preferences))
        .await?;
    Ok(Json(checkout.into()))
}

pub async fn skip_delivery_preferences(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .delivery_preferences(None)
        .await?;
    Ok(Json(checkout.into()))
}

pub async fn pickup(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(details): Json<PickupDetails>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .pickup(details)
        .await?;
    Ok(Json(checkout.into()))
}

pub async fn billing(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(selection): Json<BillingSelection>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .billing(selection)
        .await?;
    Ok(Json(checkout.into()))
}

pub async fn payment(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<PaymentRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .payment(body.method)
        .await?;
    Ok(Json(checkout.into()))
}

/// Reopen a completed step for editing.
pub async fn reopen(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Json(body): Json<ReopenRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = CheckoutService::new(state.api(), &storage)
        .reopen(body.step)
        .await?;
    Ok(Json(checkout.into()))
}

#[instrument(skip(state, storage))]
pub async fn place_order(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<OrderResponse>> {
    let (checkout, order) = CheckoutService::new(state.api(), &storage)
        .place_order()
        .await?;
    Ok(Json(OrderResponse {
        checkout: checkout.into(),
        order,
    }))
}

// =============================================================================
// Lookups
// =============================================================================

pub async fn shipping_methods(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<Arc<Vec<ShippingMethod>>>> {
    let methods = CheckoutService::new(state.api(), &storage)
        .shipping_methods()
        .await?;
    Ok(Json(methods))
}

pub async fn stores(
    State(state): State<AppState>,
    Storage(storage): Storage,
) -> Result<Json<Arc<Vec<Store>>>> {
    let stores = CheckoutService::new(state.api(), &storage).stores().await?;
    Ok(Json(stores))
}

// =============================================================================
// Page
// =============================================================================

/// Step row for the progress list.
#[derive(Clone)]
pub struct StepRow {
    pub label: &'static str,
    pub completed: bool,
    pub reachable: bool,
    pub current: bool,
    pub optional: bool,
}

/// Cart line for the order summary.
#[derive(Clone)]
pub struct SummaryLine {
    pub title: String,
    pub quantity: u32,
    pub line_price: Price,
    pub deliverable: bool,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub tenant: String,
    pub steps: Vec<StepRow>,
    pub lines: Vec<SummaryLine>,
    pub subtotal: Price,
    pub item_count: u32,
    pub order_number: Option<String>,
}

/// Render the checkout page.
///
/// With `?cart_id=` the checkout is started (or resumed) for that cart.
#[instrument(skip(state, storage))]
pub async fn page(
    State(state): State<AppState>,
    Storage(storage): Storage,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let service = CheckoutService::new(state.api(), &storage);
    let checkout = match query.cart_id.as_deref() {
        Some(cart_id) => service.start(cart_id).await?,
        None => service.current().await?,
    };
    let cart = service.cart().await?;

    let current = checkout.current_step();
    let steps = checkout
        .progress()
        .into_iter()
        .map(|p| StepRow {
            label: p.step.label(),
            completed: p.completed,
            reachable: p.reachable,
            current: p.step == current,
            optional: p.optional,
        })
        .collect();
    let lines = cart
        .lines
        .iter()
        .map(|line| SummaryLine {
            title: line.title.clone(),
            quantity: line.quantity,
            line_price: Price::new(line.unit_price, cart.currency_code)
                .times(line.quantity),
            deliverable: line.delivery_eligible,
        })
        .collect();

    Ok(CheckoutTemplate {
        tenant: storage.tenant().to_string(),
        steps,
        lines,
        subtotal: cart.subtotal_price(),
        item_count: cart.item_count(),
        order_number: checkout.order().map(|o| o.order_number.clone()),
    })
}
