//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                     - Health check
//!
//! # Checkout page
//! GET  /{tenant}/checkout[?cart_id=]               - Checkout page (HTML)
//!
//! # Checkout API
//! GET  /{tenant}/api/checkout                      - Current checkout
//! POST /{tenant}/api/checkout                      - Start checkout for a cart
//! GET  /{tenant}/api/checkout/cart                 - Cart priced for the last location
//! POST /{tenant}/api/checkout/fulfillment          - Choose delivery or pickup
//! POST /{tenant}/api/checkout/shipping             - Select shipping address
//! POST /{tenant}/api/checkout/shipping/confirm-removal - Remove blocking lines
//! POST /{tenant}/api/checkout/shipping/cancel      - Drop the pending address
//! POST /{tenant}/api/checkout/recipient[/skip]     - Recipient details
//! POST /{tenant}/api/checkout/delivery-preferences[/skip]
//! POST /{tenant}/api/checkout/pickup               - Pickup details
//! POST /{tenant}/api/checkout/billing              - Billing address
//! POST /{tenant}/api/checkout/payment              - Payment method
//! POST /{tenant}/api/checkout/reopen               - Reopen a step
//! POST /{tenant}/api/checkout/place-order          - Place the order
//! GET  /{tenant}/api/checkout/shipping-methods
//! GET  /{tenant}/api/checkout/stores
//!
//! # Account API (strict rate limit)
//! POST /{tenant}/api/auth/check-email
//! POST /{tenant}/api/auth/login
//! POST /{tenant}/api/auth/otp                      - Send a one-time code
//! POST /{tenant}/api/auth/otp/resend               - 429 inside the cooldown
//! GET  /{tenant}/api/auth/otp/status               - Resend countdown
//! POST /{tenant}/api/auth/otp/verify
//! POST /{tenant}/api/auth/password/reset
//! POST /{tenant}/api/auth/password
//! POST /{tenant}/api/auth/guest
//! POST /{tenant}/api/auth/logout
//!
//! # Address book (requires sign-in)
//! GET   /{tenant}/api/addresses[?page&page_size&type&for]
//! POST  /{tenant}/api/addresses
//! PATCH /{tenant}/api/addresses/{id}
//! ```

pub mod addresses;
pub mod auth;
pub mod checkout;

use axum::{
    Router,
    extract::Request,
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, request_id_middleware};
use crate::state::AppState;

/// Build the full application router.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .nest("/{tenant}", tenant_routes())
        .layer(from_fn(request_id_middleware))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                tenant = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Routes nested under `/{tenant}`.
fn tenant_routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/checkout", checkout_routes())
        .nest("/addresses", address_routes())
        .layer(api_rate_limiter());

    Router::new()
        .route("/checkout", get(checkout::page))
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/api", api)
}

/// Create the checkout API routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::start))
        .route("/cart", get(checkout::cart))
        .route("/fulfillment", post(checkout::fulfillment))
        .route("/shipping", post(checkout::shipping))
        .route(
            "/shipping/confirm-removal",
            post(checkout::confirm_removal),
        )
        .route("/shipping/cancel", post(checkout::cancel_pending))
        .route("/recipient", post(checkout::recipient))
        .route("/recipient/skip", post(checkout::skip_recipient))
        .route(
            "/delivery-preferences",
            post(checkout::delivery_preferences),
        )
        .route(
            "/delivery-preferences/skip",
            post(checkout::skip_delivery_preferences),
        )
        .route("/pickup", post(checkout::pickup))
        .route("/billing", post(checkout::billing))
        .route("/payment", post(checkout::payment))
        .route("/reopen", post(checkout::reopen))
        .route("/place-order", post(checkout::place_order))
        .route("/shipping-methods", get(checkout::shipping_methods))
        .route("/stores", get(checkout::stores))
}

/// Create the account identification routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/check-email", post(auth::check_email))
        .route("/login", post(auth::login))
        .route("/otp", post(auth::request_otp))
        .route("/otp/resend", post(auth::resend_otp))
        .route("/otp/status", get(auth::otp_status))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/password/reset", post(auth::request_password_reset))
        .route("/password", post(auth::set_password))
        .route("/guest", post(auth::guest))
        .route("/logout", post(auth::logout))
}

/// Create the address book routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route("/{id}", patch(addresses::update))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
