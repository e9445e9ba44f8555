//! End-to-end checkout through the storefront router.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use orchard_integration_tests::{TestApp, spawn_storefront};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Fixtures
// =============================================================================

fn line(id: i64, title: &str, eligible: bool) -> Value {
    json!({
        "id": id,
        "product_id": id + 100,
        "title": title,
        "quantity": 1,
        "unit_price": "4.00",
        "delivery_eligible": eligible
    })
}

fn cart(lines: Vec<Value>) -> Value {
    json!({
        "id": "cart-1",
        "lines": lines,
        "currency_code": "USD",
        "subtotal": "8.00"
    })
}

fn address(address_type: &str) -> Value {
    json!({
        "address_type": address_type,
        "first_name": "Gale",
        "last_name": "Guest",
        "line1": "9 Orchard Way",
        "city": "Portland",
        "region": "OR",
        "postal_code": "97201",
        "country_code": "US"
    })
}

async fn post(app: &TestApp, path: &str, body: Value) -> (StatusCode, Value) {
    let response = app.client.post(app.url(path)).json(&body).send().await.unwrap();
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

async fn step(app: &TestApp, path: &str, body: Value) -> Value {
    let (status, body) = post(app, path, body).await;
    assert_eq!(status, StatusCode::OK, "{path}: {body}");
    body
}

async fn start_as_guest(app: &TestApp) {
    step(
        app,
        "/acme/api/auth/guest",
        json!({"email": "gale@example.com", "name": "Gale Guest"}),
    )
    .await;
    let checkout = step(app, "/acme/api/checkout", json!({"cart_id": "cart-1"})).await;
    assert_eq!(checkout["current_step"], "fulfillment");
}

// =============================================================================
// Home delivery
// =============================================================================

#[tokio::test]
async fn test_home_delivery_with_non_deliverable_removal() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/cart/cart-1"))
        .and(query_param("postal_code", "97201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart(vec![
            line(1, "Apples", true),
            line(2, "Ice Cream", false),
        ])))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/cart/cart-1/lines/remove"))
        .and(body_partial_json(json!({"line_ids": [2]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cart(vec![line(1, "Apples", true)])),
        )
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/orders"))
        .and(body_partial_json(json!({
            "cart_id": "cart-1",
            "is_guest": true,
            "fulfillment_method": "home_delivery",
            "billing_same_as_shipping": true,
            "payment_method": "cash_on_delivery"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 501, "order_number": "A-1001"})),
        )
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/cart/cart-1/invalidate"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api)
        .await;

    let app = spawn_storefront(&api, "198.51.100.10").await;
    start_as_guest(&app).await;

    step(&app, "/acme/api/checkout/fulfillment", json!({"method": "home_delivery"})).await;

    let proposed = step(
        &app,
        "/acme/api/checkout/shipping",
        json!({"source": "new", "address": address("SHIPPING")}),
    )
    .await;
    assert_eq!(proposed["outcome"]["status"], "needs_removal");
    assert_eq!(proposed["outcome"]["lines"][0]["title"], "Ice Cream");
    assert_eq!(proposed["checkout"]["current_step"], "shipping_address");

    let confirmed = step(&app, "/acme/api/checkout/shipping/confirm-removal", json!({})).await;
    assert_eq!(confirmed["outcome"]["status"], "completed");
    assert_eq!(confirmed["checkout"]["current_step"], "recipient_details");

    step(&app, "/acme/api/checkout/recipient/skip", json!({})).await;
    step(&app, "/acme/api/checkout/delivery-preferences/skip", json!({})).await;
    step(&app, "/acme/api/checkout/billing", json!({"source": "same_as_shipping"})).await;

    let (status, body) = post(
        &app,
        "/acme/api/checkout/payment",
        json!({"method": "pay_in_store"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let ready = step(
        &app,
        "/acme/api/checkout/payment",
        json!({"method": "cash_on_delivery"}),
    )
    .await;
    assert_eq!(ready["ready_to_submit"], true);

    let placed = step(&app, "/acme/api/checkout/place-order", json!({})).await;
    assert_eq!(placed["order"]["order_number"], "A-1001");
    assert_eq!(placed["checkout"]["current_step"], "submitted");

    let (status, _) = post(&app, "/acme/api/checkout/place-order", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_keeps_cart_and_drops_pending_address() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/cart/cart-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart(vec![line(
            2,
            "Ice Cream",
            false,
        )])))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/cart/cart-1/lines/remove"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&api)
        .await;

    let app = spawn_storefront(&api, "198.51.100.11").await;
    start_as_guest(&app).await;
    step(&app, "/acme/api/checkout/fulfillment", json!({"method": "home_delivery"})).await;
    step(
        &app,
        "/acme/api/checkout/shipping",
        json!({"source": "new", "address": address("SHIPPING")}),
    )
    .await;

    let cancelled = step(&app, "/acme/api/checkout/shipping/cancel", json!({})).await;
    assert_eq!(cancelled["cancelled"]["postal_code"], "97201");
    assert_eq!(cancelled["checkout"]["current_step"], "shipping_address");

    let (status, _) = post(&app, "/acme/api/checkout/shipping/confirm-removal", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Pickup
// =============================================================================

#[tokio::test]
async fn test_pickup_flow_skips_shipping() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/stores"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 7, "name": "Downtown"}])),
        )
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/orders"))
        .and(body_partial_json(json!({
            "fulfillment_method": "in_store_pickup",
            "payment_method": "pay_in_store",
            "pickup": {"store_id": 7}
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 502, "order_number": "A-1002"})),
        )
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/cart/cart-1/invalidate"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&api)
        .await;

    let app = spawn_storefront(&api, "198.51.100.12").await;
    start_as_guest(&app).await;

    let checkout = step(
        &app,
        "/acme/api/checkout/fulfillment",
        json!({"method": "in_store_pickup"}),
    )
    .await;
    assert_eq!(checkout["current_step"], "pickup_details");
    assert_eq!(checkout["payment_options"], json!(["online_card", "pay_in_store"]));

    // Cached after the first call.
    for _ in 0..2 {
        let stores: Value = app
            .client
            .get(app.url("/acme/api/checkout/stores"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stores[0]["name"], "Downtown");
    }

    let (status, _) = post(
        &app,
        "/acme/api/checkout/shipping",
        json!({"source": "new", "address": address("SHIPPING")}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    step(
        &app,
        "/acme/api/checkout/pickup",
        json!({"store_id": 7, "pickup_person": "Gale Guest", "phone": "555-0100"}),
    )
    .await;
    step(
        &app,
        "/acme/api/checkout/billing",
        json!({"source": "new", "address": address("BILLING")}),
    )
    .await;
    step(&app, "/acme/api/checkout/payment", json!({"method": "pay_in_store"})).await;

    let placed = step(&app, "/acme/api/checkout/place-order", json!({})).await;
    assert_eq!(placed["order"]["order_number"], "A-1002");
}

// =============================================================================
// Gate
// =============================================================================

#[tokio::test]
async fn test_out_of_order_step_is_refused() {
    let api = MockServer::start().await;
    let app = spawn_storefront(&api, "198.51.100.13").await;
    start_as_guest(&app).await;

    let (status, body) = post(
        &app,
        "/acme/api/checkout/billing",
        json!({"source": "same_as_shipping"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Billing address is not available until Delivery method is complete"
    );

    let (status, _) = post(&app, "/acme/api/checkout/place-order", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_checkout_is_scoped_to_tenant() {
    let api = MockServer::start().await;
    let app = spawn_storefront(&api, "198.51.100.14").await;
    start_as_guest(&app).await;

    let response = app
        .client
        .get(app.url("/acme/api/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same browser, other tenant: nothing started there.
    let response = app
        .client
        .get(app.url("/globex/api/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Other browser, same tenant.
    let stranger = app.new_visitor("198.51.100.15");
    let response = stranger
        .client
        .get(stranger.url("/acme/api/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
