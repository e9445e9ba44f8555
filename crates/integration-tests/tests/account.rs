//! Account identification and the address selector, end to end.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use orchard_integration_tests::spawn_storefront;
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn saved_address(id: i64, address_type: &str, is_default: bool) -> Value {
    json!({
        "id": id,
        "address_type": address_type,
        "is_default": is_default,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "line1": format!("{id} Analytical Way"),
        "city": "London",
        "postal_code": "N1 9GU",
        "country_code": "GB"
    })
}

#[tokio::test]
async fn test_otp_resend_cooldown_then_sign_in() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/auth/otp"))
        .and(body_json(json!({"email": "ada@example.com"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/auth/otp/resend"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/auth/otp/verify"))
        .and(body_json(json!({"email": "ada@example.com", "otp": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok_ada",
            "user": {"id": 9, "email": "ada@example.com", "first_name": "Ada"}
        })))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/addresses"))
        .and(header("authorization", "Bearer tok_ada"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                saved_address(1, "SHIPPING", false),
                saved_address(2, "SHIPPING", true),
                saved_address(3, "BILLING", false),
                saved_address(4, "BILLING", true)
            ],
            "total": 4,
            "page": 1,
            "pageSize": 25
        })))
        .mount(&api)
        .await;

    let app = spawn_storefront(&api, "203.0.113.20").await;

    let sent: Value = app
        .client
        .post(app.url("/acme/api/auth/otp"))
        .json(&json!({"email": "Ada@Example.com"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sent["can_resend"], false);
    assert!(sent["remaining_secs"].as_u64().unwrap() > 0);

    let response = app
        .client
        .post(app.url("/acme/api/auth/otp/resend"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert!(body["retry_after_secs"].as_u64().unwrap() > 0);

    // Addresses need a signed-in shopper.
    let response = app
        .client
        .get(app.url("/acme/api/addresses"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client
        .post(app.url("/acme/api/auth/otp/verify"))
        .json(&json!({"email": "ada@example.com", "otp": "123456"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page: Value = app
        .client
        .get(app.url("/acme/api/addresses?for=BILLING"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn test_malformed_otp_never_reaches_api() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/auth/otp/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;

    let app = spawn_storefront(&api, "203.0.113.21").await;
    let response = app
        .client
        .post(app.url("/acme/api/auth/otp/verify"))
        .json(&json!({"email": "ada@example.com", "otp": "12ab"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_sign_in_does_not_leak_across_tenants() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/auth/otp/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok_ada",
            "user": {"id": 9, "email": "ada@example.com"}
        })))
        .mount(&api)
        .await;

    let app = spawn_storefront(&api, "203.0.113.22").await;
    let response = app
        .client
        .post(app.url("/acme/api/auth/otp/verify"))
        .json(&json!({"email": "ada@example.com", "otp": "123456"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(app.url("/globex/api/addresses"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
