//! Admin grids against a mocked service-management API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use orchard_integration_tests::{SERVICE_TOKEN, spawn_admin};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(items: Value, total: u64, page: u32, page_size: u32) -> Value {
    json!({"items": items, "total": total, "page": page, "pageSize": page_size})
}

fn group(id: i64, name: &str, code: &str) -> Value {
    json!({"id": id, "name": name, "code": code, "active": true})
}

fn group_options(grid: &Value) -> Vec<String> {
    grid["table"]["filters"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["key"] == "process_group_id")
        .unwrap()["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["label"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_sop_tab_becomes_remote_filter() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/processes"))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), 0, 1, 100)))
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/sops"))
        .and(header("authorization", format!("Bearer {SERVICE_TOKEN}").as_str()))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "25"))
        .and(query_param("status", "published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([{
                "id": 4,
                "title": "Receiving pallets",
                "version": "2.1",
                "status": "published",
                "updated_at": "2026-03-02T09:30:00Z"
            }]),
            1,
            1,
            25,
        )))
        .expect(1)
        .mount(&api)
        .await;

    let admin = spawn_admin(&api).await;
    let response = admin
        .client
        .get(admin.url("/acme/sops?tab=published"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = response.text().await.unwrap();
    assert!(html.contains("Receiving pallets"));
    assert!(html.contains("Mar 2, 2026"));
}

#[tokio::test]
async fn test_create_refreshes_lookup_options() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/process-groups"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([group(1, "Fulfilment", "FUL")]), 1, 1, 100)),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/process-groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            json!([group(1, "Fulfilment", "FUL"), group(2, "Returns", "RET")]),
            2,
            1,
            100,
        )))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/acme/process-groups"))
        .and(body_json(json!({
            "name": "Returns",
            "code": "RET",
            "description": null,
            "active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(group(2, "Returns", "RET")))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/acme/processes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), 0, 1, 25)))
        .mount(&api)
        .await;

    let admin = spawn_admin(&api).await;

    let grid: Value = admin
        .client
        .get(admin.url("/acme/api/processes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(group_options(&grid), vec!["Fulfilment"]);

    let response = admin
        .client
        .post(admin.url("/acme/api/process-groups"))
        .json(&json!({"name": "Returns", "code": "RET"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let grid: Value = admin
        .client
        .get(admin.url("/acme/api/processes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(group_options(&grid), vec!["Fulfilment", "Returns"]);
}

#[tokio::test]
async fn test_remote_conflict_surfaces_field_errors() {
    let api = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/acme/functions/3"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Code already in use",
            "errors": [{"field": "code", "message": "already in use"}]
        })))
        .mount(&api)
        .await;

    let admin = spawn_admin(&api).await;
    let response = admin
        .client
        .patch(admin.url("/acme/api/functions/3"))
        .json(&json!({"code": "PICK"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Code already in use");
    assert_eq!(body["fields"][0]["field"], "code");
}

#[tokio::test]
async fn test_unknown_tab_is_bad_request() {
    let api = MockServer::start().await;
    let admin = spawn_admin(&api).await;
    let response = admin
        .client
        .get(admin.url("/acme/api/inventory?tab=expired"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
