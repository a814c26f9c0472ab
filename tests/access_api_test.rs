mod common;

use poem::http::StatusCode;
use rootsreach_backend::coordinators::AdminCoordinator;
use rootsreach_backend::types::internal::RequestContext;

const PASSWORD: &str = "carved-walnut-boxes";

async fn get_json(app: &common::TestApp, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .client
        .get(uri)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
    let status = response.0.status();
    let body = response.json().await.value().deserialize();
    (status, body)
}

#[tokio::test]
async fn test_access_check_reports_grants() {
    let app = common::spawn_app().await;
    app.register("cedar", PASSWORD, "artisan").await;
    let token = app.token("cedar", PASSWORD).await;

    let (status, body) = get_json(&app, "/api/access/check?resource=product&action=create", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "artisan");
    assert_eq!(body["scope"], "own");
    assert_eq!(body["allowed"], true);

    let (_, body) = get_json(&app, "/api/access/check?resource=user&action=delete&scope=own", &token).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["required_scope"], serde_json::Value::Null);

    let (_, body) = get_json(&app, "/api/access/check?resource=product&action=read&scope=all", &token).await;
    assert_eq!(body["allowed"], false);
    assert_eq!(body["required_scope"], "own");
}

#[tokio::test]
async fn test_access_check_rejects_unknown_tags() {
    let app = common::spawn_app().await;
    app.register("tagger", PASSWORD, "customer").await;
    let token = app.token("tagger", PASSWORD).await;

    let response = app
        .client
        .get("/api/access/check?resource=spaceship&action=read")
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_requirements_follow_identity_verification() {
    let app = common::spawn_app().await;
    let artisan = app.register("silversmith", PASSWORD, "artisan").await;
    let artisan_id = artisan["account_id"].as_str().unwrap().to_string();
    let token = app.token("silversmith", PASSWORD).await;

    let (status, body) = get_json(&app, "/api/access/requirements/productOperations", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["code"], "IDENTITY_VERIFICATION_REQUIRED");

    let admin = AdminCoordinator::new(app.app_data.clone());
    admin
        .create_admin(&RequestContext::for_cli("create-admin"), "registrar", "stamp-and-seal-99")
        .await
        .unwrap();
    let admin_token = app.token("registrar", "stamp-and-seal-99").await;

    app.client
        .post(format!("/api/admin/accounts/{}/verify-identity", artisan_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .body_json(&serde_json::json!({ "verified": true }))
        .send()
        .await
        .assert_status_is_ok();

    let (_, body) = get_json(&app, "/api/access/requirements/productOperations", &token).await;
    assert_eq!(body["valid"], true);
    assert!(body.get("code").is_none());
}

#[tokio::test]
async fn test_categories_without_a_bucket_are_valid() {
    let app = common::spawn_app().await;
    app.register("collector", PASSWORD, "customer").await;
    let token = app.token("collector", PASSWORD).await;

    let (_, body) = get_json(&app, "/api/access/requirements/productOperations", &token).await;
    assert_eq!(body["valid"], true);

    let (_, body) = get_json(&app, "/api/access/requirements/somethingElse", &token).await;
    assert_eq!(body["category"], "somethingElse");
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn test_customer_order_requirement_needs_an_address() {
    let app = common::spawn_app().await;
    app.register("shopper", PASSWORD, "customer").await;
    let token = app.token("shopper", PASSWORD).await;

    let (_, body) = get_json(&app, "/api/access/requirements/orderOperations", &token).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["code"], "ADDRESS_REQUIRED");

    app.client
        .post("/api/account/addresses")
        .header("Authorization", format!("Bearer {}", token))
        .body_json(&serde_json::json!({
            "line1": "12 Market Street",
            "city": "Cusco",
            "postal_code": "08002",
            "country": "PE",
        }))
        .send()
        .await
        .assert_status_is_ok();

    let (_, body) = get_json(&app, "/api/access/requirements/orderOperations", &token).await;
    assert_eq!(body["valid"], true);
}
