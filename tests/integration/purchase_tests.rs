//! Purchase webhook integration tests.
//!
//! Tests verify:
//! - The webhook is only mounted when a secret is configured
//! - Valid signatures record purchases
//! - Missing, tampered, and stale signatures are rejected
//! - Purchased assets show a download action in the gallery

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{Request, StatusCode};

use photo_storefront::entitlement::{photo_set_id_from_public_id, EntitlementStore};
use photo_storefront::server::{RouterConfig, WebhookVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

use super::test_utils::{
    full_shoot, gallery_uri, get_json, main_path, next_path, post_json, send, test_app,
    test_app_with, TestApp, MAIN_ID,
};

const SECRET: &str = "test-webhook-secret";

fn webhook_app() -> TestApp {
    test_app_with(
        full_shoot(),
        RouterConfig::new()
            .with_tracing(false)
            .with_webhook_secret(SECRET),
    )
}

fn verifier() -> WebhookVerifier {
    WebhookVerifier::new(SECRET, Duration::from_secs(300))
}

fn purchase_body(public_id: &str) -> String {
    serde_json::json!({
        "photo_set_id": photo_set_id_from_public_id(&main_path()),
        "publicId": public_id,
    })
    .to_string()
}

fn signed_request(body: &str, timestamp: u64, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/purchases")
        .header("content-type", "application/json")
        .header(TIMESTAMP_HEADER, timestamp.to_string())
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn sign_now(body: &str) -> Request<Body> {
    let (signature, timestamp) = verifier().sign_now(body.as_bytes());
    signed_request(body, timestamp, &signature)
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// =============================================================================
// Mounting
// =============================================================================

#[tokio::test]
async fn test_purchases_not_mounted_without_secret() {
    let app = test_app(full_shoot());

    let (status, _) = post_json(&app.router, "/purchases", &purchase_body(&next_path())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Valid Signatures
// =============================================================================

#[tokio::test]
async fn test_signed_purchase_is_recorded() {
    let app = webhook_app();
    let body = purchase_body(&next_path());

    let (status, json) = send(&app.router, sign_now(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["publicId"], next_path());
    assert_eq!(json["newly_purchased"], true);

    let purchased = app
        .entitlements
        .purchased(&photo_set_id_from_public_id(&main_path()))
        .await
        .unwrap();
    assert!(purchased.contains(&next_path()));
}

#[tokio::test]
async fn test_repeated_purchase_is_idempotent() {
    let app = webhook_app();
    let body = purchase_body(&next_path());

    let (_, first) = send(&app.router, sign_now(&body)).await;
    let (status, second) = send(&app.router, sign_now(&body)).await;

    assert_eq!(first["newly_purchased"], true);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["newly_purchased"], false);
}

#[tokio::test]
async fn test_purchased_asset_downloadable_in_gallery() {
    let app = webhook_app();
    let (status, _) = send(&app.router, sign_now(&purchase_body(&next_path()))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, gallery) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;
    let assets = gallery["assets"].as_array().unwrap();

    assert_eq!(assets[0]["action"]["type"], "free");
    assert_eq!(assets[1]["action"]["type"], "buy");
    assert_eq!(assets[2]["action"]["type"], "download");
}

#[tokio::test]
async fn test_signed_but_invalid_body() {
    let app = webhook_app();

    let missing = r#"{"publicId":"a/b"}"#;
    let (status, json) = send(&app.router, sign_now(missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_body");

    let wrong_prefix = r#"{"photo_set_id":"abc","publicId":"a/b"}"#;
    let (status, _) = send(&app.router, sign_now(wrong_prefix)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Rejected Signatures
// =============================================================================

#[tokio::test]
async fn test_missing_signature_rejected() {
    let app = webhook_app();

    let (status, json) = post_json(&app.router, "/purchases", &purchase_body(&next_path())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "missing_signature");
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let app = webhook_app();
    let (signature, timestamp) = verifier().sign_now(purchase_body(&next_path()).as_bytes());

    let forged = purchase_body(&main_path());
    let (status, json) = send(&app.router, signed_request(&forged, timestamp, &signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "invalid_signature");

    let purchased = app
        .entitlements
        .purchased(&photo_set_id_from_public_id(&main_path()))
        .await
        .unwrap();
    assert!(purchased.is_empty());
}

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let app = webhook_app();
    let body = purchase_body(&next_path());
    let (signature, timestamp) =
        WebhookVerifier::new("other-secret", Duration::from_secs(300)).sign_now(body.as_bytes());

    let (status, _) = send(&app.router, signed_request(&body, timestamp, &signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stale_signature_rejected() {
    let app = webhook_app();
    let body = purchase_body(&next_path());
    let old = now() - 3600;
    let signature = verifier().sign(old, body.as_bytes());

    let (status, json) = send(&app.router, signed_request(&body, old, &signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "stale_signature");
}

#[tokio::test]
async fn test_malformed_signature_rejected() {
    let app = webhook_app();
    let body = purchase_body(&next_path());

    let (status, _) = send(&app.router, signed_request(&body, now(), "zz-not-hex")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_purchases_wrong_method() {
    let app = webhook_app();

    let request = Request::builder()
        .uri("/purchases")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;

    // The signature check wraps the whole route, so it answers first
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
