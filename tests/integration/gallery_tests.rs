//! Gallery endpoint integration tests.
//!
//! Tests verify:
//! - Asset order, labels, preview URLs, and photo-set id
//! - Neighbors that do not resolve are omitted
//! - Action transitions after redemption and purchase
//! - Error responses (unknown photo, bad start date)
//! - Health and CORS

use axum::body::Body;
use axum::http::{Request, StatusCode};

use photo_storefront::entitlement::{photo_set_id_from_public_id, EntitlementStore};

use super::test_utils::{
    full_shoot, gallery_uri, get_json, main_path, next_path, post_json, previous_path,
    redeem_body, send, test_app, todays_main_path, todays_shoot, MockAssetStore, MAIN_ID,
};

// =============================================================================
// Payload Shape
// =============================================================================

#[tokio::test]
async fn test_gallery_with_both_neighbors() {
    let app = test_app(full_shoot());

    let (status, body) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["photo_set_id"], photo_set_id_from_public_id(&main_path()));

    let assets = body["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 3);

    let labels: Vec<&str> = assets.iter().map(|a| a["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["Main Pose", "Previous pose", "Next pose"]);

    let ids: Vec<&str> = assets.iter().map(|a| a["publicId"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![main_path(), previous_path(), next_path()]);

    assert_eq!(
        assets[0]["previewUrl"],
        format!("https://cdn.test/preview/{}.jpg", main_path())
    );

    assert_eq!(assets[0]["action"]["type"], "free");
    assert_eq!(assets[0]["action"]["label"], "Get Free Download");
    assert!(assets[0]["action"]["url"].is_null());
    assert_eq!(assets[1]["action"]["type"], "buy");
    assert_eq!(assets[2]["action"]["type"], "buy");

    assert_eq!(body["entitlements"]["free_redeemed"], 0);
    assert!(body["entitlements"]["free_asset_public_id"].is_null());
}

#[tokio::test]
async fn test_gallery_without_neighbors() {
    let app = test_app(MockAssetStore::new().with_asset(main_path()));

    let (status, body) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;

    assert_eq!(status, StatusCode::OK);
    let assets = body["assets"].as_array().unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0]["label"], "Main Pose");
}

#[tokio::test]
async fn test_gallery_with_only_next_neighbor() {
    let app = test_app(
        MockAssetStore::new()
            .with_asset(main_path())
            .with_asset(next_path()),
    );

    let (_, body) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;

    let labels: Vec<&str> = body["assets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Main Pose", "Next pose"]);
}

#[tokio::test]
async fn test_gallery_is_stable_across_requests() {
    let app = test_app(full_shoot());

    let (_, first) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;
    let (_, second) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;

    assert_eq!(first, second);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_gallery_unknown_photo() {
    let app = test_app(MockAssetStore::new());

    let (status, body) = get_json(&app.router, &gallery_uri("CH0000000001")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Photo not found");
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_gallery_rejects_dot_segment_id() {
    let app = test_app(full_shoot());

    let (status, body) = get_json(&app.router, "/gallery/..").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Photo not found");
    assert_eq!(app.store.probe_count(), 0);
}

#[tokio::test]
async fn test_gallery_start_date_defaults_to_today() {
    let app = test_app(todays_shoot());

    let (status, body) = get_json(&app.router, &format!("/gallery/{}", MAIN_ID)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assets"][0]["publicId"], todays_main_path());
    assert_eq!(body["photo_set_id"], photo_set_id_from_public_id(&todays_main_path()));
}

#[tokio::test]
async fn test_gallery_blank_start_date_is_today() {
    let app = test_app(todays_shoot());

    let (status, body) =
        get_json(&app.router, &format!("/gallery/{}?startDateISO=", MAIN_ID)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assets"][0]["publicId"], todays_main_path());
}

#[tokio::test]
async fn test_gallery_invalid_start_date() {
    let app = test_app(full_shoot());

    let (status, body) =
        get_json(&app.router, &format!("/gallery/{}?startDateISO=not-a-date", MAIN_ID)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_start_date");
}

#[tokio::test]
async fn test_gallery_accepts_full_timestamp() {
    let app = test_app(full_shoot());

    let (status, _) = get_json(
        &app.router,
        &format!("/gallery/{}?startDateISO=2025-09-28T19:30:00Z", MAIN_ID),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Action Transitions
// =============================================================================

#[tokio::test]
async fn test_main_becomes_download_after_redeem() {
    let app = test_app(full_shoot());

    let (status, _) = post_json(&app.router, "/redeem", &redeem_body(MAIN_ID, &main_path())).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;
    let assets = body["assets"].as_array().unwrap();

    assert_eq!(assets[0]["action"]["type"], "download");
    assert_eq!(assets[0]["action"]["label"], "Download");
    assert_eq!(
        assets[0]["action"]["url"],
        format!("https://api.test/download/{}.jpg?ttl=900", main_path())
    );
    assert_eq!(assets[1]["action"]["type"], "buy");
    assert_eq!(assets[2]["action"]["type"], "buy");

    assert_eq!(body["entitlements"]["free_redeemed"], 1);
    assert_eq!(body["entitlements"]["free_asset_public_id"], main_path());
}

#[tokio::test]
async fn test_free_neighbor_is_downloadable_and_main_is_buy() {
    let app = test_app(full_shoot());

    let (status, _) = post_json(
        &app.router,
        "/redeem",
        &redeem_body(MAIN_ID, &previous_path()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;
    let assets = body["assets"].as_array().unwrap();

    assert_eq!(assets[0]["action"]["type"], "buy");
    assert_eq!(assets[1]["action"]["type"], "download");
    assert_eq!(assets[2]["action"]["type"], "buy");
}

#[tokio::test]
async fn test_purchased_neighbor_is_downloadable() {
    let app = test_app(full_shoot());
    let photo_set_id = photo_set_id_from_public_id(&main_path());
    app.entitlements
        .add_purchase(&photo_set_id, &next_path())
        .await
        .unwrap();

    let (_, body) = get_json(&app.router, &gallery_uri(MAIN_ID)).await;
    let assets = body["assets"].as_array().unwrap();

    // Free download is still unclaimed, so the main asset keeps its free action
    assert_eq!(assets[0]["action"]["type"], "free");
    assert_eq!(assets[1]["action"]["type"], "buy");
    assert_eq!(assets[2]["action"]["type"], "download");
    assert!(assets[2]["action"]["url"]
        .as_str()
        .unwrap()
        .contains(&next_path()));
}

// =============================================================================
// Health and CORS
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = test_app(MockAssetStore::new());

    let (status, body) = get_json(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = test_app(full_shoot());

    let request = Request::builder()
        .uri(gallery_uri(MAIN_ID))
        .header("origin", "https://shop.example.com")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_preflight_for_redeem() {
    let app = test_app(MockAssetStore::new());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/redeem")
        .header("origin", "https://shop.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
}
