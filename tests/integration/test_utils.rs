//! Test utilities for integration tests.
//!
//! Provides an in-memory asset store with failure injection and helpers for
//! building routers and issuing requests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use photo_storefront::entitlement::InMemoryEntitlementStore;
use photo_storefront::error::StoreError;
use photo_storefront::gallery::GalleryService;
use photo_storefront::resolve::{Resolver, ResolverConfig};
use photo_storefront::server::{create_router, RouterConfig};
use photo_storefront::store::{AssetMetadata, AssetStore};

// =============================================================================
// Mock Asset Store
// =============================================================================

/// Injected failure for a single path.
struct Failure {
    error: StoreError,
    /// Remaining failing lookups; `None` fails forever
    remaining: Option<usize>,
}

/// An asset store that knows a fixed set of paths.
///
/// Every lookup is recorded so tests can assert probe order and counts.
#[derive(Default)]
pub struct MockAssetStore {
    assets: HashSet<String>,
    failures: Mutex<HashMap<String, Failure>>,
    delays: HashMap<String, Duration>,
    probe_count: AtomicUsize,
    probes: Mutex<Vec<String>>,
}

impl MockAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, public_id: impl Into<String>) -> Self {
        self.assets.insert(public_id.into());
        self
    }

    /// Fail the next `times` lookups of `public_id` with `error`.
    pub fn failing(self, public_id: impl Into<String>, error: StoreError, times: usize) -> Self {
        self.insert_failure(public_id.into(), error, Some(times))
    }

    /// Fail every lookup of `public_id` with `error`.
    pub fn always_failing(self, public_id: impl Into<String>, error: StoreError) -> Self {
        self.insert_failure(public_id.into(), error, None)
    }

    /// Delay every lookup of `public_id`.
    pub fn with_delay(mut self, public_id: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(public_id.into(), delay);
        self
    }

    fn insert_failure(self, public_id: String, error: StoreError, remaining: Option<usize>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(public_id, Failure { error, remaining });
        self
    }

    /// Total number of lookups.
    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    /// Lookups of one path.
    pub fn probes_of(&self, public_id: &str) -> usize {
        self.probes
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == public_id)
            .count()
    }

    /// Every looked-up path, in order.
    pub fn probed_paths(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    fn take_failure(&self, public_id: &str) -> Option<StoreError> {
        let mut failures = self.failures.lock().unwrap();
        let failure = failures.get_mut(public_id)?;
        match failure.remaining {
            None => Some(failure.error.clone()),
            Some(0) => None,
            Some(ref mut n) => {
                *n -= 1;
                Some(failure.error.clone())
            }
        }
    }
}

#[async_trait]
impl AssetStore for MockAssetStore {
    async fn resource(&self, public_id: &str) -> Result<AssetMetadata, StoreError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.probes.lock().unwrap().push(public_id.to_string());

        if let Some(delay) = self.delays.get(public_id) {
            tokio::time::sleep(*delay).await;
        }

        if let Some(error) = self.take_failure(public_id) {
            return Err(error);
        }

        if self.assets.contains(public_id) {
            Ok(AssetMetadata {
                public_id: public_id.to_string(),
                format: Some("jpg".to_string()),
                ..Default::default()
            })
        } else {
            Err(StoreError::NotFound(public_id.to_string()))
        }
    }

    fn preview_url(&self, public_id: &str) -> String {
        format!("https://cdn.test/preview/{}.jpg", public_id)
    }

    fn download_url(&self, public_id: &str, format: &str, ttl: Duration) -> String {
        format!(
            "https://api.test/download/{}.{}?ttl={}",
            public_id,
            format,
            ttl.as_secs()
        )
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Start date used by most tests.
pub fn event_date() -> NaiveDate {
    date(2025, 9, 28)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Month-qualified path, the first candidate form.
pub fn month_path(venue: &str, day: NaiveDate, id: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        venue,
        day.format("%Y"),
        day.format("%B/%m.%d.%Y"),
        id
    )
}

/// Month-omitted path, the second candidate form.
pub fn plain_path(venue: &str, day: NaiveDate, id: &str) -> String {
    format!("{}/{}/{}/{}", venue, day.format("%Y"), day.format("%m.%d.%Y"), id)
}

pub const MAIN_ID: &str = "CH0928251007";
pub const PREVIOUS_ID: &str = "CH0928251006";
pub const NEXT_ID: &str = "CH0928251008";

pub fn main_path() -> String {
    month_path("chiefs-luau", event_date(), MAIN_ID)
}

pub fn previous_path() -> String {
    month_path("chiefs-luau", event_date(), PREVIOUS_ID)
}

pub fn next_path() -> String {
    month_path("chiefs-luau", event_date(), NEXT_ID)
}

/// Store holding the main photo and both neighbors.
pub fn full_shoot() -> MockAssetStore {
    MockAssetStore::new()
        .with_asset(main_path())
        .with_asset(previous_path())
        .with_asset(next_path())
}

/// Path of `MAIN_ID` when it was shot today (UTC).
pub fn todays_main_path() -> String {
    month_path("chiefs-luau", Utc::now().date_naive(), MAIN_ID)
}

/// Store holding only a main photo shot today.
pub fn todays_shoot() -> MockAssetStore {
    MockAssetStore::new().with_asset(todays_main_path())
}

/// Small window and fast retries so misses finish quickly.
pub fn fast_resolver_config(lookback_days: u32) -> ResolverConfig {
    ResolverConfig::default()
        .with_lookback_days(lookback_days)
        .with_probe_timeout(Duration::from_millis(500))
        .with_retries(2, Duration::from_millis(1))
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MockAssetStore>,
    pub entitlements: Arc<InMemoryEntitlementStore>,
}

/// Build a router over `store` with a small search window.
pub fn test_app(store: MockAssetStore) -> TestApp {
    test_app_with(store, RouterConfig::new().with_tracing(false))
}

pub fn test_app_with(store: MockAssetStore, config: RouterConfig) -> TestApp {
    let store = Arc::new(store);
    let entitlements = Arc::new(InMemoryEntitlementStore::new());
    let resolver = Resolver::new(Arc::clone(&store), fast_resolver_config(3));
    let service = GalleryService::new(resolver, Arc::clone(&entitlements));

    TestApp {
        router: create_router(service, config),
        store,
        entitlements,
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Send a request and decode the JSON body (`Null` for an empty body).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub fn gallery_uri(photo_id: &str) -> String {
    format!("/gallery/{}?startDateISO=2025-09-28", photo_id)
}

pub fn redeem_body(photo_id: &str, public_id: &str) -> String {
    serde_json::json!({
        "photoId": photo_id,
        "publicId": public_id,
        "startDateISO": "2025-09-28",
    })
    .to_string()
}
