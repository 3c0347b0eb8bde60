//! Router configuration for the photo storefront.
//!
//! # Route Structure
//!
//! ```text
//! /health                  - Health check
//! /gallery/{photo_id}      - Gallery for a photo id
//! /redeem                  - Free download redemption (POST only)
//! /purchases               - Purchase confirmation webhook (signed, optional)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use photo_storefront::server::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://shop.example.com".to_string()])
//!     .with_webhook_secret("whsec");
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderName, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    gallery_handler, health_handler, method_not_allowed, purchase_handler, redeem_handler,
    AppState,
};
use super::webhook::{
    webhook_middleware, WebhookVerifier, DEFAULT_WEBHOOK_TOLERANCE, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};
use crate::entitlement::EntitlementStore;
use crate::gallery::GalleryService;
use crate::store::AssetStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Shared secret for purchase webhooks (None = `/purchases` not mounted)
    pub webhook_secret: Option<String>,

    /// Accepted clock skew for webhook signatures
    pub webhook_tolerance: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - The purchase webhook is disabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            webhook_secret: None,
            webhook_tolerance: DEFAULT_WEBHOOK_TOLERANCE,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Mount `/purchases`, verified with `secret`.
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_webhook_tolerance(mut self, tolerance: Duration) -> Self {
        self.webhook_tolerance = tolerance;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Gallery, redeem, and health routes
/// - The signed purchase webhook when a secret is configured
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<S, E>(service: GalleryService<S, E>, config: RouterConfig) -> Router
where
    S: AssetStore + 'static,
    E: EntitlementStore + 'static,
{
    let app_state = AppState::new(service);
    let cors = build_cors_layer(&config);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/gallery/{photo_id}", get(gallery_handler::<S, E>))
        .route(
            "/redeem",
            post(redeem_handler::<S, E>).fallback(method_not_allowed),
        );

    if let Some(secret) = config.webhook_secret.as_deref().filter(|s| !s.is_empty()) {
        let verifier = WebhookVerifier::new(secret, config.webhook_tolerance);
        let purchases = Router::new()
            .route(
                "/purchases",
                post(purchase_handler::<S, E>).fallback(method_not_allowed),
            )
            .route_layer(middleware::from_fn_with_state(verifier, webhook_middleware));
        router = router.merge(purchases);
    }

    let router = router.with_state(app_state).layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(SIGNATURE_HEADER),
            HeaderName::from_static(TIMESTAMP_HEADER),
        ])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
