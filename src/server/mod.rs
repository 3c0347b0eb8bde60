//! HTTP server layer for the photo storefront.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │     GET /gallery/{photo_id}   POST /redeem   POST /purchases    │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌───────────────────┐   │
//! │  │  handlers   │  │     webhook      │  │      routes       │   │
//! │  │ (requests)  │  │ (HMAC signature) │  │  (router config)  │   │
//! │  └─────────────┘  └──────────────────┘  └───────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod webhook;

pub use handlers::{
    gallery_handler, health_handler, method_not_allowed, purchase_handler, redeem_handler,
    AppState, ErrorResponse, GalleryQueryParams, HealthResponse, PurchaseRequest, RedeemRequest,
};
pub use routes::{create_router, RouterConfig};
pub use webhook::{
    webhook_middleware, SignatureError, WebhookVerifier, DEFAULT_WEBHOOK_TOLERANCE,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
