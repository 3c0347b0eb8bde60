//! # Photo Storefront
//!
//! Gallery and free-download backend for event photos stored in Cloudinary.
//!
//! Guests know a loose photo id printed on a card (`CH0928251007`). The
//! backend finds the stored asset by probing date-organized paths, shows it
//! next to its neighboring poses with watermarked previews, lets each photo
//! set claim one free full-resolution download, and sells the rest.
//!
//! ## Features
//!
//! - **Photo id resolution**: Lazy, ordered candidate search over a lookback window,
//!   with per-probe timeouts, retries on transient errors, and a hit cache
//! - **Neighbor poses**: Previous and next photo ids resolved concurrently
//! - **One free download per photo set**: Claimed atomically via compare-and-set
//! - **Purchases**: HMAC-signed webhook that records bought assets
//!
//! ## Architecture
//!
//! - [`store`] - Asset store trait and Cloudinary client
//! - [`resolve`] - Candidate paths, neighbor ids, and the resolver
//! - [`entitlement`] - Free-download and purchase state
//! - [`gallery`] - Gallery/redeem orchestration and action rules
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use photo_storefront::{
//!     create_router, CloudinaryConfig, CloudinaryStore, GalleryService,
//!     InMemoryEntitlementStore, Resolver, ResolverConfig, RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = CloudinaryStore::new(CloudinaryConfig::new("demo", "key", "secret")).unwrap();
//!     let resolver = Resolver::new(Arc::new(store), ResolverConfig::default());
//!     let service = GalleryService::new(resolver, Arc::new(InMemoryEntitlementStore::new()));
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod entitlement;
pub mod error;
pub mod gallery;
pub mod resolve;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ResolverArgs, ServeConfig, StoreArgs};
pub use entitlement::{
    photo_set_id_from_public_id, Entitlement, EntitlementStore, InMemoryEntitlementStore,
    PHOTO_SET_ID_PREFIX,
};
pub use error::{EntitlementError, GalleryError, StoreError};
pub use gallery::{
    decide_action, Action, ActionKind, GalleryAsset, GalleryConfig, GalleryResponse,
    GalleryService, Pose, PurchaseResponse, RedeemResponse,
};
pub use resolve::{
    neighbor_ids, parse_start_date, venue_from_id, CandidatePaths, IdCasing, Resolver,
    ResolverConfig, Venue,
};
pub use server::{
    create_router, health_handler, AppState, ErrorResponse, HealthResponse, RouterConfig,
    SignatureError, WebhookVerifier,
};
pub use store::{
    AssetMetadata, AssetStore, CloudinaryConfig, CloudinaryStore, SignatureAlgorithm,
};
