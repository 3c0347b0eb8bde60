//! Gallery and redemption layer.
//!
//! Sits between the HTTP handlers and the resolver/entitlement stores:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             GalleryService              │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ action rules │  │  Pose labels    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └──────────┬─────────────────┬────────────┘
//!            ▼                 ▼
//!       Resolver        EntitlementStore
//! ```

mod actions;
mod service;

pub use actions::{decide_action, Action, ActionKind, ActionRule, AssetFacts, ACTION_RULES};
pub use service::{
    GalleryAsset, GalleryConfig, GalleryResponse, GalleryService, Pose, PurchaseResponse,
    RedeemResponse, DEFAULT_DOWNLOAD_FORMAT, DEFAULT_DOWNLOAD_TTL,
};
