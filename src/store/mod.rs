//! Asset store abstraction.
//!
//! The gallery never talks to a storage provider directly. Everything it needs
//! goes through the [`AssetStore`] trait:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Resolver / GalleryService        │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            AssetStore Trait             │
//! │  resource() · preview_url() ·           │
//! │  download_url()                         │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            CloudinaryStore              │
//! │  (Admin API lookups, signed downloads)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Tests substitute an in-memory store that knows a fixed set of paths.

mod cloudinary;
pub mod signing;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use cloudinary::{
    CloudinaryConfig, CloudinaryStore, DEFAULT_API_BASE_URL, DEFAULT_DELIVERY_BASE_URL,
    DEFAULT_PREVIEW_OVERLAY, DEFAULT_PREVIEW_SIZE,
};
pub use signing::SignatureAlgorithm;

/// Metadata returned by a successful asset lookup.
///
/// Only `public_id` is guaranteed; the remaining fields are whatever the
/// provider chose to report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub public_id: String,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub bytes: Option<u64>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// Operations the gallery needs from a remote asset store.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Look up an asset by its storage path.
    ///
    /// Returns `StoreError::NotFound` when the store confirms the asset is
    /// absent. Any other error means existence could not be checked.
    async fn resource(&self, public_id: &str) -> Result<AssetMetadata, StoreError>;

    /// Watermarked, size-limited preview URL for an asset.
    fn preview_url(&self, public_id: &str) -> String;

    /// Signed, time-limited URL that forces a download of the original.
    fn download_url(&self, public_id: &str, format: &str, ttl: Duration) -> String;
}
