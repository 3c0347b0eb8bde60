//! Gallery service.
//!
//! Orchestrates a gallery view or a free redemption:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         GalleryService                          │
//! │  gallery():  1. Resolve main id     4. Read entitlement state   │
//! │              2. Neighbor ids        5. Decide action per asset  │
//! │              3. Resolve neighbors   6. Build preview/download   │
//! │                 (concurrently)         URLs                     │
//! │                                                                 │
//! │  redeem():   resolve → check → compare-and-set → download URL   │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                      │                       │
//!          ▼                      ▼                       ▼
//!     ┌──────────┐      ┌──────────────────┐      ┌──────────────┐
//!     │ Resolver │      │ EntitlementStore │      │  AssetStore  │
//!     └──────────┘      └──────────────────┘      └──────────────┘
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::entitlement::{
    photo_set_id_from_public_id, Entitlement, EntitlementStore, PHOTO_SET_ID_PREFIX,
};
use crate::error::GalleryError;
use crate::resolve::{neighbor_ids, Resolver};
use crate::store::AssetStore;

use super::actions::{decide_action, Action, ActionKind, AssetFacts};

/// Default lifetime of a signed download URL (15 minutes).
pub const DEFAULT_DOWNLOAD_TTL: Duration = Duration::from_secs(15 * 60);

/// Default file format of downloaded originals.
pub const DEFAULT_DOWNLOAD_FORMAT: &str = "jpg";

/// Download settings for the gallery.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub download_ttl: Duration,
    pub download_format: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            download_ttl: DEFAULT_DOWNLOAD_TTL,
            download_format: DEFAULT_DOWNLOAD_FORMAT.to_string(),
        }
    }
}

/// Position of an asset relative to the requested photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Main,
    Previous,
    Next,
}

impl Pose {
    pub fn label(&self) -> &'static str {
        match self {
            Pose::Main => "Main Pose",
            Pose::Previous => "Previous pose",
            Pose::Next => "Next pose",
        }
    }
}

/// One asset in the gallery payload.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryAsset {
    pub label: &'static str,

    #[serde(rename = "publicId")]
    pub public_id: String,

    #[serde(rename = "previewUrl")]
    pub preview_url: String,

    pub action: Action,
}

/// Response of `GET /gallery/{photoId}`.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryResponse {
    pub photo_set_id: String,
    pub assets: Vec<GalleryAsset>,
    pub entitlements: Entitlement,
}

/// Response of `POST /redeem`.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemResponse {
    pub photo_set_id: String,

    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

/// Response of `POST /purchases`.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub photo_set_id: String,

    #[serde(rename = "publicId")]
    pub public_id: String,

    /// `false` when the asset was already owned
    pub newly_purchased: bool,
}

/// Gallery and redemption logic over an asset store and an entitlement store.
pub struct GalleryService<S: AssetStore, E: EntitlementStore> {
    resolver: Resolver<S>,
    entitlements: Arc<E>,
    config: GalleryConfig,
}

impl<S: AssetStore, E: EntitlementStore> GalleryService<S, E> {
    pub fn new(resolver: Resolver<S>, entitlements: Arc<E>) -> Self {
        Self::with_config(resolver, entitlements, GalleryConfig::default())
    }

    pub fn with_config(resolver: Resolver<S>, entitlements: Arc<E>, config: GalleryConfig) -> Self {
        Self {
            resolver,
            entitlements,
            config,
        }
    }

    pub fn resolver(&self) -> &Resolver<S> {
        &self.resolver
    }

    pub fn entitlements(&self) -> &Arc<E> {
        &self.entitlements
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    /// Build the gallery for `photo_id`.
    ///
    /// Only the main photo is required. Neighbors that do not resolve are left
    /// out of the payload.
    pub async fn gallery(
        &self,
        photo_id: &str,
        start: Option<NaiveDate>,
    ) -> Result<GalleryResponse, GalleryError> {
        let main = self
            .resolver
            .resolve(photo_id, start)
            .await
            .ok_or(GalleryError::PhotoNotFound)?;

        let (previous_id, next_id) = neighbor_ids(photo_id);
        let (previous, next) = tokio::join!(
            self.resolver.resolve(&previous_id, start),
            self.resolver.resolve(&next_id, start),
        );

        let photo_set_id = photo_set_id_from_public_id(&main);
        let entitlement = self.entitlements.get(&photo_set_id).await?;
        let purchased = self.entitlements.purchased(&photo_set_id).await?;

        let assets: Vec<GalleryAsset> = [
            (Pose::Main, Some(main)),
            (Pose::Previous, previous),
            (Pose::Next, next),
        ]
        .into_iter()
        .filter_map(|(pose, public_id)| {
            public_id.map(|id| self.build_asset(pose, id, &entitlement, &purchased))
        })
        .collect();

        debug!(
            photo_id,
            photo_set_id = %photo_set_id,
            assets = assets.len(),
            "Built gallery"
        );

        Ok(GalleryResponse {
            photo_set_id,
            assets,
            entitlements: entitlement,
        })
    }

    /// Claim the free download of the photo set containing `photo_id`.
    ///
    /// The check and the write happen as one compare-and-set, so of several
    /// concurrent redemptions exactly one succeeds.
    pub async fn redeem(
        &self,
        photo_id: &str,
        public_id: &str,
        start: Option<NaiveDate>,
    ) -> Result<RedeemResponse, GalleryError> {
        if photo_id.is_empty() || public_id.is_empty() {
            return Err(GalleryError::MissingFields);
        }

        let main = self
            .resolver
            .resolve(photo_id, start)
            .await
            .ok_or(GalleryError::PhotoNotFound)?;
        let photo_set_id = photo_set_id_from_public_id(&main);

        let current = self.entitlements.get(&photo_set_id).await?;
        if current.free_redeemed {
            return Err(GalleryError::AlreadyRedeemed);
        }

        let redeemed = Entitlement::redeemed(public_id, Utc::now());
        let claimed = self
            .entitlements
            .compare_and_set(&photo_set_id, &current, redeemed)
            .await?;
        if !claimed {
            debug!(photo_set_id = %photo_set_id, "Lost redemption race");
            return Err(GalleryError::AlreadyRedeemed);
        }

        info!(photo_set_id = %photo_set_id, public_id, "Free download redeemed");

        Ok(RedeemResponse {
            download_url: self.download_url(public_id),
            photo_set_id,
        })
    }

    /// Record a confirmed purchase of `public_id` within a photo set.
    pub async fn record_purchase(
        &self,
        photo_set_id: &str,
        public_id: &str,
    ) -> Result<PurchaseResponse, GalleryError> {
        if photo_set_id.is_empty() || public_id.is_empty() {
            return Err(GalleryError::InvalidBody(
                "photo_set_id and publicId required".to_string(),
            ));
        }
        if !photo_set_id.starts_with(PHOTO_SET_ID_PREFIX) {
            return Err(GalleryError::InvalidBody(format!(
                "photo_set_id must start with {}",
                PHOTO_SET_ID_PREFIX
            )));
        }

        let newly_purchased = self
            .entitlements
            .add_purchase(photo_set_id, public_id)
            .await?;

        info!(photo_set_id, public_id, newly_purchased, "Purchase recorded");

        Ok(PurchaseResponse {
            photo_set_id: photo_set_id.to_string(),
            public_id: public_id.to_string(),
            newly_purchased,
        })
    }

    fn build_asset(
        &self,
        pose: Pose,
        public_id: String,
        entitlement: &Entitlement,
        purchased: &HashSet<String>,
    ) -> GalleryAsset {
        let facts = AssetFacts {
            is_main: pose == Pose::Main,
            free_redeemed: entitlement.free_redeemed,
            is_free_asset: entitlement.is_free_asset(&public_id),
            is_purchased: purchased.contains(&public_id),
        };

        let kind = decide_action(&facts);
        let url = match kind {
            ActionKind::Download => Some(self.download_url(&public_id)),
            ActionKind::Free | ActionKind::Buy => None,
        };

        GalleryAsset {
            label: pose.label(),
            preview_url: self.resolver.store().preview_url(&public_id),
            action: Action::new(kind, url),
            public_id,
        }
    }

    fn download_url(&self, public_id: &str) -> String {
        self.resolver.store().download_url(
            public_id,
            &self.config.download_format,
            self.config.download_ttl,
        )
    }
}
