//! Cloudinary-backed asset store.
//!
//! Existence checks use the Admin API resource lookup with HTTP basic auth.
//! Preview and download URLs are built locally: previews are plain delivery
//! URLs with a watermark transformation, downloads are signed API URLs that
//! expire and force an attachment.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

use crate::error::StoreError;

use super::signing::{api_signature, SignatureAlgorithm};
use super::{AssetMetadata, AssetStore};

/// Admin API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

/// Delivery (CDN) base URL.
pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

/// Tiled watermark overlay applied to every preview.
pub const DEFAULT_PREVIEW_OVERLAY: &str =
    "l_overlays:sample_word,fl_tiled,fl_relative,w_1.0,h_1.0,o_60";

/// Size and quality transformation applied to every preview.
pub const DEFAULT_PREVIEW_SIZE: &str = "q_auto,f_auto,w_1400";

/// Connection settings for a Cloudinary account.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base_url: String,
    pub delivery_base_url: String,
    pub preview_overlay: String,
    pub preview_size: String,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryConfig {
    /// Create a configuration with the default endpoints and transformations.
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            delivery_base_url: DEFAULT_DELIVERY_BASE_URL.to_string(),
            preview_overlay: DEFAULT_PREVIEW_OVERLAY.to_string(),
            preview_size: DEFAULT_PREVIEW_SIZE.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    /// Point the client at a different Admin API host.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point preview URLs at a different delivery host.
    pub fn with_delivery_base_url(mut self, url: impl Into<String>) -> Self {
        self.delivery_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sign download URLs with the account's configured digest.
    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }
}

/// Error body returned by the Admin API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorMessage {
    message: String,
}

/// Asset store backed by the Cloudinary Admin API.
#[derive(Clone)]
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: Arc<CloudinaryConfig>,
}

impl CloudinaryStore {
    /// Create a store for the given account.
    pub fn new(config: CloudinaryConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("photo-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Get the account configuration.
    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    /// Verify that the credentials are accepted by the Admin API.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let url = format!(
            "{}/v1_1/{}/ping",
            self.config.api_base_url, self.config.cloud_name
        );
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response, "ping").await)
        }
    }

    /// Build a signed download URL with explicit timestamps.
    ///
    /// `download_url` calls this with the current time; tests call it directly
    /// to get stable output.
    pub fn signed_download_url(
        &self,
        public_id: &str,
        format: &str,
        timestamp: u64,
        expires_at: u64,
    ) -> String {
        let timestamp = timestamp.to_string();
        let expires_at = expires_at.to_string();
        let params = [
            ("attachment", "true"),
            ("expires_at", expires_at.as_str()),
            ("format", format),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("type", "upload"),
        ];
        let signature = api_signature(
            &params,
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair("api_key", &self.config.api_key);
        for (key, value) in params {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("signature", &signature);

        format!(
            "{}/v1_1/{}/image/download?{}",
            self.config.api_base_url,
            self.config.cloud_name,
            serializer.finish()
        )
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn resource(&self, public_id: &str) -> Result<AssetMetadata, StoreError> {
        // URL normalisation would resolve these before the request is sent
        if has_dot_segment(public_id) {
            return Err(StoreError::NotFound(public_id.to_string()));
        }

        let url = format!(
            "{}/v1_1/{}/resources/image/upload/{}",
            self.config.api_base_url,
            self.config.cloud_name,
            encode_public_id(public_id)
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        if response.status().is_success() {
            return response
                .json::<AssetMetadata>()
                .await
                .map_err(|e| StoreError::Parse(e.to_string()));
        }

        Err(error_from_response(response, public_id).await)
    }

    fn preview_url(&self, public_id: &str) -> String {
        format!(
            "{}/{}/image/upload/{}/{}/{}.jpg",
            self.config.delivery_base_url,
            self.config.cloud_name,
            self.config.preview_overlay,
            self.config.preview_size,
            encode_public_id(public_id)
        )
    }

    fn download_url(&self, public_id: &str, format: &str, ttl: Duration) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.signed_download_url(public_id, format, now, now + ttl.as_secs())
    }
}

/// Percent-encode each path segment of a public id, keeping the slashes.
fn encode_public_id(public_id: &str) -> String {
    public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether any path segment of `public_id` is `.` or `..`.
fn has_dot_segment(public_id: &str) -> bool {
    public_id
        .split(['/', '\\'])
        .any(|segment| segment == "." || segment == "..")
}

/// Map a non-success Admin API response to a `StoreError`.
async fn error_from_response(response: reqwest::Response, public_id: &str) -> StoreError {
    let status = response.status().as_u16();

    match status {
        404 => StoreError::NotFound(public_id.to_string()),
        401 | 403 => StoreError::Unauthorized(status),
        // The Admin API reports rate limiting as 420
        420 | 429 => StoreError::RateLimited,
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            debug!(status, public_id, "Asset store returned error: {}", message);
            StoreError::Api { status, message }
        }
    }
}
