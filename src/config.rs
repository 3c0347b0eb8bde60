//! Configuration management for the photo storefront.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (a `.env` file is loaded by the binary)
//! - Sensible defaults for all optional settings
//!
//! # Subcommands
//!
//! - `serve` (default) - Start the HTTP server
//! - `check` - Verify asset store credentials, optionally resolve a photo id
//!
//! # Environment Variables
//!
//! - `GALLERY_HOST` - Server bind address (default: 0.0.0.0)
//! - `GALLERY_PORT` - Server port (default: 3000)
//! - `GALLERY_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `CLOUDINARY_CLOUD_NAME` - Cloud name (default: demo)
//! - `CLOUDINARY_KEY` / `CLOUDINARY_SECRET` - Admin API credentials
//! - `GALLERY_LOOKBACK_DAYS` - Days searched backwards from the start date (default: 90)
//! - `GALLERY_PROBE_TIMEOUT_MS` - Per-probe timeout (default: 5000)
//! - `GALLERY_PURCHASE_WEBHOOK_SECRET` - Enables `POST /purchases`

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::gallery::{GalleryConfig, DEFAULT_DOWNLOAD_FORMAT, DEFAULT_DOWNLOAD_TTL};
use crate::resolve::{
    ResolverConfig, DEFAULT_LOOKBACK_DAYS, DEFAULT_PROBE_RETRIES, DEFAULT_RESOLUTION_CACHE_CAPACITY,
};
use crate::store::{CloudinaryConfig, SignatureAlgorithm};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Cloud name used when none is configured.
pub const DEFAULT_CLOUD_NAME: &str = "demo";

/// Default per-probe timeout in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

/// Default base retry delay in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Default accepted webhook clock skew in seconds.
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// Upper bound on the lookback window (roughly three years).
const MAX_LOOKBACK_DAYS: u32 = 1100;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Photo storefront - gallery and free-download backend for event photos.
///
/// Resolves loose photo ids against a Cloudinary account, offers one free
/// download per photo set, and sells the rest.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-storefront")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server options when no subcommand is given
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The command to run. Without a subcommand the server starts.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeConfig),

    /// Check asset store credentials and optionally resolve a photo id
    Check(CheckConfig),
}

/// Asset store connection options.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Cloudinary cloud name.
    #[arg(long, default_value = DEFAULT_CLOUD_NAME, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloud_name: String,

    /// Cloudinary Admin API key.
    #[arg(long, env = "CLOUDINARY_KEY")]
    pub api_key: Option<String>,

    /// Cloudinary Admin API secret.
    #[arg(long, env = "CLOUDINARY_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Custom Admin API base URL.
    #[arg(long, env = "CLOUDINARY_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Custom delivery (CDN) base URL for previews.
    #[arg(long, env = "CLOUDINARY_DELIVERY_BASE_URL")]
    pub delivery_base_url: Option<String>,

    /// Digest the account uses for API signatures (sha1 or sha256).
    #[arg(long, default_value = "sha1", env = "CLOUDINARY_SIGNATURE_ALGORITHM")]
    pub signature_algorithm: SignatureAlgorithm,
}

impl StoreArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.cloud_name.trim().is_empty() {
            return Err("Cloud name must not be empty. Set --cloud-name or CLOUDINARY_CLOUD_NAME".to_string());
        }
        if self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err("Cloudinary API key is required. Set --api-key or CLOUDINARY_KEY".to_string());
        }
        if self.api_secret.as_deref().map_or(true, str::is_empty) {
            return Err(
                "Cloudinary API secret is required. Set --api-secret or CLOUDINARY_SECRET".to_string(),
            );
        }
        Ok(())
    }

    /// Build the store configuration (call validate() first).
    pub fn cloudinary_config(&self) -> CloudinaryConfig {
        let mut config = CloudinaryConfig::new(
            self.cloud_name.trim(),
            self.api_key.as_deref().unwrap_or_default(),
            self.api_secret.as_deref().unwrap_or_default(),
        );
        if let Some(ref url) = self.api_base_url {
            config = config.with_api_base_url(url.as_str());
        }
        if let Some(ref url) = self.delivery_base_url {
            config = config.with_delivery_base_url(url.as_str());
        }
        config.with_signature_algorithm(self.signature_algorithm)
    }

    /// The API key with all but its first four characters hidden.
    pub fn masked_api_key(&self) -> String {
        mask_secret(self.api_key.as_deref().unwrap_or_default())
    }
}

/// Photo id search options.
#[derive(Args, Debug, Clone)]
pub struct ResolverArgs {
    /// Days searched backwards from the start date.
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS, env = "GALLERY_LOOKBACK_DAYS")]
    pub lookback_days: u32,

    /// Timeout for a single existence check, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS, env = "GALLERY_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: u64,

    /// Retries after a transient existence-check failure.
    #[arg(long, default_value_t = DEFAULT_PROBE_RETRIES, env = "GALLERY_PROBE_RETRIES")]
    pub probe_retries: u32,

    /// Base delay before the first retry, in milliseconds (doubled per attempt).
    #[arg(long, default_value_t = DEFAULT_RETRY_BACKOFF_MS, env = "GALLERY_RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: u64,

    /// Number of resolved photo ids to remember (0 disables the cache).
    #[arg(long, default_value_t = DEFAULT_RESOLUTION_CACHE_CAPACITY, env = "GALLERY_RESOLUTION_CACHE")]
    pub resolution_cache: usize,
}

impl ResolverArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(format!(
                "lookback_days must be between 1 and {}",
                MAX_LOOKBACK_DAYS
            ));
        }
        if self.probe_timeout_ms == 0 {
            return Err("probe_timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_lookback_days(self.lookback_days)
            .with_probe_timeout(Duration::from_millis(self.probe_timeout_ms))
            .with_retries(self.probe_retries, Duration::from_millis(self.retry_backoff_ms))
            .with_cache_capacity(self.resolution_cache)
    }
}

/// Options for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "GALLERY_PORT")]
    pub port: u16,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Asset Store and Resolver
    // =========================================================================
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub resolver: ResolverArgs,

    // =========================================================================
    // Downloads
    // =========================================================================
    /// Lifetime of signed download URLs, in seconds.
    #[arg(long, default_value_t = DEFAULT_DOWNLOAD_TTL.as_secs(), env = "GALLERY_DOWNLOAD_TTL_SECS")]
    pub download_ttl_secs: u64,

    /// File format of downloaded originals.
    #[arg(long, default_value = DEFAULT_DOWNLOAD_FORMAT, env = "GALLERY_DOWNLOAD_FORMAT")]
    pub download_format: String,

    // =========================================================================
    // Purchases
    // =========================================================================
    /// Shared secret for purchase webhooks. `POST /purchases` is only served when set.
    #[arg(long, env = "GALLERY_PURCHASE_WEBHOOK_SECRET", hide_env_values = true)]
    pub purchase_webhook_secret: Option<String>,

    /// Accepted clock skew for webhook signatures, in seconds.
    #[arg(long, default_value_t = DEFAULT_WEBHOOK_TOLERANCE_SECS, env = "GALLERY_WEBHOOK_TOLERANCE_SECS")]
    pub webhook_tolerance_secs: u64,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()?;
        self.resolver.validate()?;

        if self.download_ttl_secs == 0 {
            return Err("download_ttl_secs must be greater than 0".to_string());
        }
        if self.download_format.trim().is_empty() {
            return Err("download_format must not be empty".to_string());
        }
        if self
            .purchase_webhook_secret
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(
                "Purchase webhook secret is empty. Unset GALLERY_PURCHASE_WEBHOOK_SECRET to disable purchases"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gallery_config(&self) -> GalleryConfig {
        GalleryConfig {
            download_ttl: Duration::from_secs(self.download_ttl_secs),
            download_format: self.download_format.trim().to_string(),
        }
    }

    pub fn webhook_tolerance(&self) -> Duration {
        Duration::from_secs(self.webhook_tolerance_secs)
    }
}

/// Options for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub resolver: ResolverArgs,

    /// Photo id to resolve (e.g. CH0928251007).
    #[arg(long)]
    pub test_photo: Option<String>,

    /// Start date for the test resolution (YYYY-MM-DD, default: today).
    #[arg(long)]
    pub start_date: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.store.validate()?;
        self.resolver.validate()
    }
}

/// Hide everything but the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

// =============================================================================
// Tests
// =============================================================================
