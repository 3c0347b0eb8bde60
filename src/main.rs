//! Photo storefront server.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_storefront::{
    config::{CheckConfig, Cli, Command, ServeConfig},
    entitlement::InMemoryEntitlementStore,
    gallery::GalleryService,
    resolve::{parse_start_date, Resolver},
    server::{create_router, RouterConfig},
    store::CloudinaryStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal in production
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Photo storefront v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Cloud name: {}", config.store.cloud_name);
    info!("  API key: {}", config.store.masked_api_key());
    if let Some(ref url) = config.store.api_base_url {
        info!("  API base URL: {}", url);
    }
    info!("  Signature algorithm: {}", config.store.signature_algorithm);
    info!(
        "  Resolver: {} day lookback, {}ms probe timeout, {} retries, {} cached ids",
        config.resolver.lookback_days,
        config.resolver.probe_timeout_ms,
        config.resolver.probe_retries,
        config.resolver.resolution_cache
    );
    info!(
        "  Downloads: {} format, {}s signed URL lifetime",
        config.download_format, config.download_ttl_secs
    );

    if config.purchase_webhook_secret.is_some() {
        info!("  Purchases: webhook enabled");
    } else {
        warn!("  Purchases: webhook DISABLED - purchased assets will always show Buy");
        warn!("             Enable with --purchase-webhook-secret=<secret>");
    }

    let store = match CloudinaryStore::new(config.store.cloudinary_config()) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create asset store client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("");
    info!("Connecting to Cloudinary...");
    match store.ping().await {
        Ok(()) => info!("  Credentials accepted"),
        Err(e) => {
            error!("  Failed to reach Cloudinary: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - CLOUDINARY_KEY and CLOUDINARY_SECRET are correct");
            error!(
                "    - The cloud '{}' exists and the key belongs to it",
                config.store.cloud_name
            );
            return ExitCode::FAILURE;
        }
    }

    let resolver = Resolver::new(Arc::new(store), config.resolver.resolver_config());
    let entitlements = Arc::new(InMemoryEntitlementStore::new());
    let service = GalleryService::with_config(resolver, entitlements, config.gallery_config());

    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/gallery/<photo_id>", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_storefront=debug,tower_http=debug"
    } else {
        "photo_storefront=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_tracing(!config.no_tracing)
        .with_webhook_tolerance(config.webhook_tolerance());

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref secret) = config.purchase_webhook_secret {
        router_config = router_config.with_webhook_secret(secret.clone());
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Photo Storefront Configuration Check");
    println!("════════════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }
    println!("✓ Cloud name: {}", config.store.cloud_name);
    println!("✓ API key: {}", config.store.masked_api_key());
    println!();

    let store = match CloudinaryStore::new(config.store.cloudinary_config()) {
        Ok(store) => store,
        Err(e) => {
            println!("✗ Client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print!("Testing Cloudinary credentials... ");
    match store.ping().await {
        Ok(()) => println!("✓ success"),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - CLOUDINARY_KEY and CLOUDINARY_SECRET are correct");
            println!(
                "  - The cloud '{}' exists and the key belongs to it",
                config.store.cloud_name
            );
            return ExitCode::FAILURE;
        }
    }

    if let Some(ref photo_id) = config.test_photo {
        let start = match config.start_date.as_deref() {
            Some(raw) => match parse_start_date(raw) {
                Some(date) => Some(date),
                None => {
                    println!();
                    println!("✗ Invalid --start-date '{}' (expected YYYY-MM-DD)", raw);
                    return ExitCode::FAILURE;
                }
            },
            None => None,
        };

        println!();
        print!("Resolving photo '{}'... ", photo_id);

        let resolver = Resolver::new(Arc::new(store), config.resolver.resolver_config());
        match resolver.resolve(photo_id, start).await {
            Some(public_id) => {
                println!("✓ found");
                println!("  Public id: {}", public_id);
            }
            None => {
                println!("✗ not found");
                println!();
                println!(
                    "  No candidate path matched within {} day(s).",
                    config.resolver.lookback_days
                );
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("════════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
