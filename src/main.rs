//! Meme Host - An image hosting API for memes.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meme_host::{
    config::Config,
    create_router, create_s3_client, seed_admin, MemeService, RouterConfig, S3BlobStore,
    SqliteMetadataStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Database: {}", config.database.display());
    info!("  S3 bucket: {}", config.s3_bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    info!("  Token TTL: {}s", config.token_ttl);
    info!("  Upload limit: {}MB", config.max_upload_mb);

    // Open the metadata store
    let metadata = match SqliteMetadataStore::open(&config.database) {
        Ok(store) => store,
        Err(e) => {
            error!(
                "Failed to open database {}: {}",
                config.database.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    // Seed the admin credential
    let router_config = build_router_config(&config);
    if let Err(e) = seed_admin(
        &metadata,
        &router_config.hasher(),
        &config.admin_login,
        &config.admin_password,
    )
    .await
    {
        error!("Failed to seed admin credential: {}", e);
        return ExitCode::FAILURE;
    }

    // Create S3 client and check connectivity
    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let blobs = S3BlobStore::new(s3_client, config.s3_bucket.clone());

    info!("Connecting to S3...");
    if let Err(e) = blobs.check_connection().await {
        error!("Failed to connect to S3: {}", e);
        error!("  Please check:");
        error!("    - Your AWS credentials are configured correctly");
        error!("    - The bucket '{}' exists and is accessible", config.s3_bucket);
        error!("    - The S3 endpoint is correct (if using MinIO/custom S3)");
        return ExitCode::FAILURE;
    }
    info!("  Connected successfully");

    // Create router
    let service = MemeService::new(metadata, blobs);
    let router = create_router(service, router_config);

    // Bind and serve
    let addr = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "meme_host=debug,tower_http=debug"
    } else {
        "meme_host=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new(&config.token_secret, &config.auth_salt)
        .with_token_ttl(config.token_ttl())
        .with_max_upload_bytes(config.max_upload_bytes());

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}
