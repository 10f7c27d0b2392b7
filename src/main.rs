//! Photo Effects - authenticated photo uploads with filter rendering.
//!
//! This binary starts the HTTP server, or issues session tokens.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photo_effects::{
    config::{Cli, Command, ServeConfig, SessionConfig, SessionOutputFormat},
    media::LocalMediaStore,
    photo::MemoryPhotoStore,
    server::{auth::SessionAuth, create_router, RouterConfig, SESSION_COOKIE},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Session(config) => run_session(config),
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

    if let Err(e) = tokio::fs::create_dir_all(&config.media_root).await {
        error!(
            "Failed to create media directory {}: {}",
            config.media_root.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Media root: {}", config.media_root.display());
    info!("  Upload limit: {} bytes", config.max_upload_bytes);
    info!("  JPEG quality: {}", config.jpeg_quality);
    match &config.cors_origins {
        Some(origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }

    let photos = MemoryPhotoStore::new();
    let media = LocalMediaStore::new(&config.media_root);
    let router = create_router(photos, media, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  Issue a session with: photo-effects session --user <name>");

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "photo_effects=debug,tower_http=debug"
    } else {
        "photo_effects=info,tower_http=info"
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
    let mut router_config = RouterConfig::new(config.session_secret_or_empty())
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_jpeg_quality(config.jpeg_quality)
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Session Command
// =============================================================================

fn run_session(config: SessionConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let auth = SessionAuth::new(&config.secret);
    let (token, expiry) = match auth.issue(&config.user, Duration::from_secs(config.ttl)) {
        Ok(issued) => issued,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.format {
        SessionOutputFormat::Token => println!("{}", token),
        SessionOutputFormat::Cookie => println!("{}={}", SESSION_COOKIE, token),
        SessionOutputFormat::Json => {
            let json = serde_json::json!({
                "user": config.user,
                "token": token,
                "cookie": format!("{}={}", SESSION_COOKIE, token),
                "expiry": expiry,
                "ttl": config.ttl,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
