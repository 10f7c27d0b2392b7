//! Configuration management for the photo service.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `PHOTO_` prefix
//! - Defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use photo_effects::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Session(config) => println!("Issuing a session for {}", config.user),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `PHOTO_HOST` - Server bind address (default: 0.0.0.0)
//! - `PHOTO_PORT` - Server port (default: 8000)
//! - `PHOTO_MEDIA_ROOT` - Directory for uploaded images (default: ./media)
//! - `PHOTO_SESSION_SECRET` - HMAC secret for session tokens (required)
//! - `PHOTO_MAX_UPLOAD_BYTES` - Upload body limit (default: 10 MiB)
//! - `PHOTO_JPEG_QUALITY` - Default JPEG quality for rendering (default: 80)
//! - `PHOTO_CACHE_MAX_AGE` - Cache max-age for rendered images (default: 3600)
//! - `PHOTO_CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::media::{is_valid_quality, DEFAULT_JPEG_QUALITY};
use crate::server::auth::{validate_user_name, DEFAULT_SESSION_TTL};
use crate::server::routes::DEFAULT_MAX_UPLOAD_BYTES;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default media directory.
pub const DEFAULT_MEDIA_ROOT: &str = "./media";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Minimum accepted session secret length in bytes.
pub const MIN_SECRET_LEN: usize = 16;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Photo Effects - upload photos and render them with image filters.
#[derive(Parser, Debug, Clone)]
#[command(name = "photo-effects")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Running without a subcommand starts the server.
    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run, defaulting to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server.
    Serve(ServeConfig),

    /// Issue a session token for a user.
    Session(SessionConfig),
}

// =============================================================================
// Serve Configuration
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "PHOTO_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PHOTO_PORT")]
    pub port: u16,

    /// Directory where uploaded images are stored.
    #[arg(long, default_value = DEFAULT_MEDIA_ROOT, env = "PHOTO_MEDIA_ROOT")]
    pub media_root: PathBuf,

    /// Secret key for HMAC-SHA256 session tokens.
    #[arg(long, env = "PHOTO_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Maximum upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "PHOTO_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Default JPEG quality for rendered images (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "PHOTO_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// HTTP Cache-Control max-age in seconds for rendered images.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "PHOTO_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "PHOTO_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

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
        validate_secret(self.session_secret.as_deref())?;

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.media_root.as_os_str().is_empty() {
            return Err("media_root must not be empty".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the session secret, or an empty string if unset (call validate() first).
    pub fn session_secret_or_empty(&self) -> &str {
        self.session_secret.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Output format of the `session` command.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionOutputFormat {
    /// The bare token, for `Authorization: Bearer`
    #[default]
    Token,
    /// A `Cookie` header value
    Cookie,
    /// JSON with token, user and expiry
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct SessionConfig {
    /// Secret key the server verifies sessions with.
    #[arg(long, env = "PHOTO_SESSION_SECRET", hide_env_values = true)]
    pub secret: String,

    /// User name to issue the session for.
    #[arg(short, long)]
    pub user: String,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL.as_secs())]
    pub ttl: u64,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = SessionOutputFormat::Token)]
    pub format: SessionOutputFormat,
}

impl SessionConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_secret(Some(&self.secret))?;

        validate_user_name(&self.user).map_err(|e| e.to_string())?;

        if self.ttl == 0 {
            return Err("ttl must be greater than 0".to_string());
        }

        Ok(())
    }
}

fn validate_secret(secret: Option<&str>) -> Result<(), String> {
    match secret {
        None | Some("") => Err(
            "No session secret provided. Set --session-secret or PHOTO_SESSION_SECRET".to_string(),
        ),
        Some(secret) if secret.len() < MIN_SECRET_LEN => Err(format!(
            "Session secret must be at least {} bytes",
            MIN_SECRET_LEN
        )),
        Some(_) => Ok(()),
    }
}

// =============================================================================
// Tests
// =============================================================================
