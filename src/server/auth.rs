//! Signed session authentication.
//!
//! This module provides HMAC-SHA256 signed session tokens identifying the
//! caller of the photo API.
//!
//! # Token Format
//!
//! ```text
//! token     = "{user}:{expiry}:{signature}"
//! signature = hex(HMAC-SHA256(secret_key, "{user}:{expiry}"))
//! ```
//!
//! The token is read from the `sessionid` cookie, or failing that from an
//! `Authorization: Bearer <token>` header.
//!
//! # Pipeline
//!
//! Authentication runs in two stages so it always happens before any request
//! body is looked at:
//!
//! 1. [`session_middleware`] resolves the token into a [`Session`] and stores
//!    it in the request extensions. It never rejects.
//! 2. The [`Identity`] extractor turns an anonymous session into a `403`.
//!    Handlers list it before body extractors such as `Multipart`.
//!
//! # Example
//!
//! ```rust
//! use photo_effects::server::auth::SessionAuth;
//! use std::time::Duration;
//!
//! let auth = SessionAuth::new("my-secret-key");
//! let (token, _expiry) = auth.issue("alice", Duration::from_secs(3600)).unwrap();
//!
//! assert_eq!(auth.verify(&token).unwrap(), "alice");
//! ```

use std::time::Duration;

use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;
use crate::util::unix_now;

// =============================================================================
// Types
// =============================================================================

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Default session lifetime (two weeks).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(14 * 24 * 3600);

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session cookie or bearer token was sent
    MissingCredentials,

    /// Token does not have the `user:expiry:signature` shape
    MalformedToken,

    /// Session has expired
    Expired {
        /// When the session expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },

    /// Signature does not match
    InvalidSignature,

    /// User name is empty or contains `:` or whitespace
    InvalidUserName(String),
}

impl AuthError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "not_authenticated",
            AuthError::MalformedToken => "malformed_session",
            AuthError::Expired { .. } => "session_expired",
            AuthError::InvalidSignature => "invalid_session",
            AuthError::InvalidUserName(_) => "invalid_user",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => {
                write!(f, "Authentication credentials were not provided.")
            }
            AuthError::MalformedToken => write!(f, "Malformed session token."),
            AuthError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Session expired at {} (current time: {}).",
                expired_at, current_time
            ),
            AuthError::InvalidSignature => write!(f, "Invalid session signature."),
            AuthError::InvalidUserName(user) => write!(f, "Invalid user name: {:?}.", user),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::FORBIDDEN;
        let error_type = self.code();
        let message = self.to_string();

        // A bad signature may be tampering; the rest is routine
        match &self {
            AuthError::InvalidSignature => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
            _ => {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    message
                );
            }
        }

        (status, Json(ErrorResponse::new(message, error_type))).into_response()
    }
}

// =============================================================================
// Session Tokens
// =============================================================================

/// Issues and verifies signed session tokens.
#[derive(Clone)]
pub struct SessionAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl SessionAuth {
    /// Create a new authenticator with the given secret key.
    ///
    /// The key should be at least 32 bytes of random data in production.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Issue a token for `user` valid for `ttl`.
    ///
    /// Returns the token and its expiry timestamp (Unix epoch seconds).
    pub fn issue(&self, user: &str, ttl: Duration) -> Result<(String, u64), AuthError> {
        let expiry = unix_now().saturating_add(ttl.as_secs());
        let token = self.issue_with_expiry(user, expiry)?;
        Ok((token, expiry))
    }

    /// Issue a token for `user` expiring at a fixed timestamp.
    pub fn issue_with_expiry(&self, user: &str, expiry: u64) -> Result<String, AuthError> {
        validate_user_name(user)?;
        let signature = self.compute_signature(user, expiry);
        Ok(format!("{}:{}:{}", user, expiry, signature))
    }

    /// Verify a token and return the user it was issued to.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut parts = token.rsplitn(3, ':');
        let (signature, expiry, user) = match (parts.next(), parts.next(), parts.next()) {
            (Some(signature), Some(expiry), Some(user)) => (signature, expiry, user),
            _ => return Err(AuthError::MalformedToken),
        };

        if validate_user_name(user).is_err() {
            return Err(AuthError::MalformedToken);
        }
        let expiry: u64 = expiry.parse().map_err(|_| AuthError::MalformedToken)?;
        let provided_sig = hex::decode(signature).map_err(|_| AuthError::MalformedToken)?;

        // Recompute and compare in constant time
        let expected_sig = self.compute_signature_bytes(user, expiry);
        if !bool::from(provided_sig.ct_eq(&expected_sig)) {
            return Err(AuthError::InvalidSignature);
        }

        let current_time = unix_now();
        if current_time > expiry {
            return Err(AuthError::Expired {
                expired_at: expiry,
                current_time,
            });
        }

        Ok(user.to_string())
    }

    fn compute_signature(&self, user: &str, expiry: u64) -> String {
        hex::encode(self.compute_signature_bytes(user, expiry))
    }

    fn compute_signature_bytes(&self, user: &str, expiry: u64) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(format!("{}:{}", user, expiry).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Check that a user name can be embedded in a token.
pub fn validate_user_name(user: &str) -> Result<(), AuthError> {
    if user.is_empty() || user.contains(':') || user.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidUserName(user.to_string()));
    }
    Ok(())
}

/// Pull the raw token from the session cookie or the bearer header.
fn credentials_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

// =============================================================================
// Request Session
// =============================================================================

/// Outcome of session resolution, stored in request extensions.
#[derive(Debug, Clone)]
pub enum Session {
    /// A verified caller
    Authenticated(Identity),
    /// No usable credentials, with the reason
    Anonymous(AuthError),
}

/// The authenticated caller of a request.
///
/// As an extractor it rejects anonymous requests with `403 Forbidden`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User name the session was issued to
    pub user: String,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(Session::Authenticated(identity)) => Ok(identity.clone()),
            Some(Session::Anonymous(reason)) => Err(reason.clone()),
            None => Err(AuthError::MissingCredentials),
        }
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware resolving the caller's session.
///
/// Inserts a [`Session`] into the request extensions and always continues;
/// enforcement is left to the [`Identity`] extractor so public routes can
/// share the same stack.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use photo_effects::server::auth::{SessionAuth, session_middleware};
///
/// let auth = SessionAuth::new("secret-key");
/// let app = Router::new()
///     .route("/api/photo/", get(list_photos))
///     .layer(middleware::from_fn_with_state(auth, session_middleware));
/// ```
pub async fn session_middleware(
    axum::extract::State(auth): axum::extract::State<SessionAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match credentials_from_headers(request.headers()) {
        None => Session::Anonymous(AuthError::MissingCredentials),
        Some(token) => match auth.verify(&token) {
            Ok(user) => {
                debug!(user = %user, "Session verified");
                Session::Authenticated(Identity { user })
            }
            Err(reason) => Session::Anonymous(reason),
        },
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

// =============================================================================
// Tests
// =============================================================================
