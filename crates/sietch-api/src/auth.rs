//! # Pain Token Gate
//!
//! Static shared-secret check guarding the mutating routes.
//!
//! ```text
//! X-Pain-Token: <secret>
//! ```
//!
//! | Header            | Outcome            |
//! |-------------------|--------------------|
//! | absent            | 401 `UNAUTHORIZED` |
//! | present, wrong    | 403 `FORBIDDEN`    |
//! | present, correct  | request proceeds   |
//!
//! The secret is configuration ([`AppConfig::pain_token`]), never a literal
//! in the check. It authenticates nobody; it only proves the caller knows the
//! litany.
//!
//! [`AppConfig::pain_token`]: crate::state::AppConfig::pain_token

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::AppError;

/// Header carrying the gate token.
pub const PAIN_TOKEN_HEADER: &str = "x-pain-token";

// ── Secret ──────────────────────────────────────────────────────────────────

/// Gate secret. Redacted in `Debug`, zeroized on drop.
#[derive(Clone)]
pub struct SecretToken(Zeroizing<String>);

impl SecretToken {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Constant-time comparison against raw header bytes.
    ///
    /// When lengths differ, performs a dummy comparison so that timing does
    /// not reveal the secret's length.
    pub fn matches(&self, provided: &[u8]) -> bool {
        let expected = self.0.as_bytes();
        if provided.len() != expected.len() {
            let _ = expected.ct_eq(expected);
            return false;
        }
        provided.ct_eq(expected).into()
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

// ── Gate ────────────────────────────────────────────────────────────────────

/// Gate configuration injected into request extensions.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub token: SecretToken,
}

/// Judge a request's pain token.
pub fn check_pain_token(provided: Option<&HeaderValue>, expected: &SecretToken) -> Result<(), AppError> {
    match provided {
        None => Err(AppError::Unauthorized(
            "No pain token provided. Put your hand in the box.".into(),
        )),
        Some(value) if expected.matches(value.as_bytes()) => Ok(()),
        Some(_) => Err(AppError::Forbidden(
            "You pulled your hand away. The pain token is wrong.".into(),
        )),
    }
}

/// Middleware enforcing the pain token on the routes it wraps.
///
/// Mount with `route_layer` so unmatched paths still 404 instead of 401.
/// A missing [`GateConfig`] extension denies every request.
pub async fn pain_token_middleware(request: Request, next: Next) -> Response {
    let Some(gate) = request.extensions().get::<GateConfig>().cloned() else {
        tracing::error!("gate configuration missing from request extensions");
        return AppError::Forbidden("the gate is not configured".into()).into_response();
    };

    let verdict = check_pain_token(request.headers().get(PAIN_TOKEN_HEADER), &gate.token);
    match verdict {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(reason = %err, path = %request.uri().path(), "gate refused request");
            err.into_response()
        }
    }
}
