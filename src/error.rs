//! Service-level error taxonomy.
//!
//! Every failure a request can hit is one of these variants. Rendering to
//! HTTP lives in `http::response`; causes are logged there and never sent
//! to the caller.

use std::fmt;

use thiserror::Error;

use crate::auth::AuthError;
use crate::captcha::CaptchaError;
use crate::validation::ValidationError;

/// Which check denied access. Logged, never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    Origin,
    Region,
    Captcha,
    Authentication,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Origin => "origin",
            DenialReason::Region => "region",
            DenialReason::Captcha => "captcha",
            DenialReason::Authentication => "authentication",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the gate and the leave service.
#[derive(Debug, Error)]
pub enum LeaveError {
    /// Malformed or missing payload field.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Origin, region, captcha or authentication check failed.
    #[error("access denied: {0}")]
    AccessDenied(DenialReason),

    /// Per-identity quota exceeded.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// No record matches the lookup key.
    #[error("no matching record")]
    NotFound,

    /// The verification service could not give an answer. Fail closed.
    #[error("verification service failure: {0}")]
    Upstream(String),

    /// Unexpected internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for LeaveError {
    fn from(_: AuthError) -> Self {
        LeaveError::AccessDenied(DenialReason::Authentication)
    }
}

impl From<CaptchaError> for LeaveError {
    fn from(e: CaptchaError) -> Self {
        LeaveError::Upstream(e.to_string())
    }
}

/// Result type for leave operations.
pub type LeaveResult<T> = Result<T, LeaveError>;
