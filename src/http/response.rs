//! Response envelopes and error rendering.
//!
//! # Design Decisions
//! - Every body is `{success, ...}`
//! - Access denials share one message whatever the cause
//! - Not-found and invalid input use equally generic messages
//! - Internal details are logged, never sent

use std::any::Any;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{DenialReason, LeaveError};
use crate::records::LeaveRecord;

pub const MSG_INVALID: &str = "Invalid input.";
pub const MSG_NOT_FOUND: &str = "No matching record.";
pub const MSG_DENIED: &str = "Access denied.";
pub const MSG_RATE_LIMITED: &str = "Too many requests, please try again later.";
pub const MSG_UNAVAILABLE: &str = "Verification is temporarily unavailable, please try again.";
pub const MSG_INTERNAL: &str = "Internal server error.";
pub const MSG_NO_ROUTE: &str = "Route not found.";
pub const MSG_ADDED: &str = "Leave record added.";

/// Body of every failed response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: &'static str,
}

impl ErrorBody {
    pub fn new(message: &'static str) -> Self {
        Self { success: false, message }
    }
}

/// Successful lookup.
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub record: LeaveRecord,
}

impl RecordResponse {
    pub fn new(record: LeaveRecord) -> Self {
        Self { success: true, record }
    }
}

/// Successful append.
#[derive(Debug, Serialize)]
pub struct AppendResponse {
    pub success: bool,
    pub message: &'static str,
    pub record: LeaveRecord,
}

impl AppendResponse {
    pub fn new(record: LeaveRecord) -> Self {
        Self {
            success: true,
            message: MSG_ADDED,
            record,
        }
    }
}

/// Successful listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub leaves: Vec<LeaveRecord>,
}

impl ListResponse {
    pub fn new(leaves: Vec<LeaveRecord>) -> Self {
        Self { success: true, leaves }
    }
}

/// Health probe.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub status: &'static str,
    pub records: usize,
}

pub fn error_response(status: StatusCode, message: &'static str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, MSG_NO_ROUTE)
}

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    LeaveError::Internal(format!("handler panicked: {detail}")).into_response()
}

impl IntoResponse for LeaveError {
    fn into_response(self) -> Response {
        match self {
            LeaveError::Validation(e) => {
                tracing::debug!(error = %e, "Rejected invalid payload");
                error_response(StatusCode::BAD_REQUEST, MSG_INVALID)
            }
            LeaveError::NotFound => error_response(StatusCode::NOT_FOUND, MSG_NOT_FOUND),
            LeaveError::AccessDenied(reason) => {
                let status = match reason {
                    DenialReason::Authentication => StatusCode::UNAUTHORIZED,
                    DenialReason::Origin | DenialReason::Region | DenialReason::Captcha => StatusCode::FORBIDDEN,
                };
                error_response(status, MSG_DENIED)
            }
            LeaveError::RateLimited { retry_after_secs } => {
                let mut response = error_response(StatusCode::TOO_MANY_REQUESTS, MSG_RATE_LIMITED);
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            LeaveError::Upstream(detail) => {
                tracing::warn!(error = %detail, "Denied: verification service failure");
                error_response(StatusCode::SERVICE_UNAVAILABLE, MSG_UNAVAILABLE)
            }
            LeaveError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (LeaveError::Validation(ValidationError::Missing("claimCode")), StatusCode::BAD_REQUEST),
            (LeaveError::NotFound, StatusCode::NOT_FOUND),
            (LeaveError::AccessDenied(DenialReason::Authentication), StatusCode::UNAUTHORIZED),
            (LeaveError::AccessDenied(DenialReason::Region), StatusCode::FORBIDDEN),
            (LeaveError::RateLimited { retry_after_secs: 3 }, StatusCode::TOO_MANY_REQUESTS),
            (LeaveError::Upstream("timeout".into()), StatusCode::SERVICE_UNAVAILABLE),
            (LeaveError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_json(response).await["success"], false);
        }
    }

    #[tokio::test]
    async fn test_denials_are_indistinguishable() {
        let mut messages = Vec::new();
        for reason in [DenialReason::Origin, DenialReason::Region, DenialReason::Captcha, DenialReason::Authentication] {
            let body = body_json(LeaveError::AccessDenied(reason).into_response()).await;
            messages.push(body["message"].as_str().unwrap().to_string());
        }
        messages.dedup();
        assert_eq!(messages, vec![MSG_DENIED]);
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = LeaveError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn test_panic_renders_generic_500() {
        let response = handle_panic(Box::new("secret detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], MSG_INTERNAL);
    }

    #[tokio::test]
    async fn test_internal_detail_not_leaked() {
        let body = body_json(LeaveError::Internal("db password is hunter2".into()).into_response()).await;
        assert_eq!(body["message"], MSG_INTERNAL);
    }
}
