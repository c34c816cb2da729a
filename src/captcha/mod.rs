//! Bot verification against a reCAPTCHA-compatible `siteverify` endpoint.
//!
//! # Design Decisions
//! - Opt-in: without a configured secret every check passes
//! - With a secret, a missing token fails
//! - Fail closed: transport errors, timeouts and malformed replies deny,
//!   surfaced as a distinct error so callers can retry
//! - Score-based replies below the configured minimum fail

pub mod verifier;

pub use verifier::{CaptchaError, CaptchaVerifier, SiteVerifyResponse};
