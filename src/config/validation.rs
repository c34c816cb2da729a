//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Refuse to run without a signing secret
//! - Validate value ranges (windows > 0, scores in 0..=1)
//! - Validate addresses, URLs, CIDR ranges and header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::security::geo::IpRange;

/// A semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigViolation {
    #[error("auth.jwt_secret must be set")]
    MissingJwtSecret,

    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("rate_limit.{0} needs max_requests and window_secs greater than zero")]
    InvalidRouteLimit(&'static str),

    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("slow_down needs window_secs > 0 and delay_step_ms <= max_delay_ms")]
    InvalidSlowDown,

    #[error("captcha.verify_url {0:?} is not a valid http(s) URL")]
    InvalidVerifyUrl(String),

    #[error("captcha.timeout_secs must be greater than zero")]
    ZeroCaptchaTimeout,

    #[error("captcha.min_score must be between 0 and 1")]
    InvalidMinScore,

    #[error("access.allowed_regions is empty while geo filtering is enabled")]
    EmptyRegionAllowList,

    #[error("access.region_ranges contains invalid CIDR {0:?}")]
    InvalidCidr(String),

    #[error("access.region_header {0:?} is not a valid header name")]
    InvalidRegionHeader(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ConfigViolation>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.trim().is_empty() {
        errors.push(ConfigViolation::MissingJwtSecret);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ConfigViolation::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ConfigViolation::ZeroRequestTimeout);
    }
    if config.security.max_body_size == 0 {
        errors.push(ConfigViolation::ZeroBodyLimit);
    }

    let limits = &config.rate_limit;
    if limits.enabled {
        for (name, route) in [("query", limits.query), ("append", limits.append)] {
            if route.max_requests == 0 || route.window_secs == 0 {
                errors.push(ConfigViolation::InvalidRouteLimit(name));
            }
        }
    }
    if limits.sweep_interval_secs == 0 {
        errors.push(ConfigViolation::ZeroSweepInterval);
    }

    let slow = &config.slow_down;
    if slow.enabled && (slow.window_secs == 0 || slow.delay_step_ms > slow.max_delay_ms) {
        errors.push(ConfigViolation::InvalidSlowDown);
    }

    let captcha = &config.captcha;
    let url_ok = url::Url::parse(&captcha.verify_url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !url_ok {
        errors.push(ConfigViolation::InvalidVerifyUrl(captcha.verify_url.clone()));
    }
    if captcha.timeout_secs == 0 {
        errors.push(ConfigViolation::ZeroCaptchaTimeout);
    }
    if !(0.0..=1.0).contains(&captcha.min_score) {
        errors.push(ConfigViolation::InvalidMinScore);
    }

    let access = &config.access;
    if access.geo_enabled && access.allowed_regions.is_empty() {
        errors.push(ConfigViolation::EmptyRegionAllowList);
    }
    for range in &access.region_ranges {
        if range.cidr.parse::<IpRange>().is_err() {
            errors.push(ConfigViolation::InvalidCidr(range.cidr.clone()));
        }
    }
    if let Some(header) = &access.region_header {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ConfigViolation::InvalidRegionHeader(header.clone()));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ConfigViolation::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
