//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the leave service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, client address trust).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body limits and response hardening.
    pub security: SecurityConfig,

    /// Payload validation strictness.
    pub validation: ValidationConfig,

    /// Origin and region filtering.
    pub access: AccessConfig,

    /// Fixed-window rate limiting per route.
    pub rate_limit: RateLimitConfig,

    /// Progressive slow-down after bursts.
    pub slow_down: SlowDownConfig,

    /// Bot verification.
    pub captcha: CaptchaConfig,

    /// Bearer-token authentication.
    pub auth: AuthConfig,

    /// Record store seeding.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Take the client address from the last `X-Forwarded-For` entry and honor
    /// `access.region_header`.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add hardening response headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 10 * 1024,
        }
    }
}

/// Payload validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject appended records whose dates do not parse.
    /// When false they are stored with a zero day count.
    pub strict_dates: bool,
}

/// What to do with callers whose region cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedRegion {
    Allow,
    #[default]
    Deny,
}

/// Maps a network range to a region code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionRangeConfig {
    /// CIDR notation, e.g. "192.0.2.0/24".
    pub cidr: String,
    /// ISO 3166 alpha-2 region code.
    pub region: String,
}

/// Origin and region filtering.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Allowed `Origin` values. Empty disables the origin filter.
    pub allowed_origins: Vec<String>,

    /// Enable region filtering.
    pub geo_enabled: bool,

    /// Allowed region codes.
    pub allowed_regions: Vec<String>,

    /// Policy for callers with no resolvable region.
    pub unresolved_region: UnresolvedRegion,

    /// Header carrying the caller's region, set by a CDN. Ignored unless
    /// `listener.trust_forwarded_for` is on.
    pub region_header: Option<String>,

    /// Static range table used when no region header is configured or present.
    pub region_ranges: Vec<RegionRangeConfig>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            geo_enabled: false,
            allowed_regions: ["SA", "AE", "KW", "QA", "OM", "BH", "EG", "JO", "SD"]
                .into_iter()
                .map(String::from)
                .collect(),
            unresolved_region: UnresolvedRegion::Deny,
            region_header: None,
            region_ranges: Vec::new(),
        }
    }
}

/// Request budget for one route.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RouteLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Budget for record lookups.
    pub query: RouteLimitConfig,

    /// Budget for record appends.
    pub append: RouteLimitConfig,

    /// How often expired counters are pruned, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query: RouteLimitConfig {
                max_requests: 50,
                window_secs: 600,
            },
            append: RouteLimitConfig {
                max_requests: 10,
                window_secs: 600,
            },
            sweep_interval_secs: 60,
        }
    }
}

/// Progressive slow-down configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlowDownConfig {
    /// Enable slow-down.
    pub enabled: bool,

    /// Counting window in seconds.
    pub window_secs: u64,

    /// Requests per window admitted without delay.
    pub delay_after: u32,

    /// Added delay per request beyond `delay_after`, in milliseconds.
    pub delay_step_ms: u64,

    /// Upper bound on the delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for SlowDownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            delay_after: 10,
            delay_step_ms: 250,
            max_delay_ms: 5_000,
        }
    }
}

/// Bot verification configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Server-side secret. Verification is disabled when absent.
    pub secret: Option<String>,

    /// Verification endpoint.
    pub verify_url: String,

    /// Timeout for the verification call in seconds.
    pub timeout_secs: u64,

    /// Minimum score for score-based replies.
    pub min_score: f64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            secret: None,
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
            timeout_secs: 5,
            min_score: 0.5,
        }
    }
}

impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("verify_url", &self.verify_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("min_score", &self.min_score)
            .finish()
    }
}

/// Authentication configuration.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Required.
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("jwt_secret", &"<redacted>").finish()
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON array of records loaded at startup.
    pub seed_path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
