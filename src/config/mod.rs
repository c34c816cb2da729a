//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for absent sections)
//!     → loader.rs (environment overrides: PORT, JWT_SECRET, ...)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - The signing secret has no default: startup fails without it

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    AccessConfig, AuthConfig, CaptchaConfig, ListenerConfig, LogFormat, ObservabilityConfig, RateLimitConfig,
    RegionRangeConfig, RouteLimitConfig, SecurityConfig, ServiceConfig, SlowDownConfig, StoreConfig,
    TimeoutConfig, UnresolvedRegion, ValidationConfig,
};
pub use validation::{validate_config, ConfigViolation};
