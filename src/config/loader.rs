//! Configuration loading from disk and the environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ConfigViolation};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String },
    Validation(Vec<ConfigViolation>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value } => write!(f, "Invalid value for {}: {:?}", key, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Recognized keys: `BIND_ADDRESS`, `PORT`, `JWT_SECRET`,
/// `RECAPTCHA_SECRET_KEY`, `ALLOWED_ORIGINS`, `ALLOWED_REGIONS`,
/// `QUERY_RATE_MAX`, `QUERY_RATE_WINDOW_SECS`, `APPEND_RATE_MAX`,
/// `APPEND_RATE_WINDOW_SECS`, `SEED_PATH`.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(port) = lookup("PORT") {
        let port: u16 = parse("PORT", &port)?;
        let mut addr: SocketAddr = parse("BIND_ADDRESS", &config.listener.bind_address)?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(secret) = lookup("RECAPTCHA_SECRET_KEY") {
        config.captcha.secret = Some(secret).filter(|s| !s.is_empty());
    }
    if let Some(origins) = lookup("ALLOWED_ORIGINS") {
        config.access.allowed_origins = split_list(&origins);
    }
    if let Some(regions) = lookup("ALLOWED_REGIONS") {
        config.access.allowed_regions = split_list(&regions);
    }
    if let Some(max) = lookup("QUERY_RATE_MAX") {
        config.rate_limit.query.max_requests = parse("QUERY_RATE_MAX", &max)?;
    }
    if let Some(window) = lookup("QUERY_RATE_WINDOW_SECS") {
        config.rate_limit.query.window_secs = parse("QUERY_RATE_WINDOW_SECS", &window)?;
    }
    if let Some(max) = lookup("APPEND_RATE_MAX") {
        config.rate_limit.append.max_requests = parse("APPEND_RATE_MAX", &max)?;
    }
    if let Some(window) = lookup("APPEND_RATE_WINDOW_SECS") {
        config.rate_limit.append.window_secs = parse("APPEND_RATE_WINDOW_SECS", &window)?;
    }
    if let Some(path) = lookup("SEED_PATH") {
        config.store.seed_path = Some(path).filter(|p| !p.is_empty());
    }
    Ok(())
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
