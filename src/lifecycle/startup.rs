//! Startup orchestration.
//!
//! Builds every subsystem from a validated [`ServiceConfig`] in dependency
//! order. Any failure here is fatal.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, Authenticator};
use crate::captcha::{CaptchaError, CaptchaVerifier};
use crate::config::ServiceConfig;
use crate::http::AppState;
use crate::records::seed::{load_seed_file, SeedError};
use crate::records::{MemoryRecordStore, RecordStore};
use crate::security::{CidrError, RequestGate};
use crate::service::LeaveService;
use crate::validation::DatePolicy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("seed data: {0}")]
    Seed(#[from] SeedError),
    #[error("authentication: {0}")]
    Auth(#[from] AuthError),
    #[error("captcha client: {0}")]
    Captcha(#[from] CaptchaError),
    #[error("request gate: {0}")]
    Gate(#[from] CidrError),
}

/// Build the shared application state.
pub fn build_state(config: &ServiceConfig) -> Result<AppState, StartupError> {
    let seed = match &config.store.seed_path {
        Some(path) => load_seed_file(Path::new(path))?,
        None => Vec::new(),
    };
    let store = Arc::new(MemoryRecordStore::seeded(seed));
    tracing::info!(records = store.len(), "Record store seeded");

    let auth = Authenticator::new(config.auth.jwt_secret.clone())?;

    let captcha = CaptchaVerifier::from_config(&config.captcha)?;
    if !captcha.is_enabled() {
        tracing::warn!("Captcha secret not configured, lookups are not verified");
    }

    let gate = RequestGate::from_config(config)?;
    let dates = DatePolicy::from_strict(config.validation.strict_dates);

    Ok(AppState {
        service: Arc::new(LeaveService::new(store, captcha, auth, dates)),
        gate: Arc::new(gate),
        config: Arc::new(config.clone()),
    })
}
