//! Seed data loading.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::records::NewLeaveRecord;

/// Errors while reading the seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load seed records from a JSON array.
///
/// Day counts present in the file are ignored and recomputed on insert.
pub fn load_seed_file(path: &Path) -> Result<Vec<NewLeaveRecord>, SeedError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: display.clone(),
        source,
    })?;
    let records: Vec<NewLeaveRecord> =
        serde_json::from_str(&content).map_err(|source| SeedError::Parse { path: display, source })?;

    tracing::info!(path = %path.display(), count = records.len(), "Loaded seed records");
    Ok(records)
}
