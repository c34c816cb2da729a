//! Origin and region filtering.

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Instant;

use axum::http::{header, HeaderMap, HeaderName};

use crate::config::{AccessConfig, UnresolvedRegion};
use crate::error::{DenialReason, LeaveError};
use crate::security::geo::{CidrError, RegionTable};
use crate::security::{GateRequest, GateStage, StageOutcome};

/// Region filtering policy.
#[derive(Debug, Clone)]
struct GeoPolicy {
    allowed_regions: HashSet<String>,
    region_header: Option<HeaderName>,
    table: RegionTable,
    unresolved: UnresolvedRegion,
}

impl GeoPolicy {
    /// Region from the trusted header first (set only behind a proxy), then
    /// the range table.
    fn resolve(&self, client: IpAddr, headers: &HeaderMap) -> Option<String> {
        let from_header = self
            .region_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_uppercase())
            // "XX" is the conventional CDN code for an unknown country.
            .filter(|v| !v.is_empty() && v != "XX");

        from_header.or_else(|| self.table.lookup(client).map(String::from))
    }

    fn admits(&self, client: IpAddr, headers: &HeaderMap) -> bool {
        match self.resolve(client, headers) {
            Some(region) => self.allowed_regions.contains(&region),
            None => self.unresolved == UnresolvedRegion::Allow,
        }
    }
}

/// Denies callers from unlisted origins or regions.
#[derive(Debug, Clone)]
pub struct AccessFilter {
    allowed_origins: Vec<String>,
    geo: Option<GeoPolicy>,
}

impl AccessFilter {
    /// Build the filter. `behind_proxy` is the deployment's declaration that a
    /// trusted proxy fronts the service; the region header is ignored without it.
    pub fn from_config(config: &AccessConfig, behind_proxy: bool) -> Result<Self, CidrError> {
        let geo = if config.geo_enabled {
            let region_header = match config.region_header.as_deref() {
                Some(name) if !behind_proxy => {
                    tracing::warn!(
                        header = name,
                        "Region header ignored: listener.trust_forwarded_for is off, resolving from ranges only"
                    );
                    None
                }
                Some(name) => HeaderName::from_bytes(name.as_bytes()).ok(),
                None => None,
            };
            let table = RegionTable::from_config(&config.region_ranges)?;
            if table.is_empty() && region_header.is_none() {
                tracing::warn!(
                    unresolved = ?config.unresolved_region,
                    "Geo filtering enabled without ranges or a trusted header, every caller is unresolved"
                );
            }

            Some(GeoPolicy {
                allowed_regions: config
                    .allowed_regions
                    .iter()
                    .map(|r| r.trim().to_ascii_uppercase())
                    .collect(),
                region_header,
                table,
                unresolved: config.unresolved_region,
            })
        } else {
            None
        };

        Ok(Self {
            allowed_origins: config.allowed_origins.iter().map(|o| normalize_origin(o)).collect(),
            geo,
        })
    }

    /// Whether any filter is configured.
    pub fn is_active(&self) -> bool {
        !self.allowed_origins.is_empty() || self.geo.is_some()
    }

    /// An absent `Origin` header is allowed.
    fn origin_allowed(&self, headers: &HeaderMap) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match headers.get(header::ORIGIN) {
            None => true,
            Some(value) => value
                .to_str()
                .map(|origin| self.allowed_origins.contains(&normalize_origin(origin)))
                .unwrap_or(false),
        }
    }
}

/// Canonical form used for origin comparison and the CORS allow-list.
pub(crate) fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

impl GateStage for AccessFilter {
    fn name(&self) -> &'static str {
        "access"
    }

    fn evaluate(&self, request: &GateRequest<'_>, _now: Instant) -> StageOutcome {
        if !self.origin_allowed(request.headers) {
            return StageOutcome::Reject(LeaveError::AccessDenied(DenialReason::Origin));
        }
        if let Some(geo) = &self.geo {
            if !geo.admits(request.client, request.headers) {
                return StageOutcome::Reject(LeaveError::AccessDenied(DenialReason::Region));
            }
        }
        StageOutcome::Continue
    }
}
