//! Security subsystem: request admission before any payload work.
//!
//! # Data Flow
//! ```text
//! Incoming request (headers + peer address only, body untouched):
//!     → access_control.rs (origin allow-list, region allow-list)
//!     → rate_limit.rs (fixed window per route + client)
//!     → slow_down.rs (progressive delay after bursts)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Stages run in a fixed order; the first rejection short-circuits
//! - Fail closed: unresolvable regions are denied unless configured otherwise
//! - Rejections carry no information about stored records
//! - Counters use per-key locking (DashMap) so parallel requests never undercount

pub mod access_control;
pub mod geo;
pub mod headers;
pub mod rate_limit;
pub mod slow_down;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ServiceConfig;
use crate::error::LeaveError;
use crate::observability::metrics;

pub use access_control::AccessFilter;
pub use geo::{CidrError, IpRange, RegionTable};
pub use rate_limit::{RateLimiter, RouteBudget};
pub use slow_down::SlowDown;

/// Gated routes, each with its own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Query,
    Append,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Query => "query",
            RouteKind::Append => "append",
        }
    }
}

/// What a gate stage sees of a request.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub route: RouteKind,
    pub client: IpAddr,
    pub headers: &'a HeaderMap,
}

/// Result of one stage.
#[derive(Debug)]
pub enum StageOutcome {
    Continue,
    Delay(Duration),
    Reject(LeaveError),
}

/// One admission check.
pub trait GateStage: Send + Sync {
    /// Stage name for logs and metrics.
    fn name(&self) -> &'static str;

    fn evaluate(&self, request: &GateRequest<'_>, now: Instant) -> StageOutcome;

    /// Drop state that can no longer affect a decision.
    fn prune(&self, _now: Instant) {}
}

/// Ordered pipeline of admission stages.
pub struct RequestGate {
    stages: Vec<Box<dyn GateStage>>,
}

impl RequestGate {
    pub fn new(stages: Vec<Box<dyn GateStage>>) -> Self {
        Self { stages }
    }

    /// A gate that admits everything.
    pub fn open() -> Self {
        Self::new(Vec::new())
    }

    /// Build the configured stages: access filter, rate limiter, slow-down.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, CidrError> {
        let mut stages: Vec<Box<dyn GateStage>> = Vec::new();

        let access = AccessFilter::from_config(&config.access, config.listener.trust_forwarded_for)?;
        if access.is_active() {
            stages.push(Box::new(access));
        }
        if config.rate_limit.enabled {
            stages.push(Box::new(RateLimiter::from_config(&config.rate_limit)));
        }
        if config.slow_down.enabled {
            stages.push(Box::new(SlowDown::from_config(&config.slow_down)));
        }

        tracing::info!(
            stages = ?stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "Request gate configured"
        );
        Ok(Self::new(stages))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage at `now`, returning the accumulated delay.
    pub fn evaluate(&self, request: &GateRequest<'_>, now: Instant) -> Result<Duration, LeaveError> {
        let mut delay = Duration::ZERO;
        for stage in &self.stages {
            match stage.evaluate(request, now) {
                StageOutcome::Continue => {}
                StageOutcome::Delay(d) => delay = delay.saturating_add(d),
                StageOutcome::Reject(error) => {
                    metrics::record_gate_rejection(stage.name());
                    tracing::warn!(
                        stage = stage.name(),
                        route = request.route.as_str(),
                        client = %request.client,
                        error = %error,
                        "Request rejected by gate"
                    );
                    return Err(error);
                }
            }
        }
        Ok(delay)
    }

    /// Evaluate and wait out any slow-down delay.
    pub async fn admit(&self, request: &GateRequest<'_>) -> Result<(), LeaveError> {
        let delay = self.evaluate(request, Instant::now())?;
        if !delay.is_zero() {
            tracing::debug!(
                route = request.route.as_str(),
                client = %request.client,
                delay_ms = delay.as_millis() as u64,
                "Slowing down request"
            );
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    pub fn prune(&self, now: Instant) {
        for stage in &self.stages {
            stage.prune(now);
        }
    }

    /// Periodically prune expired counters until shutdown.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.prune(Instant::now()),
                    _ = shutdown.recv() => {
                        tracing::debug!("Gate sweeper received shutdown signal");
                        break;
                    }
                }
            }
        })
    }
}
