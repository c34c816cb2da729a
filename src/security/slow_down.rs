//! Progressive slow-down after a burst threshold.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::SlowDownConfig;
use crate::security::rate_limit::CounterWindow;
use crate::security::{GateRequest, GateStage, RouteKind, StageOutcome};

/// Delays requests beyond `delay_after` per window by an increasing amount.
#[derive(Debug)]
pub struct SlowDown {
    hits: DashMap<(RouteKind, IpAddr), CounterWindow>,
    window: Duration,
    delay_after: u32,
    step: Duration,
    max_delay: Duration,
}

impl SlowDown {
    pub fn new(window: Duration, delay_after: u32, step: Duration, max_delay: Duration) -> Self {
        Self {
            hits: DashMap::new(),
            window,
            delay_after,
            step,
            max_delay,
        }
    }

    pub fn from_config(config: &SlowDownConfig) -> Self {
        Self::new(
            Duration::from_secs(config.window_secs),
            config.delay_after,
            Duration::from_millis(config.delay_step_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Count a request and return the delay it should wait.
    pub fn delay_for(&self, route: RouteKind, client: IpAddr, now: Instant) -> Duration {
        let count = self
            .hits
            .entry((route, client))
            .or_insert_with(|| CounterWindow::new(now))
            .hit(now, self.window);

        match count.checked_sub(self.delay_after) {
            Some(over) if over > 0 => self.step.saturating_mul(over).min(self.max_delay),
            _ => Duration::ZERO,
        }
    }
}

impl GateStage for SlowDown {
    fn name(&self) -> &'static str {
        "slow_down"
    }

    fn evaluate(&self, request: &GateRequest<'_>, now: Instant) -> StageOutcome {
        let delay = self.delay_for(request.route, request.client, now);
        if delay.is_zero() {
            StageOutcome::Continue
        } else {
            StageOutcome::Delay(delay)
        }
    }

    fn prune(&self, now: Instant) {
        self.hits.retain(|_, window| !window.is_expired(now, self.window));
    }
}
