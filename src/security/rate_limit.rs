//! Fixed-window rate limiting per route and client address.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::{RateLimitConfig, RouteLimitConfig};
use crate::error::LeaveError;
use crate::security::{GateRequest, GateStage, RouteKind, StageOutcome};

/// A counter that resets when its window has elapsed.
#[derive(Debug, Clone)]
pub(crate) struct CounterWindow {
    started: Instant,
    count: u32,
}

impl CounterWindow {
    pub(crate) fn new(now: Instant) -> Self {
        Self { started: now, count: 0 }
    }

    /// Count one request at `now`, rolling the window over if it expired.
    pub(crate) fn hit(&mut self, now: Instant, window: Duration) -> u32 {
        if self.is_expired(now, window) {
            self.started = now;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub(crate) fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started) >= window
    }

    pub(crate) fn remaining(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.started))
    }
}

/// Request budget for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteBudget {
    pub max_requests: u32,
    pub window: Duration,
}

/// State for the fixed-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<(RouteKind, IpAddr), CounterWindow>,
    query: RouteBudget,
    append: RouteBudget,
}

impl RateLimiter {
    pub fn new(query: RouteBudget, append: RouteBudget) -> Self {
        Self {
            windows: DashMap::new(),
            query,
            append,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let budget = |route: RouteLimitConfig| RouteBudget {
            max_requests: route.max_requests,
            window: Duration::from_secs(route.window_secs),
        };
        Self::new(budget(config.query), budget(config.append))
    }

    fn budget(&self, route: RouteKind) -> RouteBudget {
        match route {
            RouteKind::Query => self.query,
            RouteKind::Append => self.append,
        }
    }

    /// Count a request. Returns the remaining quota, or the seconds until the
    /// window rolls over when the quota is exhausted.
    pub fn check(&self, route: RouteKind, client: IpAddr, now: Instant) -> Result<u32, u64> {
        let budget = self.budget(route);
        let mut window = self
            .windows
            .entry((route, client))
            .or_insert_with(|| CounterWindow::new(now));

        let count = window.hit(now, budget.window);
        if count > budget.max_requests {
            let retry_after = window.remaining(now, budget.window).as_secs().max(1);
            return Err(retry_after);
        }
        Ok(budget.max_requests - count)
    }

    /// Number of tracked (route, client) windows.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

impl GateStage for RateLimiter {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn evaluate(&self, request: &GateRequest<'_>, now: Instant) -> StageOutcome {
        match self.check(request.route, request.client, now) {
            Ok(_) => StageOutcome::Continue,
            Err(retry_after_secs) => StageOutcome::Reject(LeaveError::RateLimited { retry_after_secs }),
        }
    }

    fn prune(&self, now: Instant) {
        self.windows
            .retain(|(route, _), window| !window.is_expired(now, self.budget(*route).window));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter() -> RateLimiter {
        RateLimiter::new(
            RouteBudget { max_requests: 3, window: Duration::from_secs(60) },
            RouteBudget { max_requests: 1, window: Duration::from_secs(600) },
        )
    }

    fn client(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 0, 2, last))
    }

    #[test]
    fn test_n_plus_one_rejected() {
        let limiter = limiter();
        let now = Instant::now();
        assert_eq!(limiter.check(RouteKind::Query, client(1), now), Ok(2));
        assert_eq!(limiter.check(RouteKind::Query, client(1), now), Ok(1));
        assert_eq!(limiter.check(RouteKind::Query, client(1), now), Ok(0));
        assert_eq!(limiter.check(RouteKind::Query, client(1), now + Duration::from_secs(15)), Err(45));
    }

    #[test]
    fn test_window_rollover_resets() {
        let limiter = limiter();
        let start = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check(RouteKind::Query, client(1), start).is_ok());
        }
        assert!(limiter.check(RouteKind::Query, client(1), start + Duration::from_secs(59)).is_err());
        assert_eq!(limiter.check(RouteKind::Query, client(1), start + Duration::from_secs(60)), Ok(2));
    }

    #[test]
    fn test_identities_and_routes_are_independent() {
        let limiter = limiter();
        let now = Instant::now();
        assert!(limiter.check(RouteKind::Append, client(1), now).is_ok());
        assert!(limiter.check(RouteKind::Append, client(1), now).is_err());
        assert!(limiter.check(RouteKind::Append, client(2), now).is_ok());
        assert!(limiter.check(RouteKind::Query, client(1), now).is_ok());
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.check(RouteKind::Append, client(3), start).unwrap();
        let retry = limiter
            .check(RouteKind::Append, client(3), start + Duration::from_millis(599_900))
            .unwrap_err();
        assert_eq!(retry, 1);
    }

    #[test]
    fn test_prune_drops_expired_windows() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.check(RouteKind::Query, client(1), start).unwrap();
        limiter.check(RouteKind::Append, client(1), start).unwrap();
        assert_eq!(limiter.tracked(), 2);

        limiter.prune(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked(), 1);
        limiter.prune(start + Duration::from_secs(601));
        assert_eq!(limiter.tracked(), 0);
    }

    #[test]
    fn test_parallel_hits_are_all_counted() {
        let limiter = std::sync::Arc::new(RateLimiter::new(
            RouteBudget { max_requests: 1_000, window: Duration::from_secs(60) },
            RouteBudget { max_requests: 1, window: Duration::from_secs(60) },
        ));
        let now = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..300)
                        .filter(|_| limiter.check(RouteKind::Query, client(9), now).is_ok())
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 1_000);
    }
}
