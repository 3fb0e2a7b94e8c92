//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: testing if the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: first admission after reset_timeout elapsed
//! Half-Open → Closed: a call succeeds
//! Half-Open → Open: a call fails (restarts the reset window)
//! ```
//!
//! The breaker is plain data. The owning `DependencyEntry` serializes access
//! through its per-entry lock, so no method here needs to be atomic on its own.

use serde::Serialize;
use std::time::SystemTime;
use tokio::time::Instant;

use crate::config::CircuitBreakerPolicy;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Outcome of asking the breaker whether a call may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
    /// First call after the reset window; the breaker moved to Half-Open.
    AllowProbe,
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Deny)
    }
}

/// Per-dependency circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    policy: CircuitBreakerPolicy,
    state: BreakerState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    /// Wall-clock twin of `last_failure_at`, for reporting only.
    last_failure_wall: Option<SystemTime>,
}

impl CircuitBreaker {
    pub fn new(policy: CircuitBreakerPolicy) -> Self {
        Self {
            policy,
            state: BreakerState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            last_failure_wall: None,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_failure_at(&self) -> Option<Instant> {
        self.last_failure_at
    }

    pub fn last_failure_wall(&self) -> Option<SystemTime> {
        self.last_failure_wall
    }

    pub fn policy(&self) -> &CircuitBreakerPolicy {
        &self.policy
    }

    /// Decide whether a call may proceed right now.
    pub fn admit(&mut self) -> Admission {
        self.admit_at(Instant::now())
    }

    pub fn admit_at(&mut self, now: Instant) -> Admission {
        match self.state {
            BreakerState::Closed | BreakerState::HalfOpen => Admission::Allow,
            BreakerState::Open => {
                let cooled_down = self
                    .last_failure_at
                    .map_or(true, |at| now.saturating_duration_since(at) >= self.policy.reset_timeout());
                if cooled_down {
                    self.state = BreakerState::HalfOpen;
                    Admission::AllowProbe
                } else {
                    Admission::Deny
                }
            }
        }
    }

    /// Record a successful call. Returns the new state if it changed.
    pub fn record_success(&mut self) -> Option<BreakerState> {
        self.consecutive_failures = 0;
        if self.state == BreakerState::HalfOpen {
            self.state = BreakerState::Closed;
            return Some(BreakerState::Closed);
        }
        None
    }

    /// Record a failed call. Returns the new state if it changed.
    pub fn record_failure(&mut self) -> Option<BreakerState> {
        self.record_failure_at(Instant::now(), SystemTime::now())
    }

    pub fn record_failure_at(&mut self, now: Instant, wall: SystemTime) -> Option<BreakerState> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        let threshold = self.policy.failure_threshold.max(1);
        if self.state == BreakerState::HalfOpen || self.consecutive_failures >= threshold {
            let previous = self.state;
            self.state = BreakerState::Open;
            self.last_failure_at = Some(now);
            self.last_failure_wall = Some(wall);
            if previous != BreakerState::Open {
                return Some(BreakerState::Open);
            }
        }
        None
    }
}
