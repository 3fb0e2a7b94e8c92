//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a dependency:
//!     → circuit_breaker.rs (admit? deny fails fast)
//!     → retries.rs (attempt loop)
//!         → timeouts.rs (deadline per attempt)
//!         → backoff.rs (delay between attempts)
//!     → circuit_breaker.rs (record success / failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Breaker is consulted once per call, not once per attempt
//! - Breaker state is owned by the dependency entry, not by this module

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{Admission, BreakerState, CircuitBreaker};
pub use retries::{execute_with_retry, RetryExhausted};
pub use timeouts::run_with_timeout;
