//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, facade and health monitor produce:
//!     → logging.rs (structured log events, `dependency_call` spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Metrics go through the `metrics` facade; without an installed recorder they are no-ops
//! - Every log line about a dependency carries a `dependency` field

pub mod logging;
pub mod metrics;
