//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build registry → Register dependencies → initialize()
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Health loops exit → Handles closed → Registry cleared
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Dependencies initialize concurrently; only critical failures are fatal
//! - Shutdown is best-effort: close errors are logged, never raised

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
