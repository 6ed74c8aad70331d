//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → spans.rs (per-request spans carrying the request ID)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every span of a request
//! - Metric helpers are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
pub mod spans;

pub use logging::init_logging;
pub use metrics::init_metrics;
