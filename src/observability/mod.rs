//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router and front controller produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (dispatch counters and latency histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached by the HTTP layer and shows up
//!   in the trace span of every request

pub mod logging;
pub mod metrics;
