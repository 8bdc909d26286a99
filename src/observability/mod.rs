//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler, auth gate, dispatcher:
//!     → logging.rs (structured events carrying request_id)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every event on the request path
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
