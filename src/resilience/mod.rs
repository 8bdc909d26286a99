//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! POST replay to backend:
//!     → timeouts.rs (deadline covers connect, send and body read)
//!     → on expiry: 504, on transport failure: 502
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - No retries or circuit breaking: replayed POSTs are not idempotent

pub mod timeouts;
