//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied request:
//!     → headers.rs (allow-listed inbound headers only)
//! Backend response:
//!     → headers.rs (strip hop-by-hop headers)
//! Forms rendered by the login flow:
//!     → csrf.rs (session-bound tokens)
//! ```
//!
//! # Design Decisions
//! - No trust in client input: identity headers are derived, never copied
//! - Fixed header sets are compile-time constants

pub mod csrf;
pub mod headers;

pub use headers::is_hop_by_hop;
