//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest + AuthDecision
//!     → dispatcher.rs (method state machine)
//!         GET  → target.rs (backend URL) → redirect signal
//!         POST → builder.rs (headers + body) → client.rs (backend) → relay
//! ```

pub mod builder;
pub mod client;
pub mod dispatcher;
pub mod target;

pub use builder::{build_upstream_request, classify_body, BodyEncoding, UpstreamRequest};
pub use client::{HyperUpstream, Upstream, UpstreamResponse};
pub use dispatcher::Dispatcher;
pub use target::{backend_url, encode_path};
