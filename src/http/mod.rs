//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, auth gate)
//!     → request.rs (InboundRequest: path, query, cookies, client metadata)
//!     → [forward::Dispatcher]
//!     → response.rs (relay and front-end signals)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
