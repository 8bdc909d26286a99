//! Authenticated forwarding gate for a notebook hub.

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use auth::{AuthDecision, AuthGate};
pub use config::schema::GateConfig;
pub use error::GateError;
pub use forward::Dispatcher;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
