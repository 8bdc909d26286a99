//! Authentication and authorization.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → gate.rs (local session, then federation, then allow-list)
//!         → session.rs (local session store)
//!         → federation.rs (federated SSO boundary)
//!         → identity.rs (mail → username)
//!         → policy.rs (group allow-list)
//!     → AuthDecision → forwarding dispatcher
//! ```

pub mod federation;
pub mod gate;
pub mod identity;
pub mod policy;
pub mod session;

pub use federation::{Federation, SessionFederation};
pub use gate::{AuthDecision, AuthGate, AuthSource, GateOutcome};
pub use session::{Attributes, MemorySessionStore, SessionStore};
