//! The auth gate.
//!
//! # Sequence
//! ```text
//! local session has a username?        → authenticated, authorized
//! federation metadata present on disk?
//!   └─ federated principal?             → authenticated
//!        └─ mail → username, groups → allow-list check
//! otherwise                             → unauthenticated (caller decides)
//! ```
//!
//! Steps run strictly in order; the first success wins.

use std::path::Path;
use std::sync::Arc;

use crate::auth::federation::Federation;
use crate::auth::identity::username_from_mail;
use crate::auth::policy::is_authorized;
use crate::auth::session::{first_value, SessionStore};
use crate::config::GateConfig;
use crate::http::request::InboundRequest;

/// Where an authenticated identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    Local,
    Federated,
}

/// Result of the gate for one request. Never mutated after evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub authenticated: bool,
    /// Only meaningful when `authenticated` is true.
    pub authorized: bool,
    pub username: Option<String>,
    pub source: Option<AuthSource>,
}

/// What the caller should do with a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Forward,
    NotAuthorized,
    PassThrough,
}

impl AuthDecision {
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            authorized: false,
            username: None,
            source: None,
        }
    }

    pub fn local(username: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            authorized: true,
            username: Some(username.into()),
            source: Some(AuthSource::Local),
        }
    }

    pub fn federated(username: impl Into<String>, authorized: bool) -> Self {
        Self {
            authenticated: true,
            authorized,
            username: Some(username.into()),
            source: Some(AuthSource::Federated),
        }
    }

    /// Forwarding requires both flags.
    pub fn permits_forwarding(&self) -> bool {
        self.authenticated && self.authorized
    }

    pub fn outcome(&self) -> GateOutcome {
        match (self.authenticated, self.authorized) {
            (true, true) => GateOutcome::Forward,
            (true, false) => GateOutcome::NotAuthorized,
            (false, _) => GateOutcome::PassThrough,
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self.outcome() {
            GateOutcome::Forward => "forward",
            GateOutcome::NotAuthorized => "not_authorized",
            GateOutcome::PassThrough => "unauthenticated",
        }
    }
}

/// Sequences the local and federated checks.
pub struct AuthGate {
    sessions: Arc<dyn SessionStore>,
    federation: Arc<dyn Federation>,
}

impl AuthGate {
    pub fn new(sessions: Arc<dyn SessionStore>, federation: Arc<dyn Federation>) -> Self {
        Self {
            sessions,
            federation,
        }
    }

    /// Evaluate `request` under the current configuration.
    pub async fn evaluate(&self, request: &InboundRequest, config: &GateConfig) -> AuthDecision {
        if let Some(username) = self.local_username(request, config).await {
            tracing::debug!(username = %username, "Local session found");
            return AuthDecision::local(username);
        }

        let federation = &config.federation;
        if !metadata_present(federation.metadata_path.as_deref()).await {
            return AuthDecision::unauthenticated();
        }

        if !self.federation.is_authenticated(request).await {
            return AuthDecision::unauthenticated();
        }

        let attributes = self.federation.attributes(request).await;
        let Some(mail) = first_value(&attributes, &federation.mail_attribute) else {
            tracing::warn!(
                attribute = %federation.mail_attribute,
                "Federated principal has no mail attribute, treating as unauthenticated"
            );
            return AuthDecision::unauthenticated();
        };

        let username = username_from_mail(mail);
        let groups = attributes
            .get(&federation.group_attribute)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let authorized = is_authorized(groups, &config.authorization.groups);

        tracing::debug!(
            username = %username,
            groups = groups.len(),
            authorized,
            "Federated session found"
        );
        AuthDecision::federated(username, authorized)
    }

    /// End both the local and the federated session of `request`.
    pub async fn logout(&self, request: &InboundRequest, config: &GateConfig) {
        if let Some(id) = request.cookie(&config.session.cookie_name) {
            if self.sessions.destroy(id).await {
                tracing::info!("Local session ended");
            }
        }
        self.federation.logout(request).await;
    }

    async fn local_username(&self, request: &InboundRequest, config: &GateConfig) -> Option<String> {
        let id = request.cookie(&config.session.cookie_name)?;
        let attributes = self.sessions.load(id).await?;
        first_value(&attributes, &config.session.username_attribute)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
    }
}

async fn metadata_present(path: Option<&Path>) -> bool {
    match path {
        Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
        None => false,
    }
}
