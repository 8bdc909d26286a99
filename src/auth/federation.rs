//! Federated single sign-on boundary.
//!
//! The gate only needs three things from an SSO implementation: whether the
//! caller holds a federated session, the attributes released for it, and a
//! way to end it. Any SSO backend can sit behind [`Federation`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::session::{Attributes, SessionStore};
use crate::http::request::InboundRequest;

/// A federated identity provider as seen by the gate.
#[async_trait]
pub trait Federation: Send + Sync {
    /// Whether `request` belongs to an authenticated federated principal.
    async fn is_authenticated(&self, request: &InboundRequest) -> bool;

    /// Attributes released for the principal. Empty when unauthenticated.
    async fn attributes(&self, request: &InboundRequest) -> Attributes;

    /// End the federated session, if any.
    async fn logout(&self, request: &InboundRequest);
}

/// Federation backed by a session store.
///
/// An external SAML service provider completes the protocol exchange and
/// registers the released attributes under an id it sets as a cookie. The
/// cookie name is fixed at construction.
pub struct SessionFederation {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
}

impl SessionFederation {
    pub fn new(store: Arc<dyn SessionStore>, cookie_name: impl Into<String>) -> Self {
        Self {
            store,
            cookie_name: cookie_name.into(),
        }
    }

    async fn session(&self, request: &InboundRequest) -> Option<Attributes> {
        let id = request.cookie(&self.cookie_name)?;
        self.store.load(id).await
    }
}

#[async_trait]
impl Federation for SessionFederation {
    async fn is_authenticated(&self, request: &InboundRequest) -> bool {
        self.session(request).await.is_some()
    }

    async fn attributes(&self, request: &InboundRequest) -> Attributes {
        self.session(request).await.unwrap_or_default()
    }

    async fn logout(&self, request: &InboundRequest) {
        if let Some(id) = request.cookie(&self.cookie_name) {
            if self.store.destroy(id).await {
                tracing::info!("Federated session ended");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::MemorySessionStore;
    use crate::http::request::tests::inbound;
    use axum::http::Request;

    fn federation() -> (Arc<MemorySessionStore>, SessionFederation) {
        let store = Arc::new(MemorySessionStore::new());
        let federation = SessionFederation::new(store.clone(), "SimpleSAMLAuthToken");
        (store, federation)
    }

    #[tokio::test]
    async fn test_without_cookie_is_unauthenticated() {
        let (_, federation) = federation();
        let req = inbound(Request::get("/").body(()).unwrap());
        assert!(!federation.is_authenticated(&req).await);
        assert!(federation.attributes(&req).await.is_empty());
    }

    #[tokio::test]
    async fn test_registered_session_releases_attributes() {
        let (store, federation) = federation();
        let mut attributes = Attributes::new();
        attributes.insert("mail".into(), vec!["jane@example.org".into()]);
        store.save("tok-1", attributes).await;

        let req = inbound(
            Request::get("/")
                .header("Cookie", "SimpleSAMLAuthToken=tok-1")
                .body(())
                .unwrap(),
        );
        assert!(federation.is_authenticated(&req).await);
        assert_eq!(
            federation.attributes(&req).await["mail"],
            vec!["jane@example.org".to_string()]
        );

        federation.logout(&req).await;
        assert!(!federation.is_authenticated(&req).await);
    }
}
