//! Method-based forwarding.
//!
//! ```text
//! GET   → internal-redirect signal (entrance + backend URL), no backend contact
//! POST  → build upstream request → send once → relay
//! other → 405, no backend contact
//! ```

use std::sync::Arc;

use axum::{http::Method, response::Response};

use crate::auth::AuthDecision;
use crate::config::GateConfig;
use crate::error::GateError;
use crate::forward::builder::build_upstream_request;
use crate::forward::client::Upstream;
use crate::forward::target::backend_url;
use crate::http::request::InboundRequest;
use crate::http::response::{relay, set_signal_header, signal};

/// Forwards cleared requests to the backend.
pub struct Dispatcher {
    upstream: Arc<dyn Upstream>,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Forward `request` under `decision`.
    ///
    /// Fails with [`GateError::Forbidden`] unless the decision permits forwarding.
    pub async fn dispatch(
        &self,
        request: &InboundRequest,
        decision: &AuthDecision,
        config: &GateConfig,
    ) -> Result<Response, GateError> {
        let method = request.method();
        if method != Method::GET && method != Method::POST {
            return Err(GateError::MethodNotAllowed(method.clone()));
        }
        if !decision.permits_forwarding() {
            return Err(GateError::Forbidden);
        }

        if method == Method::GET {
            self.redirect(request, decision, config)
        } else {
            self.proxy(request, decision, config).await
        }
    }

    fn redirect(
        &self,
        request: &InboundRequest,
        decision: &AuthDecision,
        config: &GateConfig,
    ) -> Result<Response, GateError> {
        let frontend = &config.frontend;
        let target = backend_url(
            &config.backend.base_url,
            request.path_segments(),
            request.query_suffix(),
        );

        let mut response = signal();
        set_signal_header(
            &mut response,
            &frontend.accel_redirect_header,
            &frontend.entrance_location,
        )?;
        set_signal_header(&mut response, &frontend.reproxy_url_header, &target)?;
        if let Some(username) = decision.username.as_deref() {
            set_signal_header(&mut response, &frontend.remote_user_header, username)?;
        }

        tracing::debug!(target = %target, "Issued internal redirect");
        Ok(response)
    }

    async fn proxy(
        &self,
        request: &InboundRequest,
        decision: &AuthDecision,
        config: &GateConfig,
    ) -> Result<Response, GateError> {
        let upstream_request =
            build_upstream_request(request, decision.username.as_deref(), config).await?;
        let target = upstream_request.uri.clone();

        let response = self.upstream.send(upstream_request).await.map_err(|e| {
            tracing::error!(target = %target, error = %e, "Upstream error");
            e
        })?;

        tracing::debug!(target = %target, status = %response.status, "Relaying backend response");
        Ok(relay(response))
    }
}
