//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (request ID, tracing, limits)
//! - Run every inbound request through the auth gate
//! - Hand cleared requests to the dispatcher
//! - Apply hot-reloaded configuration
//!
//! # Request Flow
//! ```text
//! method outside GET/POST     → 405
//! logout path                 → end sessions → 302 login
//! auth gate: unauthenticated  → 302 login
//!            not authorized   → not-authorized signal
//!            cleared          → (POST: buffer body) → dispatcher
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthGate, GateOutcome, MemorySessionStore, SessionFederation, SessionStore};
use crate::config::GateConfig;
use crate::error::GateError;
use crate::forward::{Dispatcher, HyperUpstream, Upstream};
use crate::http::request::{request_id, InboundRequest};
use crate::http::response::{login_redirect, not_authorized};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Paths that end the caller's sessions instead of being forwarded.
pub const LOGOUT_PATHS: [&str; 2] = ["/logout", "/hub/logout"];

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<GateConfig>>,
    pub gate: Arc<AuthGate>,
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<dyn SessionStore>,
    pub federated_sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// State with in-memory session stores and a hyper backend client.
    pub fn new(config: GateConfig) -> Self {
        let upstream = Arc::new(HyperUpstream::new(&config.backend));
        Self::with_upstream(config, upstream)
    }

    /// State with in-memory session stores and the given backend client.
    pub fn with_upstream(config: GateConfig, upstream: Arc<dyn Upstream>) -> Self {
        let ttl = Duration::from_secs(config.session.ttl_secs);
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::with_ttl(ttl));
        let federated_sessions: Arc<dyn SessionStore> =
            Arc::new(MemorySessionStore::with_ttl(ttl));
        let federation = Arc::new(SessionFederation::new(
            federated_sessions.clone(),
            config.federation.cookie_name.clone(),
        ));

        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            gate: Arc::new(AuthGate::new(sessions.clone(), federation)),
            dispatcher: Arc::new(Dispatcher::new(upstream)),
            sessions,
            federated_sessions,
        }
    }

    /// Periodically drop expired sessions from both stores until shutdown.
    pub fn prune_sessions(&self, every: Duration, signal: ShutdownSignal) -> JoinHandle<()> {
        let stores = [self.sessions.clone(), self.federated_sessions.clone()];
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            let stopped = signal.recv();
            tokio::pin!(stopped);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        for store in &stores {
                            let removed = store.prune().await;
                            if removed > 0 {
                                tracing::debug!(removed, "Pruned expired sessions");
                            }
                        }
                    }
                }
            }
        })
    }

    /// Swap in every configuration that arrives on `updates`.
    pub fn follow_config(&self, mut updates: mpsc::UnboundedReceiver<GateConfig>) -> JoinHandle<()> {
        let config = self.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = updates.recv().await {
                config.store(Arc::new(new_config));
                tracing::info!("Configuration reloaded");
            }
        })
    }
}

/// HTTP server for the gate.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Timeout and body limit are read once here; reloads do not resize them.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.load_full();

        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/", any(gate_handler))
            .route("/{*path}", any(gate_handler))
            .with_state(state)
            .layer(layers)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Entry point for every gated request.
async fn gate_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let config = state.config.load_full();
    let request_id = request_id(request.headers()).to_string();

    let (parts, body) = request.into_parts();
    let inbound = InboundRequest::from_parts(&parts, Bytes::new(), remote_addr, &config.frontend);
    let method = inbound.method().clone();
    let path = inbound.display_path();

    let (action, response) = match handle(&state, &config, inbound, body).await {
        Ok(handled) => handled,
        Err(e) => {
            if matches!(e, GateError::Upstream(_) | GateError::UpstreamTimeout(_)) {
                metrics::record_upstream_failure(e.kind());
            }
            match &e {
                GateError::MethodNotAllowed(_) => {
                    tracing::info!(request_id = %request_id, method = %method, path = %path, "Method not forwarded");
                }
                _ => {
                    tracing::warn!(request_id = %request_id, method = %method, path = %path, error = %e, "Request failed");
                }
            }
            ("error", e.into_response())
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        action,
        "Request completed"
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), action, start);
    response
}

async fn handle(
    state: &AppState,
    config: &GateConfig,
    inbound: InboundRequest,
    body: Body,
) -> Result<(&'static str, Response), GateError> {
    let method = inbound.method().clone();
    if method != Method::GET && method != Method::POST {
        return Err(GateError::MethodNotAllowed(method));
    }

    let path = inbound.display_path();
    if method == Method::GET && LOGOUT_PATHS.contains(&path.as_str()) {
        return Ok(("logout", logout(state, config, &inbound).await?));
    }

    let decision = state.gate.evaluate(&inbound, config).await;
    metrics::record_auth(decision.outcome_label());

    match decision.outcome() {
        GateOutcome::PassThrough => {
            tracing::debug!(path = %path, "No session, redirecting to login");
            Ok(("login", login_redirect(&config.frontend)?))
        }
        GateOutcome::NotAuthorized => {
            tracing::warn!(
                username = decision.username.as_deref().unwrap_or_default(),
                path = %path,
                "Authenticated but not authorized"
            );
            Ok(("not_authorized", not_authorized(&config.frontend)?))
        }
        GateOutcome::Forward => {
            tracing::info!(
                username = decision.username.as_deref().unwrap_or_default(),
                method = %method,
                path = %path,
                "Forwarding request"
            );
            let inbound = if method == Method::POST {
                let bytes = axum::body::to_bytes(body, config.security.max_body_size)
                    .await
                    .map_err(|e| GateError::RequestBody(e.to_string()))?;
                inbound.with_body(bytes)
            } else {
                inbound
            };
            let response = state.dispatcher.dispatch(&inbound, &decision, config).await?;
            Ok(("forward", response))
        }
    }
}

async fn logout(
    state: &AppState,
    config: &GateConfig,
    inbound: &InboundRequest,
) -> Result<Response, GateError> {
    state.gate.logout(inbound, config).await;

    let mut response = login_redirect(&config.frontend)?;
    for cookie in [&config.session.cookie_name, &config.federation.cookie_name] {
        let expired = format!("{cookie}=; Max-Age=0; Path=/");
        let value = HeaderValue::from_str(&expired)
            .map_err(|e| GateError::invalid_header(header::SET_COOKIE.as_str(), e))?;
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}
