//! Backend HTTP client.
//!
//! # Design Decisions
//! - One pooled hyper client per process, shared by all requests
//! - Redirects are never followed; the backend's response is relayed as-is
//! - Every call is bounded by the backend timeout, body included
//! - No retries: a POST replay is not idempotent

use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::BackendConfig;
use crate::error::GateError;
use crate::forward::builder::UpstreamRequest;
use crate::resilience::timeouts::with_timeout;

/// Fully buffered backend response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Something that can execute an [`UpstreamRequest`].
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, GateError>;
}

/// Upstream over a pooled hyper client.
#[derive(Clone)]
pub struct HyperUpstream {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_response_size: usize,
}

impl HyperUpstream {
    pub fn new(config: &BackendConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            max_response_size: config.max_response_size,
        }
    }

    async fn execute(&self, request: UpstreamRequest) -> Result<UpstreamResponse, GateError> {
        let mut outbound = Request::new(Body::from(request.body));
        *outbound.method_mut() = request.method;
        *outbound.uri_mut() = request.uri;
        *outbound.headers_mut() = request.headers;

        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|e| GateError::Upstream(e.to_string()))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), self.max_response_size)
            .await
            .map_err(|e| GateError::Upstream(format!("failed to read response body: {e}")))?;

        Ok(UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

#[async_trait]
impl Upstream for HyperUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, GateError> {
        with_timeout(self.timeout, self.execute(request)).await?
    }
}
