//! Per-request failures and their HTTP mapping.
//!
//! Every variant is recoverable: it becomes a response, never a panic or a
//! process exit.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("method {0} is not forwarded")]
    MethodNotAllowed(Method),

    #[error("request is not cleared for forwarding")]
    Forbidden,

    #[error("request body could not be read: {0}")]
    RequestBody(String),

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("invalid signal header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GateError::Forbidden => StatusCode::FORBIDDEN,
            GateError::RequestBody(_) | GateError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            GateError::InvalidHeader { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GateError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GateError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::MethodNotAllowed(_) => "method_not_allowed",
            GateError::Forbidden => "forbidden",
            GateError::RequestBody(_) => "request_body",
            GateError::InvalidTarget(_) => "invalid_target",
            GateError::InvalidHeader { .. } => "invalid_header",
            GateError::Upstream(_) => "upstream",
            GateError::UpstreamTimeout(_) => "upstream_timeout",
        }
    }

    pub fn invalid_header(name: &str, reason: impl ToString) -> Self {
        GateError::InvalidHeader {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            GateError::MethodNotAllowed(_) => Body::empty(),
            GateError::Forbidden => Body::from("Forbidden"),
            GateError::RequestBody(_) => Body::from("Invalid request body"),
            GateError::InvalidTarget(_) => Body::from("Invalid request target"),
            GateError::InvalidHeader { .. } => Body::from("Internal server error"),
            GateError::Upstream(_) => Body::from("Upstream request failed"),
            GateError::UpstreamTimeout(_) => Body::from("Upstream request timed out"),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_method_not_allowed_has_empty_body() {
        let response = GateError::MethodNotAllowed(Method::PUT).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_upstream_failures_are_gateway_errors() {
        assert_eq!(
            GateError::Upstream("connection refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GateError::UpstreamTimeout(Duration::from_secs(5)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
