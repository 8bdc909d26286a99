//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that would otherwise
//! fail per request (unparseable backend URL, invalid header names, zero
//! timeouts). All problems are reported, not just the first.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GateConfig, PLACEHOLDER_SECRET};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.backend.base_url) {
        Ok(url) if url.scheme() != "http" => errors.push(ValidationError::new(
            "backend.base_url",
            format!("scheme '{}' is not supported, use http", url.scheme()),
        )),
        Ok(url) if url.query().is_some() || url.fragment().is_some() => {
            errors.push(ValidationError::new(
                "backend.base_url",
                "must not carry a query or fragment",
            ))
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("backend.base_url", e.to_string())),
    }

    if config.backend.timeout_secs == 0 {
        errors.push(ValidationError::new("backend.timeout_secs", "must be > 0"));
    }
    if config.backend.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "backend.connect_timeout_secs",
            "must be > 0",
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    let frontend = &config.frontend;
    for (field, name) in [
        ("frontend.accel_redirect_header", &frontend.accel_redirect_header),
        ("frontend.reproxy_url_header", &frontend.reproxy_url_header),
        ("frontend.remote_user_header", &frontend.remote_user_header),
        ("frontend.reproxy_uri_header", &frontend.reproxy_uri_header),
        ("frontend.reproxy_query_header", &frontend.reproxy_query_header),
        ("frontend.upstream_user_header", &frontend.upstream_user_header),
    ] {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                field,
                format!("'{}' is not a valid header name", name),
            ));
        }
    }

    if config.csrf.secret.is_empty() {
        errors.push(ValidationError::new("csrf.secret", "must not be empty"));
    }

    if config.session.ttl_secs == 0 {
        errors.push(ValidationError::new("session.ttl_secs", "must be > 0"));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        } else if config.admin.api_key == PLACEHOLDER_SECRET {
            errors.push(ValidationError::new(
                "admin.api_key",
                "must be changed from the placeholder",
            ));
        }
        // Tokens are only issued through the admin API.
        if config.csrf.secret == PLACEHOLDER_SECRET {
            errors.push(ValidationError::new(
                "csrf.secret",
                "must be changed from the placeholder",
            ));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("'{}' is not a socket address", config.admin.bind_address),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
