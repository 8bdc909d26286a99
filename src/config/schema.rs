//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Shipped value of every secret. Refused once the admin API is enabled.
pub const PLACEHOLDER_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend (hub) the gate forwards to.
    pub backend: BackendConfig,

    /// Signal headers exchanged with the front-end web server.
    pub frontend: FrontendConfig,

    /// Local session lookup.
    pub session: SessionConfig,

    /// Federated SSO settings.
    pub federation: FederationConfig,

    /// Group allow-list.
    pub authorization: AuthorizationConfig,

    /// CSRF token derivation.
    pub csrf: CsrfConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL the re-encoded path is appended to (e.g., "http://hub:8000").
    pub base_url: String,

    /// Deadline for a proxied POST, connect + response, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Largest backend response body relayed to the client.
    pub max_response_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
            max_response_size: 50 * 1024 * 1024,
        }
    }
}

/// Header names and internal locations shared with the front-end server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Marker header selecting an internal re-dispatch location.
    pub accel_redirect_header: String,

    /// Internal location that proxies to the URL named by `reproxy_url_header`.
    pub entrance_location: String,

    /// Header carrying the fully qualified backend URL.
    pub reproxy_url_header: String,

    /// Internal location of the "not authorized" page.
    pub not_authorized_location: String,

    /// Header the front-end turns into the backend's remote-user assertion.
    pub remote_user_header: String,

    /// Inbound header carrying the decoded original path, if the front-end sets it.
    pub reproxy_uri_header: String,

    /// Inbound header carrying `?query` (or nothing) for the original request.
    pub reproxy_query_header: String,

    /// Where unauthenticated callers are sent.
    pub login_location: String,

    /// Outbound header asserting the username to the backend on proxied requests.
    pub upstream_user_header: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            accel_redirect_header: "X-Accel-Redirect".to_string(),
            entrance_location: "/entrance/".to_string(),
            reproxy_url_header: "X-Reproxy-URL".to_string(),
            not_authorized_location: "/no_author".to_string(),
            remote_user_header: "X-Remote-User".to_string(),
            reproxy_uri_header: "X-Reproxy-URI".to_string(),
            reproxy_query_header: "X-Reproxy-Query".to_string(),
            login_location: "/login".to_string(),
            upstream_user_header: "REMOTE_USER".to_string(),
        }
    }
}

/// Local session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie holding the local session id.
    pub cookie_name: String,

    /// Session attribute holding the logged-in username.
    pub username_attribute: String,

    /// Idle lifetime of a session, in seconds. Applies to local and federated sessions.
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "PHPSESSID".to_string(),
            username_attribute: "username".to_string(),
            ttl_secs: 8 * 60 * 60,
        }
    }
}

/// Federated SSO configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FederationConfig {
    /// IdP metadata file. Federation is skipped unless this file exists.
    pub metadata_path: Option<PathBuf>,

    /// Cookie holding the federated session id.
    pub cookie_name: String,

    /// Attribute holding the principal's mail address.
    pub mail_attribute: String,

    /// Attribute holding the principal's group memberships.
    pub group_attribute: String,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            metadata_path: None,
            cookie_name: "SimpleSAMLAuthToken".to_string(),
            mail_attribute: "mail".to_string(),
            group_attribute: "isMemberOf".to_string(),
        }
    }
}

/// Authorization policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Permitted groups. Empty means every federated user is authorized.
    pub groups: Vec<String>,
}

/// CSRF token derivation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Server secret mixed into every token.
    pub secret: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            secret: PLACEHOLDER_SECRET.to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: PLACEHOLDER_SECRET.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 50 * 1024 * 1024,
        }
    }
}
