//! Inbound request model.
//!
//! # Responsibilities
//! - Capture everything forwarding needs from an inbound request, once
//! - Resolve the original target path and query (front-end headers first)
//! - Expose cookies and client metadata to the auth gate
//!
//! # Design Decisions
//! - `InboundRequest` is immutable after construction
//! - Path segments are stored decoded; encoding happens when the backend URL is built
//! - The front-end passes the decoded path in `X-Reproxy-URI` and `?query` in `X-Reproxy-Query`

use std::borrow::Cow;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderName, Method};
use percent_encoding::percent_decode_str;

use crate::config::FrontendConfig;
use crate::security::headers::X_FORWARDED_PROTO;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Read the request id set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// A fully received inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    path_segments: Vec<String>,
    query_suffix: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: SocketAddr,
    secure: bool,
}

impl InboundRequest {
    /// Build from request parts and the buffered body.
    pub fn from_parts(
        parts: &Parts,
        body: Bytes,
        remote_addr: SocketAddr,
        frontend: &FrontendConfig,
    ) -> Self {
        let headers = parts.headers.clone();

        let path_segments = match header_text(&headers, &frontend.reproxy_uri_header) {
            Some(path) => path.split('/').map(str::to_owned).collect(),
            None => parts
                .uri
                .path()
                .split('/')
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                .collect(),
        };

        let query_suffix = match header_text(&headers, &frontend.reproxy_query_header) {
            Some(query) if !query.is_empty() => Some(query.into_owned()),
            Some(_) => None,
            None => parts.uri.query().map(|q| format!("?{q}")),
        };

        let secure = parts.uri.scheme_str() == Some("https")
            || headers
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));

        Self {
            method: parts.method.clone(),
            path_segments,
            query_suffix,
            headers,
            body,
            remote_addr,
            secure,
        }
    }

    /// Attach the buffered body once it has been read.
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Decoded path segments, including the empty segment before a leading `/`.
    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    /// `?query` to append verbatim, if the original request had one.
    pub fn query_suffix(&self) -> Option<&str> {
        self.query_suffix.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(&header::CONTENT_TYPE)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    /// Value of the first cookie named `name` across all `Cookie` headers.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// The original path as a string, for logging.
    pub fn display_path(&self) -> String {
        self.path_segments.join("/")
    }
}

/// Front-end headers carry decoded paths, so non-ASCII arrives as raw UTF-8.
fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}
