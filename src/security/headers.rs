//! Header classification for the proxy hop.
//!
//! # Responsibilities
//! - Classify hop-by-hop headers (applied to backend responses)
//! - Name the inbound headers that are copied onto proxied requests
//!
//! # Design Decisions
//! - Outbound requests are rebuilt from an allow-list, so the inbound side
//!   never needs hop-by-hop filtering
//! - Identity headers are never in the allow-list; they are derived

use axum::http::header::{self, HeaderName};

/// Headers scoped to a single connection. Never relayed across the hop.
pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Inbound headers copied verbatim onto a proxied request.
///
/// Client IP, forwarding chain, scheme and remote user are derived separately.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 8] = [
    header::HOST,
    header::USER_AGENT,
    header::REFERER,
    header::ORIGIN,
    header::COOKIE,
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::ACCEPT_LANGUAGE,
];

pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_SCHEME: HeaderName = HeaderName::from_static("x-scheme");

/// Returns true if `name` is a hop-by-hop header (case-insensitive).
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}
