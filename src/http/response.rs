//! Responses produced by the gate.
//!
//! # Responsibilities
//! - Relay a buffered backend response, minus hop-by-hop headers
//! - Build the front-end signal responses (entrance, not-authorized, login)
//!
//! # Design Decisions
//! - Signal responses carry an empty body; the front-end acts on headers only
//! - Configured header names are validated at load time, but still checked here

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

use crate::config::FrontendConfig;
use crate::error::GateError;
use crate::forward::client::UpstreamResponse;
use crate::security::is_hop_by_hop;

/// Turn a backend response into the client response.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    for (name, value) in upstream.headers.iter() {
        if !is_hop_by_hop(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    response
}

/// Empty 200 response to which signal headers are added.
pub fn signal() -> Response {
    Response::new(Body::empty())
}

/// Set a header whose name comes from configuration.
pub fn set_signal_header(response: &mut Response, name: &str, value: &str) -> Result<(), GateError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| GateError::invalid_header(name, e))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| GateError::invalid_header(name, e))?;
    response.headers_mut().insert(header_name, header_value);
    Ok(())
}

/// Tell the front-end to serve the not-authorized page.
pub fn not_authorized(frontend: &FrontendConfig) -> Result<Response, GateError> {
    let mut response = signal();
    set_signal_header(
        &mut response,
        &frontend.accel_redirect_header,
        &frontend.not_authorized_location,
    )?;
    Ok(response)
}

/// Send an unauthenticated caller to the login page.
pub fn login_redirect(frontend: &FrontendConfig) -> Result<Response, GateError> {
    let location = HeaderValue::from_str(&frontend.login_location)
        .map_err(|e| GateError::invalid_header(header::LOCATION.as_str(), e))?;
    let mut response = signal();
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}
