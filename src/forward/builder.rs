//! Upstream request construction for proxied POSTs.
//!
//! # Responsibilities
//! - Assemble the outbound header set from the allow-list plus derived headers
//! - Re-encode form bodies as `application/x-www-form-urlencoded`
//! - Resolve the backend target URL
//!
//! # Design Decisions
//! - Inbound headers outside the allow-list are dropped, never filtered
//! - The remote-user assertion comes only from the auth decision
//! - Multipart file parts are not relayed; their count is logged
//! - Unsupported bodies are dropped with a warning instead of failing the request

use std::convert::Infallible;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use thiserror::Error;
use url::form_urlencoded;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::forward::target::backend_url;
use crate::http::request::InboundRequest;
use crate::security::headers::{
    FORWARDED_REQUEST_HEADERS, X_FORWARDED_FOR, X_FORWARDED_PROTO, X_REAL_IP, X_SCHEME,
};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Request to be sent to the backend.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// How an inbound body is carried over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEncoding {
    FormUrlEncoded,
    Multipart,
    Unsupported(String),
    Absent,
}

/// Classify a `Content-Type` value.
pub fn classify_body(content_type: Option<&str>) -> BodyEncoding {
    let Some(content_type) = content_type else {
        return BodyEncoding::Absent;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(FORM_URLENCODED) {
        BodyEncoding::FormUrlEncoded
    } else if content_type
        .get(..MULTIPART_FORM_DATA.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MULTIPART_FORM_DATA))
    {
        BodyEncoding::Multipart
    } else {
        BodyEncoding::Unsupported(content_type.to_string())
    }
}

/// Build the backend request replaying `inbound`.
pub async fn build_upstream_request(
    inbound: &InboundRequest,
    username: Option<&str>,
    config: &GateConfig,
) -> Result<UpstreamRequest, GateError> {
    let target = backend_url(
        &config.backend.base_url,
        inbound.path_segments(),
        inbound.query_suffix(),
    );
    let uri: Uri = target
        .parse()
        .map_err(|e| GateError::InvalidTarget(format!("{target}: {e}")))?;

    let mut headers = forwarded_headers(inbound, username, &config.frontend.upstream_user_header)?;

    let body = match encode_body(inbound).await {
        Some(body) => {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
            body
        }
        None => Bytes::new(),
    };

    Ok(UpstreamRequest {
        method: inbound.method().clone(),
        uri,
        headers,
        body,
    })
}

/// The outbound header set. Nothing outside this list reaches the backend.
pub fn forwarded_headers(
    inbound: &InboundRequest,
    username: Option<&str>,
    user_header: &str,
) -> Result<HeaderMap, GateError> {
    let mut headers = HeaderMap::new();

    if let Some(username) = username {
        let name = HeaderName::from_bytes(user_header.as_bytes())
            .map_err(|e| GateError::invalid_header(user_header, e))?;
        let value =
            HeaderValue::from_str(username).map_err(|e| GateError::invalid_header(user_header, e))?;
        headers.insert(name, value);
    }

    let client_ip = HeaderValue::from_str(&inbound.remote_addr().ip().to_string())
        .map_err(|e| GateError::invalid_header(X_REAL_IP.as_str(), e))?;
    headers.insert(X_REAL_IP, client_ip.clone());

    for name in FORWARDED_REQUEST_HEADERS.iter() {
        for value in inbound.headers().get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    match inbound.headers().get(X_FORWARDED_FOR) {
        Some(chain) => headers.insert(X_FORWARDED_FOR, chain.clone()),
        None => headers.insert(X_FORWARDED_FOR, client_ip),
    };

    let proto = HeaderValue::from_static(inbound.scheme());
    headers.insert(X_FORWARDED_PROTO, proto.clone());
    headers.insert(X_SCHEME, proto);

    Ok(headers)
}

async fn encode_body(inbound: &InboundRequest) -> Option<Bytes> {
    match classify_body(inbound.content_type()) {
        BodyEncoding::FormUrlEncoded => {
            let fields: Vec<(String, String)> =
                form_urlencoded::parse(inbound.body()).into_owned().collect();
            Some(encode_fields(&fields))
        }
        BodyEncoding::Multipart => match multipart_fields(inbound).await {
            Ok(form) => {
                if form.dropped_files > 0 {
                    tracing::warn!(
                        dropped_files = form.dropped_files,
                        path = %inbound.display_path(),
                        "Multipart file parts are not relayed"
                    );
                }
                Some(encode_fields(&form.fields))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Malformed multipart body, forwarding without body");
                None
            }
        },
        BodyEncoding::Unsupported(content_type) => {
            tracing::warn!(
                content_type = %content_type,
                bytes = inbound.body().len(),
                "Unsupported request body encoding, forwarding without body"
            );
            None
        }
        BodyEncoding::Absent => {
            if !inbound.body().is_empty() {
                tracing::warn!(
                    bytes = inbound.body().len(),
                    "Request body without content type, forwarding without body"
                );
            }
            None
        }
    }
}

fn encode_fields(fields: &[(String, String)]) -> Bytes {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(fields);
    Bytes::from(serializer.finish())
}

#[derive(Debug, Error)]
enum MultipartError {
    #[error("missing content type")]
    MissingContentType,
    #[error(transparent)]
    Parse(#[from] multer::Error),
}

#[derive(Debug, Default)]
struct MultipartForm {
    fields: Vec<(String, String)>,
    dropped_files: usize,
}

async fn multipart_fields(inbound: &InboundRequest) -> Result<MultipartForm, MultipartError> {
    let content_type = inbound
        .content_type()
        .ok_or(MultipartError::MissingContentType)?;
    let boundary = multer::parse_boundary(content_type)?;

    let body = inbound.body().clone();
    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut form = MultipartForm::default();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_some() {
            form.dropped_files += 1;
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await?;
        form.fields.push((name, value));
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::tests::{inbound, inbound_with_body};
    use axum::http::Request;

    fn config() -> GateConfig {
        let mut config = GateConfig::default();
        config.backend.base_url = "http://hub:8000".into();
        config
    }

    #[test]
    fn test_classify_body() {
        assert_eq!(
            classify_body(Some("application/x-www-form-urlencoded")),
            BodyEncoding::FormUrlEncoded
        );
        assert_eq!(
            classify_body(Some("Application/X-WWW-Form-Urlencoded; charset=UTF-8")),
            BodyEncoding::FormUrlEncoded
        );
        assert_eq!(
            classify_body(Some("multipart/form-data; boundary=xyz")),
            BodyEncoding::Multipart
        );
        assert_eq!(
            classify_body(Some("application/json")),
            BodyEncoding::Unsupported("application/json".into())
        );
        assert_eq!(classify_body(None), BodyEncoding::Absent);
    }

    #[tokio::test]
    async fn test_headers_come_from_allow_list_only() {
        let req = inbound(
            Request::post("/hub/login")
                .header("Host", "gate.example.org")
                .header("User-Agent", "test-agent")
                .header("Cookie", "PHPSESSID=s1")
                .header("Accept-Language", "ja")
                .header("Authorization", "Bearer leak")
                .header("REMOTE_USER", "mallory")
                .header("Connection", "keep-alive")
                .header("X-Custom", "dropped")
                .body(())
                .unwrap(),
        );

        let upstream = build_upstream_request(&req, Some("alice"), &config()).await.unwrap();
        let headers = &upstream.headers;

        assert_eq!(headers["remote_user"], "alice");
        assert_eq!(headers["host"], "gate.example.org");
        assert_eq!(headers["user-agent"], "test-agent");
        assert_eq!(headers["cookie"], "PHPSESSID=s1");
        assert_eq!(headers["accept-language"], "ja");
        assert_eq!(headers["x-real-ip"], "10.0.0.7");
        assert_eq!(headers["x-forwarded-for"], "10.0.0.7");
        assert_eq!(headers["x-forwarded-proto"], "http");
        assert_eq!(headers["x-scheme"], "http");
        assert!(headers.get("authorization").is_none());
        assert!(headers.get("connection").is_none());
        assert!(headers.get("x-custom").is_none());
        assert_eq!(upstream.uri, "http://hub:8000/hub/login");
        assert_eq!(upstream.method, Method::POST);
    }

    #[tokio::test]
    async fn test_client_cannot_assert_identity_without_decision() {
        let req = inbound(
            Request::post("/hub/login")
                .header("REMOTE_USER", "mallory")
                .body(())
                .unwrap(),
        );
        let upstream = build_upstream_request(&req, None, &config()).await.unwrap();
        assert!(upstream.headers.get("remote_user").is_none());
    }

    #[tokio::test]
    async fn test_forwarded_chain_and_scheme_preserved() {
        let req = inbound(
            Request::post("/hub/login")
                .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
                .header("X-Forwarded-Proto", "https")
                .body(())
                .unwrap(),
        );
        let upstream = build_upstream_request(&req, None, &config()).await.unwrap();
        assert_eq!(upstream.headers["x-forwarded-for"], "203.0.113.9, 10.0.0.1");
        assert_eq!(upstream.headers["x-forwarded-proto"], "https");
        assert_eq!(upstream.headers["x-scheme"], "https");
    }

    #[tokio::test]
    async fn test_urlencoded_body_is_reencoded() {
        let req = inbound_with_body(
            Request::post("/hub/spawn?x=1")
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(())
                .unwrap(),
            Bytes::from_static(b"image=python%3A3.12&note=a+b"),
        );
        let upstream = build_upstream_request(&req, Some("alice"), &config()).await.unwrap();
        assert_eq!(upstream.uri, "http://hub:8000/hub/spawn?x=1");
        assert_eq!(upstream.headers["content-type"], FORM_URLENCODED);
        assert_eq!(upstream.body, Bytes::from_static(b"image=python%3A3.12&note=a+b"));
    }

    #[tokio::test]
    async fn test_multipart_fields_kept_and_files_dropped() {
        let body = concat!(
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "hello world\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "file content\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"lang\"\r\n\r\n",
            "ja&en\r\n",
            "--XYZ--\r\n",
        );
        let req = inbound_with_body(
            Request::post("/hub/upload")
                .header("Content-Type", "multipart/form-data; boundary=XYZ")
                .body(())
                .unwrap(),
            Bytes::from_static(body.as_bytes()),
        );
        let upstream = build_upstream_request(&req, None, &config()).await.unwrap();
        assert_eq!(upstream.headers["content-type"], FORM_URLENCODED);
        assert_eq!(upstream.body, Bytes::from_static(b"title=hello+world&lang=ja%26en"));
    }

    #[tokio::test]
    async fn test_malformed_multipart_forwards_empty_body() {
        let req = inbound_with_body(
            Request::post("/hub/upload")
                .header("Content-Type", "multipart/form-data")
                .body(())
                .unwrap(),
            Bytes::from_static(b"garbage"),
        );
        let upstream = build_upstream_request(&req, None, &config()).await.unwrap();
        assert!(upstream.body.is_empty());
        assert!(upstream.headers.get("content-type").is_none());
    }

    #[tokio::test]
    async fn test_unsupported_body_is_not_forwarded() {
        let req = inbound_with_body(
            Request::post("/hub/api/users")
                .header("Content-Type", "application/json")
                .body(())
                .unwrap(),
            Bytes::from_static(b"{\"name\":\"x\"}"),
        );
        let upstream = build_upstream_request(&req, None, &config()).await.unwrap();
        assert!(upstream.body.is_empty());
        assert!(upstream.headers.get("content-type").is_none());
    }
}
