//! Backend URL construction.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters is encoded.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode each decoded segment and join them with `/`.
pub fn encode_path(segments: &[String]) -> String {
    segments
        .iter()
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Backend base URL + encoded path + query suffix (appended verbatim).
pub fn backend_url(base_url: &str, segments: &[String], query_suffix: Option<&str>) -> String {
    let path = encode_path(segments);
    let mut url = base_url.trim_end_matches('/').to_string();
    if !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(&path);
    if let Some(query) = query_suffix {
        url.push_str(query);
    }
    url
}
