//! Canonical records of one outbound call.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri, Version};
use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Schema version stamped on every record.
pub const RECORD_VERSION: &str = "v1beta2";
/// Record kind for HTTP dependencies.
pub const HTTP_KIND: &str = "Http";
/// Dependency type tag for outbound HTTP client calls.
pub const HTTP_CLIENT: &str = "http-client";

/// Free-form call metadata (`name`, `type`, `operation`).
pub type Meta = BTreeMap<String, String>;

/// Header map normalized to owned `name -> values` lists.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// Header map copied as raw value bytes, preserving non-UTF-8 octets.
pub type RawHeaderValues = BTreeMap<String, Vec<Vec<u8>>>;

/// Metadata attached to every intercepted HTTP call.
#[must_use]
pub fn http_meta(method: &Method) -> Meta {
    Meta::from([
        ("name".to_string(), HTTP_KIND.to_string()),
        ("type".to_string(), HTTP_CLIENT.to_string()),
        ("operation".to_string(), method.as_str().to_string()),
    ])
}

/// Copies a live header map into an independent normalized form.
#[must_use]
pub fn normalize_headers(headers: &HeaderMap) -> HeaderValues {
    let mut out = HeaderValues::new();
    for (name, value) in headers {
        out.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// Rebuilds a header map from its normalized form, skipping invalid entries.
#[must_use]
pub fn restore_headers(values: &HeaderValues) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, list) in values {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        for value in list {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.append(name.clone(), value);
            }
        }
    }
    headers
}

/// Copies a live header map keeping every value byte as sent.
#[must_use]
pub fn raw_headers(headers: &HeaderMap) -> RawHeaderValues {
    let mut out = RawHeaderValues::new();
    for (name, value) in headers {
        out.entry(name.as_str().to_string()).or_default().push(value.as_bytes().to_vec());
    }
    out
}

/// Rebuilds a header map from raw value bytes, skipping invalid entries.
#[must_use]
pub fn restore_raw_headers(values: &RawHeaderValues) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, list) in values {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        for value in list {
            if let Ok(value) = HeaderValue::from_bytes(value) {
                headers.append(name.clone(), value);
            }
        }
    }
    headers
}

/// `(major, minor)` pair for an HTTP version.
#[must_use]
pub fn proto_version(version: Version) -> (u8, u8) {
    match version {
        Version::HTTP_09 => (0, 9),
        Version::HTTP_10 => (1, 0),
        Version::HTTP_2 => (2, 0),
        Version::HTTP_3 => (3, 0),
        _ => (1, 1),
    }
}

/// Everything the record needs from a request, copied before the request is
/// handed to the transport.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// Request method.
    pub method: Method,
    /// Protocol version.
    pub version: Version,
    /// Full request URI.
    pub uri: Uri,
    /// Normalized copy of the request headers.
    pub headers: HeaderValues,
    /// Captured request body.
    pub body: Bytes,
}

impl RequestSnapshot {
    /// Snapshots a request whose body has already been captured.
    #[must_use]
    pub fn of(request: &Request<Body>, body: Bytes) -> Self {
        Self {
            method: request.method().clone(),
            version: request.version(),
            uri: request.uri().clone(),
            headers: normalize_headers(request.headers()),
            body,
        }
    }
}

/// Captured request half of a [`DependencyRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequestRecord {
    /// Request method.
    pub method: String,
    /// Major protocol version.
    pub proto_major: u8,
    /// Minor protocol version.
    pub proto_minor: u8,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HeaderValues,
    /// Request body bytes.
    pub body: Vec<u8>,
}

/// Captured response half of a [`DependencyRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponseRecord {
    /// Status code; `0` when the call produced no response.
    pub status_code: u16,
    /// Response headers.
    pub headers: HeaderValues,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// One outbound call's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Record schema version.
    pub version: String,
    /// Test identifier the call was made under.
    pub name: String,
    /// Record kind.
    pub kind: String,
    /// Call metadata.
    pub meta: Meta,
    /// Captured request.
    pub request: HttpRequestRecord,
    /// Captured response.
    pub response: HttpResponseRecord,
    /// Error text; empty when the call succeeded.
    pub error: String,
}

impl DependencyRecord {
    /// Whether the recorded call ended in an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Status line and headers of a response being recorded.
#[derive(Debug, Clone, Copy)]
pub struct ResponseParts<'a> {
    /// Response status.
    pub status: StatusCode,
    /// Live response headers; copied into the record.
    pub headers: &'a HeaderMap,
}

/// Assembles the record for one call. Pure aggregation, no I/O.
#[must_use]
pub fn build(
    test_id: &str,
    meta: &Meta,
    request: &RequestSnapshot,
    response: Option<ResponseParts<'_>>,
    response_body: &[u8],
    error: Option<&str>,
) -> DependencyRecord {
    let (proto_major, proto_minor) = proto_version(request.version);
    let (status_code, headers) = match response {
        Some(parts) => (parts.status.as_u16(), normalize_headers(parts.headers)),
        None => (0, HeaderValues::new()),
    };
    DependencyRecord {
        version: RECORD_VERSION.to_string(),
        name: test_id.to_string(),
        kind: HTTP_KIND.to_string(),
        meta: meta.clone(),
        request: HttpRequestRecord {
            method: request.method.as_str().to_string(),
            proto_major,
            proto_minor,
            url: request.uri.to_string(),
            headers: request.headers.clone(),
            body: request.body.to_vec(),
        },
        response: HttpResponseRecord {
            status_code,
            headers,
            body: response_body.to_vec(),
        },
        error: error.unwrap_or_default().to_string(),
    }
}

/// Byte-level record of one call: the encoded response/error pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Dependency name (from metadata).
    pub name: String,
    /// Dependency type tag.
    pub kind: String,
    /// Call metadata.
    pub meta: Meta,
    /// Encoded envelopes, response first then error.
    pub data: Vec<Vec<u8>>,
    /// Set when one of the envelopes failed to encode.
    pub incomplete: bool,
}
