//! Opaque value codec.
//!
//! Turns values that are not plain data (live body streams, errors, public key
//! material) into a restorable binary envelope and back. The set of shapes is
//! closed: every envelope is one variant of [`Opaque`], so there is no
//! registration step and no "unregistered type" failure at runtime.
//!
//! Envelopes are `bincode` encodings of a tagged union. Decoding yields values
//! that behave the same for downstream consumers (same bytes read, same error
//! message) even where the original type cannot be compared directly.

use std::io;

use bytes::Bytes;
use http::{Response, StatusCode, Version};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::CodecError;
use crate::record::{proto_version, raw_headers, restore_raw_headers, RawHeaderValues};

/// Named elliptic curves whose parameters are known at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedCurve {
    /// NIST P-224.
    P224,
    /// NIST P-256.
    P256,
    /// NIST P-384.
    P384,
    /// NIST P-521.
    P521,
}

impl NamedCurve {
    /// Canonical curve name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::P224 => "P-224",
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Field size in bits.
    #[must_use]
    pub fn bit_size(self) -> usize {
        match self {
            Self::P224 => 224,
            Self::P256 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
        }
    }
}

/// Public key material that can appear on a captured response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMaterial {
    /// ECDSA public key: a curve and the big-endian point coordinates.
    Ecdsa {
        /// Curve the point lives on.
        curve: NamedCurve,
        /// X coordinate.
        x: Vec<u8>,
        /// Y coordinate.
        y: Vec<u8>,
    },
    /// RSA public key: big-endian modulus and public exponent.
    Rsa {
        /// Modulus.
        n: Vec<u8>,
        /// Public exponent.
        e: u64,
    },
}

/// Response extension carrying the TLS peer's public key, when the transport
/// knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerKey(pub KeyMaterial);

/// An error recovered from an envelope. Displays the original message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RecordedError {
    message: String,
}

impl RecordedError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The recorded message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Plain-data stand-in for an error: present with a message, or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCarrier {
    /// The error message, or `None` when the call did not fail.
    pub message: Option<String>,
}

impl ErrorCarrier {
    /// A carrier for "no error".
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Wraps an optional error.
    #[must_use]
    pub fn from_error(err: Option<&(dyn std::error::Error + 'static)>) -> Self {
        Self {
            message: err.map(ToString::to_string),
        }
    }

    /// Whether the carrier holds an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.message.is_some()
    }

    /// Unwraps the carrier into the recovered error, if any.
    #[must_use]
    pub fn into_error(self) -> Option<RecordedError> {
        self.message.map(RecordedError::new)
    }
}

/// A body wrapper whose encoding drains the live stream.
///
/// Encoding is one-shot and mutating: the delegate is read to the end and
/// closed, and the wrapper keeps a buffered reader over the same bytes.
#[derive(Debug, Default)]
pub struct OpaqueBody {
    body: Body,
}

impl OpaqueBody {
    /// Wraps a body.
    #[must_use]
    pub fn new(body: Body) -> Self {
        Self { body }
    }

    /// Drains the wrapped stream, leaving a buffered reader in place.
    ///
    /// # Errors
    ///
    /// Returns the read error if the stream fails.
    pub fn drain(&mut self) -> io::Result<Option<Bytes>> {
        let bytes = self.body.capture()?;
        Ok(if self.body.is_absent() {
            None
        } else {
            Some(bytes)
        })
    }

    /// The wrapped body.
    #[must_use]
    pub fn into_body(self) -> Body {
        self.body
    }
}

/// A value that has an envelope representation.
#[derive(Debug)]
pub enum Opaque {
    /// A response; `None` when the call produced no response at all.
    Response(Option<Response<Body>>),
    /// A standalone body.
    Body(OpaqueBody),
    /// An error carrier.
    Error(ErrorCarrier),
    /// Public key material.
    Key(KeyMaterial),
}

impl Opaque {
    /// Encodes the value into an envelope. Live bodies are drained.
    ///
    /// # Errors
    ///
    /// Fails if a body stream cannot be read or serialization fails.
    pub fn encode(&mut self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Response(response) => encode_response(response.as_mut()),
            Self::Body(body) => {
                let envelope = Envelope::Body(body.drain()?.map(|b| b.to_vec()));
                Ok(bincode::serialize(&envelope)?)
            }
            Self::Error(carrier) => encode_error(carrier),
            Self::Key(key) => Ok(bincode::serialize(&Envelope::Key(key.clone()))?),
        }
    }

    /// Decodes an envelope of any shape.
    ///
    /// # Errors
    ///
    /// Fails if the bytes are not a valid envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(match bincode::deserialize::<Envelope>(bytes)? {
            Envelope::Response(response) => {
                Self::Response(response.map(into_response).transpose()?)
            }
            Envelope::Body(bytes) => Self::Body(OpaqueBody::new(restore_body(bytes))),
            Envelope::Error(carrier) => Self::Error(carrier),
            Envelope::Key(key) => Self::Key(key),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
enum Envelope {
    Response(Option<ResponseEnvelope>),
    Body(Option<Vec<u8>>),
    Error(ErrorCarrier),
    Key(KeyMaterial),
}

impl Envelope {
    fn shape(&self) -> &'static str {
        match self {
            Self::Response(_) => "response",
            Self::Body(_) => "body",
            Self::Error(_) => "error",
            Self::Key(_) => "key",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ResponseEnvelope {
    status: u16,
    proto: (u8, u8),
    headers: RawHeaderValues,
    body: Option<Vec<u8>>,
    peer_key: Option<KeyMaterial>,
}

fn restore_body(bytes: Option<Vec<u8>>) -> Body {
    bytes.map_or(Body::Absent, Body::from_bytes)
}

fn version_from(proto: (u8, u8)) -> Version {
    match proto {
        (0, 9) => Version::HTTP_09,
        (1, 0) => Version::HTTP_10,
        (2, _) => Version::HTTP_2,
        (3, _) => Version::HTTP_3,
        _ => Version::HTTP_11,
    }
}

fn into_response(envelope: ResponseEnvelope) -> Result<Response<Body>, CodecError> {
    let status = StatusCode::from_u16(envelope.status)
        .map_err(|e| CodecError::InvalidResponse(e.to_string()))?;
    let mut response = Response::new(restore_body(envelope.body));
    *response.status_mut() = status;
    *response.version_mut() = version_from(envelope.proto);
    *response.headers_mut() = restore_raw_headers(&envelope.headers);
    if let Some(key) = envelope.peer_key {
        response.extensions_mut().insert(PeerKey(key));
    }
    Ok(response)
}

fn expect_shape(bytes: &[u8], expected: &'static str) -> Result<Envelope, CodecError> {
    let envelope: Envelope = bincode::deserialize(bytes)?;
    if envelope.shape() == expected {
        Ok(envelope)
    } else {
        Err(CodecError::UnexpectedShape {
            expected,
            found: envelope.shape(),
        })
    }
}

/// Encodes a response, draining its body and restoring a readable one.
///
/// `None` encodes an explicit "no response" marker, which decodes back to
/// `None` rather than to an empty response.
///
/// # Errors
///
/// Fails if the body cannot be read or serialization fails.
pub fn encode_response(response: Option<&mut Response<Body>>) -> Result<Vec<u8>, CodecError> {
    let envelope = match response {
        None => None,
        Some(response) => {
            let bytes = response.body_mut().capture()?;
            let body = if response.body().is_absent() {
                None
            } else {
                Some(bytes.to_vec())
            };
            Some(ResponseEnvelope {
                status: response.status().as_u16(),
                proto: proto_version(response.version()),
                headers: raw_headers(response.headers()),
                body,
                peer_key: response.extensions().get::<PeerKey>().map(|k| k.0.clone()),
            })
        }
    };
    Ok(bincode::serialize(&Envelope::Response(envelope))?)
}

/// Decodes a response envelope.
///
/// # Errors
///
/// Fails on malformed bytes or when the envelope holds another shape.
pub fn decode_response(bytes: &[u8]) -> Result<Option<Response<Body>>, CodecError> {
    match expect_shape(bytes, "response")? {
        Envelope::Response(response) => response.map(into_response).transpose(),
        other => Err(CodecError::UnexpectedShape {
            expected: "response",
            found: other.shape(),
        }),
    }
}

/// Encodes an error carrier.
///
/// # Errors
///
/// Fails if serialization fails.
pub fn encode_error(carrier: &ErrorCarrier) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(&Envelope::Error(carrier.clone()))?)
}

/// Decodes an error carrier envelope.
///
/// # Errors
///
/// Fails on malformed bytes or when the envelope holds another shape.
pub fn decode_error(bytes: &[u8]) -> Result<ErrorCarrier, CodecError> {
    match expect_shape(bytes, "error")? {
        Envelope::Error(carrier) => Ok(carrier),
        other => Err(CodecError::UnexpectedShape {
            expected: "error",
            found: other.shape(),
        }),
    }
}

/// A decoded response/error pair.
#[derive(Debug)]
pub struct Outputs {
    /// The recorded response, if the call produced one.
    pub response: Option<Response<Body>>,
    /// The recorded error, if any.
    pub error: ErrorCarrier,
}

/// Decodes the `[response, error]` envelopes of a byte-level record.
///
/// # Errors
///
/// Fails when an envelope is missing or cannot be decoded.
pub fn decode_outputs(data: &[Vec<u8>]) -> Result<Outputs, CodecError> {
    let response = data.first().ok_or(CodecError::Missing("response"))?;
    let error = data.get(1).ok_or(CodecError::Missing("error"))?;
    Ok(Outputs {
        response: decode_response(response)?,
        error: decode_error(error)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::io::Read;

    fn read_body(body: &mut Body) -> Vec<u8> {
        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        out
    }

    fn sample_response() -> Response<Body> {
        Response::builder()
            .status(201)
            .header("x-test", "1")
            .header("content-type", "text/plain")
            .body(Body::from_bytes("created"))
            .unwrap()
    }

    #[test]
    fn response_and_error_pair_restores_semantically() {
        let mut response = sample_response();
        let carrier = ErrorCarrier::from_error(Some(&RecordedError::new("upstream reset")));
        let data = vec![
            encode_response(Some(&mut response)).unwrap(),
            encode_error(&carrier).unwrap(),
        ];

        // The encoded response is still readable by the caller.
        assert_eq!(read_body(response.body_mut()), b"created");

        let outputs = decode_outputs(&data).unwrap();
        let mut decoded = outputs.response.unwrap();
        assert_eq!(decoded.status(), StatusCode::CREATED);
        assert_eq!(decoded.headers()["x-test"], "1");
        assert_eq!(decoded.headers()["content-type"], "text/plain");
        assert_eq!(read_body(decoded.body_mut()), b"created");
        assert_eq!(outputs.error.into_error().unwrap().to_string(), "upstream reset");
    }

    #[test]
    fn non_utf8_header_bytes_survive_round_trip() {
        let mut response = sample_response();
        response.headers_mut().append("x-latin1", HeaderValue::from_bytes(b"caf\xE9").unwrap());
        response.headers_mut().append("x-latin1", HeaderValue::from_static("plain"));

        let bytes = encode_response(Some(&mut response)).unwrap();
        let decoded = decode_response(&bytes).unwrap().unwrap();

        let original: Vec<&[u8]> =
            response.headers().get_all("x-latin1").iter().map(HeaderValue::as_bytes).collect();
        let restored: Vec<&[u8]> =
            decoded.headers().get_all("x-latin1").iter().map(HeaderValue::as_bytes).collect();
        assert_eq!(restored, original);
        assert_eq!(restored[0], b"caf\xE9");
    }

    #[test]
    fn absent_response_differs_from_empty_response() {
        let absent = encode_response(None).unwrap();
        assert!(decode_response(&absent).unwrap().is_none());

        let mut empty = Response::new(Body::Absent);
        let bytes = encode_response(Some(&mut empty)).unwrap();
        let decoded = decode_response(&bytes).unwrap().unwrap();
        assert_eq!(decoded.status(), StatusCode::OK);
        assert!(decoded.body().is_absent());
    }

    #[test]
    fn nil_error_carrier_round_trips_as_absent() {
        let bytes = encode_error(&ErrorCarrier::none()).unwrap();
        let carrier = decode_error(&bytes).unwrap();
        assert!(!carrier.is_error());
        assert!(carrier.into_error().is_none());
    }

    #[test]
    fn encoding_live_body_drains_and_closes_delegate() {
        let stream = io::Cursor::new(b"stream".to_vec());
        let mut opaque = Opaque::Body(OpaqueBody::new(Body::from_reader(stream)));
        let bytes = opaque.encode().unwrap();

        let Opaque::Body(original) = opaque else {
            panic!("shape changed")
        };
        let mut original = original.into_body();
        assert_eq!(read_body(&mut original), b"stream");

        let Opaque::Body(decoded) = Opaque::decode(&bytes).unwrap() else {
            panic!("wrong shape")
        };
        let mut decoded = decoded.into_body();
        assert_eq!(read_body(&mut decoded), b"stream");
    }

    #[test]
    fn decoded_body_does_not_alias_input_buffer() {
        let mut opaque = Opaque::Body(OpaqueBody::new(Body::from_bytes("abc")));
        let mut bytes = opaque.encode().unwrap();
        let Opaque::Body(decoded) = Opaque::decode(&bytes).unwrap() else {
            panic!("wrong shape")
        };
        for b in &mut bytes {
            *b = 0;
        }
        assert_eq!(read_body(&mut decoded.into_body()), b"abc");
    }

    #[test]
    fn key_material_and_peer_key_extension_round_trip() {
        let key = KeyMaterial::Ecdsa {
            curve: NamedCurve::P256,
            x: vec![1, 2, 3],
            y: vec![4, 5, 6],
        };
        let mut opaque = Opaque::Key(key.clone());
        let Opaque::Key(decoded) = Opaque::decode(&opaque.encode().unwrap()).unwrap() else {
            panic!("wrong shape")
        };
        assert_eq!(decoded, key);
        assert_eq!(NamedCurve::P256.name(), "P-256");

        let mut response = sample_response();
        let rsa = KeyMaterial::Rsa {
            n: vec![0xC3, 0x01],
            e: 65537,
        };
        response.extensions_mut().insert(PeerKey(rsa.clone()));
        let bytes = encode_response(Some(&mut response)).unwrap();
        let decoded = decode_response(&bytes).unwrap().unwrap();
        assert_eq!(decoded.extensions().get::<PeerKey>(), Some(&PeerKey(rsa)));
    }

    #[test]
    fn wrong_shape_and_garbage_are_rejected() {
        let error_bytes = encode_error(&ErrorCarrier::none()).unwrap();
        let err = decode_response(&error_bytes).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedShape {
                expected: "response",
                found: "error"
            }
        ));

        let garbage = decode_error(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(garbage, Err(CodecError::Malformed(_))));
        assert!(matches!(decode_outputs(&[]), Err(CodecError::Missing("response"))));
    }
}
