//! Error types for interception and the opaque value codec.

use thiserror::Error;

/// Boxed error type used at the transport boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while encoding or decoding opaque envelopes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Draining a live body stream failed.
    #[error("failed to drain body stream: {0}")]
    Io(#[from] std::io::Error),

    /// The envelope bytes could not be (de)serialized.
    #[error("malformed opaque envelope: {0}")]
    Malformed(#[from] bincode::Error),

    /// The envelope decoded to a different shape than the caller expected.
    #[error("unexpected envelope: expected {expected}, found {found}")]
    UnexpectedShape {
        /// The shape the caller asked for.
        expected: &'static str,
        /// The shape actually present in the bytes.
        found: &'static str,
    },

    /// An expected envelope is missing from a byte-level record.
    #[error("missing {0} envelope")]
    Missing(&'static str),

    /// A decoded response could not be reassembled.
    #[error("invalid response in envelope: {0}")]
    InvalidResponse(String),
}

/// Errors returned from [`crate::interceptor::Interceptor::intercept`].
///
/// All of them travel through the same result channel as ordinary transport
/// errors.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// The configured mode text is not one of `off`, `record` or `test`.
    #[error("integrations: not in a valid sdk mode: {0:?}")]
    InvalidMode(String),

    /// A request or response body could not be read in full.
    #[error("failed to capture body: {0}")]
    Capture(#[source] std::io::Error),

    /// The real transport failed, or a replayed mock carried an error.
    #[error(transparent)]
    Transport(BoxError),

    /// Test mode found nothing to replay for this request.
    #[error("no mock available for {method} {url}")]
    NoMock {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
    },

    /// A recorded dependency could not be decoded during replay.
    #[error("failed to decode recorded dependency: {0}")]
    Codec(#[from] CodecError),
}

impl InterceptError {
    /// Returns `true` when the error is a test-mode replay miss.
    #[must_use]
    pub fn is_no_mock(&self) -> bool {
        matches!(self, Self::NoMock { .. })
    }
}
