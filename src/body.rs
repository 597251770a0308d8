//! Request and response bodies that can be captured without being lost.
//!
//! A body is a single-read stream. Capturing it reads the stream to the end,
//! closes the original delegate and puts a fresh reader over the captured
//! bytes in its place, so whoever reads the body next sees the same content.

use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;

/// A readable stream backing an unread body.
pub type BodyStream = Box<dyn Read + Send>;

/// A captured byte buffer plus a read cursor.
///
/// Reading advances only this reader's cursor. The buffer itself is shared and
/// immutable, so any number of independent readers can be made from it.
#[derive(Debug, Clone, Default)]
pub struct CapturedBody {
    bytes: Bytes,
    pos: usize,
}

impl CapturedBody {
    /// Wraps the given bytes with a cursor at the start.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            pos: 0,
        }
    }

    /// The full captured content, regardless of cursor position.
    #[must_use]
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// A new reader over the same content, positioned at the start.
    #[must_use]
    pub fn reader(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            pos: 0,
        }
    }
}

impl Read for CapturedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.bytes[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// The state of a request or response body.
///
/// `Absent` and an empty `Unread` stream are different things on the wire
/// ("no body" versus "empty body") and capture keeps them apart.
#[derive(Default)]
pub enum Body {
    /// The message has no body at all.
    #[default]
    Absent,
    /// A stream that has not been read to the end yet.
    Unread(BodyStream),
    /// The stream was read to the end and its delegate closed.
    Drained,
}

impl Body {
    /// A body backed by an arbitrary reader.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::Unread(Box::new(reader))
    }

    /// A body that reads back the given bytes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::Unread(Box::new(CapturedBody::new(bytes)))
    }

    /// A present but empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Whether the message carries no body.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether the underlying stream has already been consumed.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        matches!(self, Self::Drained)
    }

    /// Reads the whole body and restores a fresh reader in its place.
    ///
    /// An absent body yields empty bytes and stays absent. A drained body
    /// yields empty bytes and stays drained. An unread stream is read to the
    /// end and dropped exactly once; on success the body becomes a new reader
    /// over the captured bytes.
    ///
    /// # Errors
    ///
    /// Returns the read error if the stream fails. The body is left drained in
    /// that case, since the delegate has been closed.
    pub fn capture(&mut self) -> io::Result<Bytes> {
        match std::mem::replace(self, Self::Drained) {
            Self::Absent => {
                *self = Self::Absent;
                Ok(Bytes::new())
            }
            Self::Drained => Ok(Bytes::new()),
            Self::Unread(mut stream) => {
                let mut buf = Vec::new();
                let read = stream.read_to_end(&mut buf);
                drop(stream);
                read?;
                let bytes = Bytes::from(buf);
                *self = Self::from_bytes(bytes.clone());
                Ok(bytes)
            }
        }
    }

    /// Consumes the body and returns its full content.
    ///
    /// # Errors
    ///
    /// Returns the read error if the stream fails.
    pub fn into_bytes(mut self) -> io::Result<Bytes> {
        self.capture()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Unread(stream) => {
                let n = stream.read(buf)?;
                if n == 0 && !buf.is_empty() {
                    *self = Self::Drained;
                }
                Ok(n)
            }
            Self::Absent | Self::Drained => Ok(0),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Body::Absent"),
            Self::Unread(_) => f.write_str("Body::Unread(..)"),
            Self::Drained => f.write_str("Body::Drained"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Reader that counts drops and reads, standing in for a network stream.
    struct TrackedStream {
        inner: io::Cursor<Vec<u8>>,
        drops: Arc<AtomicUsize>,
    }

    impl Read for TrackedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Drop for TrackedStream {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Reader whose every read fails, like a stream past its deadline.
    pub(crate) struct FailingStream;

    impl Read for FailingStream {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))
        }
    }

    fn read_all(body: &mut Body) -> Vec<u8> {
        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn capture_restores_identical_stream_and_closes_original_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut body = Body::from_reader(TrackedStream {
            inner: io::Cursor::new(b"hello world".to_vec()),
            drops: Arc::clone(&drops),
        });

        let captured = body.capture().unwrap();
        assert_eq!(&captured[..], b"hello world");
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        assert_eq!(read_all(&mut body), b"hello world");
        assert!(body.is_drained());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn absent_body_stays_absent() {
        let mut body = Body::Absent;
        let captured = body.capture().unwrap();
        assert!(captured.is_empty());
        assert!(body.is_absent());
    }

    #[test]
    fn empty_body_is_not_absent() {
        let mut body = Body::empty();
        let captured = body.capture().unwrap();
        assert!(captured.is_empty());
        assert!(!body.is_absent());
        assert!(matches!(body, Body::Unread(_)));
    }

    #[test]
    fn drained_body_yields_nothing() {
        let mut body = Body::from_bytes("abc");
        assert_eq!(read_all(&mut body), b"abc");
        assert!(body.is_drained());
        assert!(body.capture().unwrap().is_empty());
        assert!(body.is_drained());
    }

    #[test]
    fn capture_twice_returns_same_bytes() {
        let mut body = Body::from_bytes("payload");
        let first = body.capture().unwrap();
        let second = body.capture().unwrap();
        assert_eq!(first, second);
        assert_eq!(read_all(&mut body), b"payload");
    }

    #[test]
    fn read_failure_propagates_and_leaves_body_drained() {
        let mut body = Body::from_reader(FailingStream);
        let err = body.capture().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(body.is_drained());
    }

    #[test]
    fn captured_readers_are_independent() {
        let captured = CapturedBody::new("shared");
        let mut first = captured.reader();
        let mut second = captured.reader();

        let mut head = [0u8; 3];
        first.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"sha");

        let mut all = Vec::new();
        second.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"shared");
        assert_eq!(&captured.as_bytes()[..], b"shared");

        let mut rest = Vec::new();
        first.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"red");
        assert_eq!(first.as_bytes(), captured.as_bytes());
    }
}
