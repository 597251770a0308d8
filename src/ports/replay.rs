//! Replay port for test-mode substitute responses.

use http::Response;

use crate::body::Body;
use crate::codec::RecordedError;
use crate::context::Context;
use crate::error::CodecError;
use crate::record::{Meta, RequestSnapshot};

/// A matched replay: the recorded response and error.
#[derive(Debug)]
pub struct Replayed {
    /// Recorded response; `None` when the original call produced none.
    pub response: Option<Response<Body>>,
    /// Recorded error, if the original call failed.
    pub error: Option<RecordedError>,
}

/// Looks up a substitute response for a request.
pub trait ReplayLookup: Send + Sync {
    /// Returns the recorded outcome matching the request, or `None` on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error when a matching record exists but cannot be decoded.
    fn lookup(
        &self,
        ctx: &Context,
        request: &RequestSnapshot,
        meta: &Meta,
    ) -> Result<Option<Replayed>, CodecError>;
}
