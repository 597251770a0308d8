//! Transport port for issuing real HTTP calls.

use std::future::Future;
use std::pin::Pin;

use http::{Request, Response};

use crate::body::Body;
use crate::error::BoxError;

/// Boxed future type alias used by [`Transport`] to keep the trait dyn-compatible.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Response<Body>, BoxError>> + Send + 'a>>;

/// Sends a request over the network and returns the response.
pub trait Transport: Send + Sync {
    /// Performs one round trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails (connect, timeout, protocol, etc.).
    fn round_trip(&self, request: Request<Body>) -> TransportFuture<'_>;
}
