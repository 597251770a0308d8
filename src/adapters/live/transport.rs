//! Live adapter for the `Transport` port using `reqwest`.

use std::time::Duration;

use http::Response;
use reqwest::Client;

use crate::body::Body;
use crate::error::BoxError;
use crate::ports::transport::{Transport, TransportFuture};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Live transport that sends requests over the network.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a live transport with a 30 second request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a live transport with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl ReqwestTransport {
    async fn send(&self, request: http::Request<Body>) -> Result<Response<Body>, BoxError> {
        let (parts, body) = request.into_parts();
        let mut builder =
            self.client.request(parts.method, parts.uri.to_string()).headers(parts.headers);
        if !body.is_absent() {
            builder = builder.body(body.into_bytes()?);
        }

        let response = builder.send().await?;
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let mut out = Response::new(Body::from_bytes(bytes));
        *out.status_mut() = status;
        *out.version_mut() = version;
        *out.headers_mut() = headers;
        Ok(out)
    }
}

impl Transport for ReqwestTransport {
    fn round_trip(&self, request: http::Request<Body>) -> TransportFuture<'_> {
        Box::pin(self.send(request))
    }
}
