//! Mode-dispatching interceptor for outbound HTTP calls.
//!
//! Every call enters [`Interceptor::intercept`], which resolves the active
//! mode and then passes the call through (`Off`), answers it from recorded
//! outcomes (`Test`), or performs it and captures the outcome (`Record`).

use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::adapters::replaying::DependencyReplay;
use crate::body::Body;
use crate::codec::{self, ErrorCarrier};
use crate::context::{Context, Mode, RequestScope};
use crate::error::{BoxError, CodecError, InterceptError};
use crate::ports::{CollectorProbe, ContextResolver, Dedup, ReplayLookup, StreamSink, Transport};
use crate::record::{self, Dependency, DependencyRecord, Meta, RequestSnapshot, ResponseParts};

/// Collaborators used to stream records out of process.
#[derive(Clone)]
pub struct StreamDelivery {
    /// Where records are sent.
    pub sink: Arc<dyn StreamSink>,
    /// Guards against duplicate sends per test identifier.
    pub dedup: Arc<dyn Dedup>,
    /// Gate deciding whether delivery is attempted at all.
    pub probe: Arc<dyn CollectorProbe>,
    /// Destination handed to the sink (a mock path or collector address).
    pub destination: String,
}

/// Substitutes for the real transport during record and test runs.
///
/// The interceptor keeps no per-call state. A call uses the context attached
/// to its extensions, or the interceptor's default context when none is
/// attached. Calls may run concurrently through one shared instance.
pub struct Interceptor {
    transport: Arc<dyn Transport>,
    replay: Arc<dyn ReplayLookup>,
    resolver: Arc<dyn ContextResolver>,
    delivery: Option<StreamDelivery>,
    default: RwLock<Context>,
}

impl Interceptor {
    /// Creates an interceptor around the real transport.
    ///
    /// The default context is in `Off` mode, replay draws on the context's
    /// byte-level dependencies, and no streaming sink is configured.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            replay: Arc::new(DependencyReplay),
            resolver: Arc::new(RequestScope),
            delivery: None,
            default: RwLock::new(Context::off()),
        }
    }

    /// Replaces the default context.
    #[must_use]
    pub fn with_context(self, ctx: Context) -> Self {
        *self.default.write() = ctx;
        self
    }

    /// Replaces the test-mode replay source.
    #[must_use]
    pub fn with_replay(mut self, replay: Arc<dyn ReplayLookup>) -> Self {
        self.replay = replay;
        self
    }

    /// Replaces how the per-call context is found.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Enables streaming delivery of records.
    #[must_use]
    pub fn with_delivery(mut self, delivery: StreamDelivery) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// The context used for calls that carry none.
    #[must_use]
    pub fn default_context(&self) -> Context {
        self.default.read().clone()
    }

    /// Adopts the context attached to `request` as the new default.
    ///
    /// Does nothing when the request carries no context.
    pub fn set_context<B>(&self, request: &Request<B>) {
        if let Some(ctx) = self.resolver.resolve(request.extensions()) {
            debug!(test_id = ctx.test_id(), mode = %ctx.mode(), "interceptor context set");
            *self.default.write() = ctx;
        }
    }

    /// Handles one outbound call in place of the real transport.
    ///
    /// # Errors
    ///
    /// - [`InterceptError::Capture`] when a body cannot be read.
    /// - [`InterceptError::NoMock`] when test mode has nothing to replay.
    /// - [`InterceptError::Codec`] when a matched record cannot be decoded.
    /// - [`InterceptError::Transport`] for real or replayed call errors.
    pub async fn intercept(
        &self,
        request: Request<Body>,
    ) -> Result<Response<Body>, InterceptError> {
        let scoped = self.resolver.resolve(request.extensions());
        let ctx = scoped.clone().unwrap_or_else(|| self.default_context());

        match ctx.mode() {
            Mode::Off => self
                .transport
                .round_trip(request)
                .await
                .map_err(InterceptError::Transport),
            Mode::Test => {
                let (_request, snapshot, meta) = prepare(request, &ctx, scoped.is_some())?;
                self.replay(&ctx, &snapshot, &meta)
            }
            Mode::Record => {
                let (request, snapshot, meta) = prepare(request, &ctx, scoped.is_some())?;
                self.record(&ctx, request, snapshot, meta).await
            }
        }
    }

    fn replay(
        &self,
        ctx: &Context,
        snapshot: &RequestSnapshot,
        meta: &Meta,
    ) -> Result<Response<Body>, InterceptError> {
        let Some(replayed) = self.replay.lookup(ctx, snapshot, meta)? else {
            warn!(
                test_id = ctx.test_id(),
                method = %snapshot.method,
                url = %snapshot.uri,
                "no mock available for dependency call"
            );
            return Err(InterceptError::NoMock {
                method: snapshot.method.to_string(),
                url: snapshot.uri.to_string(),
            });
        };
        match (replayed.response, replayed.error) {
            (_, Some(err)) => Err(InterceptError::Transport(Box::new(err))),
            (Some(response), None) => Ok(response),
            (None, None) => Err(InterceptError::Codec(CodecError::Missing("response"))),
        }
    }

    async fn record(
        &self,
        ctx: &Context,
        request: Request<Body>,
        snapshot: RequestSnapshot,
        meta: Meta,
    ) -> Result<Response<Body>, InterceptError> {
        let mut result = self.transport.round_trip(request).await;

        let response_body = match &mut result {
            Ok(response) => response.body_mut().capture().map_err(|e| {
                error!(test_id = ctx.test_id(), error = %e, "unable to read response body");
                InterceptError::Capture(e)
            })?,
            Err(_) => Bytes::new(),
        };
        let error_text = result.as_ref().err().map(ToString::to_string);
        let parts = result
            .as_ref()
            .ok()
            .map(|r| ResponseParts {
                status: r.status(),
                headers: r.headers(),
            });
        let record = record::build(
            ctx.test_id(),
            &meta,
            &snapshot,
            parts,
            &response_body,
            error_text.as_deref(),
        );

        if !self.deliver(ctx, &record) {
            let dependency = encode_dependency(ctx, meta, &mut result);
            ctx.push(record, dependency);
        }
        result.map_err(InterceptError::Transport)
    }

    /// Hands the record to the streaming sink when one applies.
    ///
    /// Returns `false` when the record must be kept in memory instead.
    fn deliver(&self, ctx: &Context, record: &DependencyRecord) -> bool {
        let Some(delivery) = &self.delivery else {
            return false;
        };
        if !delivery.probe.available()
            || !ctx.file_export()
            || !delivery.dedup.unique(ctx.test_id())
        {
            return false;
        }
        let delivered = delivery.sink.put(ctx, &delivery.destination, record);
        if delivered {
            info!(
                test_id = ctx.test_id(),
                meta = ?record.meta,
                "captured the mocked outputs for http dependency call"
            );
        } else {
            warn!(
                test_id = ctx.test_id(),
                destination = %delivery.destination,
                "streaming delivery failed, keeping record in memory"
            );
        }
        delivered
    }
}

/// Captures the request body, restores it, and attaches the context.
fn prepare(
    mut request: Request<Body>,
    ctx: &Context,
    scoped: bool,
) -> Result<(Request<Body>, RequestSnapshot, Meta), InterceptError> {
    let body = request.body_mut().capture().map_err(|e| {
        error!(test_id = ctx.test_id(), error = %e, "unable to read request body");
        InterceptError::Capture(e)
    })?;
    if !scoped {
        ctx.attach(request.extensions_mut());
    }
    let meta = record::http_meta(request.method());
    let snapshot = RequestSnapshot::of(&request, body);
    Ok((request, snapshot, meta))
}

/// Encodes the response/error pair into a byte-level record.
///
/// Encoding failures are logged and mark the record incomplete; they never
/// fail the call. After `record` has captured the response body only an
/// unreadable body stream can make the response envelope fail.
fn encode_dependency(
    ctx: &Context,
    meta: Meta,
    result: &mut Result<Response<Body>, BoxError>,
) -> Dependency {
    let carrier = ErrorCarrier {
        message: result.as_ref().err().map(ToString::to_string),
    };
    let encoded = [
        ("response", codec::encode_response(result.as_mut().ok())),
        ("error", codec::encode_error(&carrier)),
    ];

    let mut incomplete = false;
    let data = encoded
        .into_iter()
        .map(|(shape, encoded)| {
            encoded.unwrap_or_else(|err| {
                error!(
                    shape,
                    test_id = ctx.test_id(),
                    error = %err,
                    "dependency capture failed: failed to encode object"
                );
                incomplete = true;
                Vec::new()
            })
        })
        .collect();

    Dependency {
        name: meta.get("name").cloned().unwrap_or_default(),
        kind: meta.get("type").cloned().unwrap_or_default(),
        meta,
        data,
        incomplete,
    }
}
