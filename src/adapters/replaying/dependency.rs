//! Replays the byte-level dependencies held by the context.

use tracing::debug;

use crate::codec;
use crate::context::Context;
use crate::error::CodecError;
use crate::ports::replay::{ReplayLookup, Replayed};
use crate::record::{Meta, RequestSnapshot};

/// Serves the context's byte-level dependencies in recorded order.
///
/// Each lookup consumes the next dependency and decodes its response/error
/// envelopes. An exhausted queue is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyReplay;

impl ReplayLookup for DependencyReplay {
    fn lookup(
        &self,
        ctx: &Context,
        request: &RequestSnapshot,
        _meta: &Meta,
    ) -> Result<Option<Replayed>, CodecError> {
        let Some(dependency) = ctx.next_dependency() else {
            return Ok(None);
        };
        debug!(
            test_id = ctx.test_id(),
            method = %request.method,
            url = %request.uri,
            incomplete = dependency.incomplete,
            "replaying recorded dependency"
        );
        let outputs = codec::decode_outputs(&dependency.data)?;
        Ok(Some(Replayed {
            response: outputs.response,
            error: outputs.error.into_error(),
        }))
    }
}
