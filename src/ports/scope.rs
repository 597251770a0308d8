//! Execution scope port for per-call context lookup.

use http::Extensions;

use crate::context::Context;

/// Finds the context attached to a call, if any.
pub trait ContextResolver: Send + Sync {
    /// Returns the context carried by the call's extensions.
    fn resolve(&self, extensions: &Extensions) -> Option<Context>;
}
