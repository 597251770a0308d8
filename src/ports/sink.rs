//! Streaming sink port for shipping records out of process.

use crate::context::Context;
use crate::record::DependencyRecord;

/// Best-effort external persistence for finished records.
pub trait StreamSink: Send + Sync {
    /// Delivers a record to `destination`.
    ///
    /// Returns `false` when the record was not delivered; the caller then
    /// keeps it in memory instead.
    fn put(&self, ctx: &Context, destination: &str, record: &DependencyRecord) -> bool;
}

/// Guards against sending more than one record per test identifier.
pub trait Dedup: Send + Sync {
    /// Returns `true` the first time a test identifier is seen.
    fn unique(&self, test_id: &str) -> bool;
}

/// Reports whether a remote collector is reachable at all.
pub trait CollectorProbe: Send + Sync {
    /// Whether streaming delivery should be attempted.
    fn available(&self) -> bool;
}
