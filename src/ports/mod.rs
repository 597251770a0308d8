//! Port traits defining external boundaries.
//!
//! Each trait is a seam between the interceptor and a collaborator it does
//! not own: the real transport, the replay store, the streaming sink and the
//! execution scope that carries the per-call context. Implementations live
//! in `src/adapters/`.

pub mod replay;
pub mod scope;
pub mod sink;
pub mod transport;

pub use replay::{ReplayLookup, Replayed};
pub use scope::ContextResolver;
pub use sink::{CollectorProbe, Dedup, StreamSink};
pub use transport::{Transport, TransportFuture};
