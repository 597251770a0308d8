//! Recording adapters that ship captured records out of process.

pub mod dedup;
pub mod sink;

pub use dedup::{MockIds, StaticProbe};
pub use sink::CassetteSink;
