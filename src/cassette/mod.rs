//! Cassette files holding captured dependency records.

pub mod format;
pub mod recorder;
pub mod replayer;
