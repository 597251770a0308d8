//! Replaying adapters that answer calls from recorded outcomes.

pub mod cassette;
pub mod dependency;

pub use cassette::CassetteReplay;
pub use dependency::DependencyReplay;
