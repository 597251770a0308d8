//! Outbound HTTP interception for deterministic record/replay tests.
//!
//! An [`interceptor::Interceptor`] stands in for the real transport. In
//! record mode it performs each call and captures the outcome as a
//! [`record::DependencyRecord`]; in test mode it answers calls from captured
//! outcomes without touching the network; in off mode it passes calls through.

pub mod adapters;
pub mod body;
pub mod cassette;
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod ports;
pub mod record;

use clap::Parser;

pub use body::Body;
pub use context::{Context, Mode};
pub use error::{CodecError, InterceptError};
pub use interceptor::{Interceptor, StreamDelivery};

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
