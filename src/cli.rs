//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `depcapture`.
#[derive(Debug, Parser)]
#[command(name = "depcapture", version, about = "Record and replay outbound HTTP dependencies")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one request through the interceptor.
    Fetch {
        /// Request URL.
        url: String,
        /// Request method.
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request body.
        #[arg(short, long)]
        data: Option<String>,
        /// Request header as `name: value`; may be repeated.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Mode override (`off`, `record`, `test`).
        #[arg(long)]
        mode: Option<String>,
        /// Test identifier override.
        #[arg(long)]
        test_id: Option<String>,
        /// Cassette file to record into or replay from.
        #[arg(long)]
        cassette: Option<PathBuf>,
    },
    /// Summarize the records in a cassette file.
    Inspect {
        /// Cassette file.
        path: PathBuf,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}
