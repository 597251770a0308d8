//! Command dispatch and handlers.

pub mod fetch;
pub mod inspect;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Fetch {
            url,
            method,
            data,
            headers,
            mode,
            test_id,
            cassette,
        } => fetch::run(&fetch::FetchArgs {
            url,
            method,
            data: data.as_deref(),
            headers,
            mode: mode.as_deref(),
            test_id: test_id.as_deref(),
            cassette: cassette.as_deref(),
        }),
        Command::Inspect { path, json } => inspect::run(path, *json),
    }
}
