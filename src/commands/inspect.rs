//! `depcapture inspect` command.

use std::path::Path;

use serde::Serialize;

use crate::cassette::format::Cassette;

/// One line of a cassette summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockSummary {
    /// Test identifier the record belongs to.
    pub test_id: String,
    /// Request method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Response status; `0` when the call produced no response.
    pub status: u16,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Recorded error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summarizes every record in a cassette, in order.
#[must_use]
pub fn summarize(cassette: &Cassette) -> Vec<MockSummary> {
    cassette
        .mocks
        .iter()
        .map(|mock| MockSummary {
            test_id: mock.name.clone(),
            method: mock.request.method.clone(),
            url: mock.request.url.clone(),
            status: mock.response.status_code,
            response_bytes: mock.response.body.len(),
            error: mock.is_error().then(|| mock.error.clone()),
        })
        .collect()
}

/// Execute the `inspect` command.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded.
pub fn run(path: &Path, json: bool) -> Result<(), String> {
    let cassette = Cassette::load(path)?;
    let summaries = summarize(&cassette);
    if json {
        let out = serde_json::to_string_pretty(&summaries)
            .map_err(|e| format!("Failed to serialize summary: {e}"))?;
        println!("{out}");
        return Ok(());
    }
    println!("{} ({} mocks, recorded {})", cassette.name, summaries.len(), cassette.recorded_at);
    for (i, summary) in summaries.iter().enumerate() {
        let error = summary.error.as_deref().map(|e| format!(" error={e}")).unwrap_or_default();
        println!(
            "{i}\t{}\t{} {}\t{}\t{}B{error}",
            summary.test_id, summary.method, summary.url, summary.status, summary.response_bytes
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::tests::sample_record;
    use chrono::Utc;

    #[test]
    fn summarizes_records_and_errors() {
        let mut failed = sample_record("t-2", "http://svc/down", "");
        failed.response.status_code = 0;
        failed.error = "connection refused".into();
        let cassette = Cassette {
            name: "c".into(),
            recorded_at: Utc::now(),
            mocks: vec![sample_record("t-1", "http://svc/status", "ok"), failed],
        };

        let summaries = summarize(&cassette);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].status, 200);
        assert_eq!(summaries[0].response_bytes, 2);
        assert!(summaries[0].error.is_none());
        assert_eq!(summaries[1].test_id, "t-2");
        assert_eq!(summaries[1].error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn missing_cassette_is_an_error() {
        assert!(run(Path::new("/nonexistent/c.yaml"), false).is_err());
    }
}
