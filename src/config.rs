//! Interceptor configuration read from the environment.

use std::path::PathBuf;

use uuid::Uuid;

use crate::context::{Context, Mode};
use crate::error::InterceptError;

/// Environment variable selecting the mode (`off`, `record`, `test`).
pub const MODE_VAR: &str = "DEPCAPTURE_MODE";
/// Environment variable naming the current test.
pub const TEST_ID_VAR: &str = "DEPCAPTURE_TEST_ID";
/// Environment variable enabling streaming delivery of records.
pub const FILE_EXPORT_VAR: &str = "DEPCAPTURE_FILE_EXPORT";
/// Environment variable pointing at the cassette file.
pub const MOCK_PATH_VAR: &str = "DEPCAPTURE_MOCK_PATH";
/// Environment variable declaring a remote collector reachable.
pub const COLLECTOR_VAR: &str = "DEPCAPTURE_COLLECTOR";

/// Settings for one run of the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorConfig {
    /// Operating mode.
    pub mode: Mode,
    /// Identifier of the current test.
    pub test_id: String,
    /// Stream records to a sink instead of keeping them in memory.
    pub file_export: bool,
    /// Cassette file used for streaming delivery and replay.
    pub mock_path: Option<PathBuf>,
    /// Whether a remote collector is available for streaming delivery.
    pub collector: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Off,
            test_id: Uuid::new_v4().to_string(),
            file_export: false,
            mock_path: None,
            collector: false,
        }
    }
}

impl InterceptorConfig {
    /// Loads configuration from the process environment, after applying any
    /// `.env` file found in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::InvalidMode`] for an unrecognized mode.
    pub fn from_env() -> Result<Self, InterceptError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::InvalidMode`] for an unrecognized mode.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, InterceptError> {
        let defaults = Self::default();
        Ok(Self {
            mode: lookup(MODE_VAR).map(|m| m.parse::<Mode>()).transpose()?.unwrap_or(defaults.mode),
            test_id: lookup(TEST_ID_VAR).filter(|id| !id.is_empty()).unwrap_or(defaults.test_id),
            file_export: lookup(FILE_EXPORT_VAR).is_some_and(|v| parse_flag(&v)),
            mock_path: lookup(MOCK_PATH_VAR).filter(|p| !p.is_empty()).map(PathBuf::from),
            collector: lookup(COLLECTOR_VAR).is_some_and(|v| parse_flag(&v)),
        })
    }

    /// A fresh context reflecting this configuration.
    #[must_use]
    pub fn context(&self) -> Context {
        Context::new(self.mode, self.test_id.clone()).with_file_export(self.file_export)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_off_with_generated_test_id() {
        let config = InterceptorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.mode, Mode::Off);
        assert!(Uuid::parse_str(&config.test_id).is_ok());
        assert!(!config.file_export);
        assert!(config.mock_path.is_none());
        assert!(!config.collector);
    }

    #[test]
    fn reads_all_variables() {
        let config = InterceptorConfig::from_lookup(lookup(&[
            (MODE_VAR, "record"),
            (TEST_ID_VAR, "test-7"),
            (FILE_EXPORT_VAR, "true"),
            (MOCK_PATH_VAR, "mocks/test-7.yaml"),
            (COLLECTOR_VAR, "1"),
        ]))
        .unwrap();
        assert_eq!(config.mode, Mode::Record);
        assert_eq!(config.test_id, "test-7");
        assert!(config.file_export);
        assert_eq!(config.mock_path, Some(PathBuf::from("mocks/test-7.yaml")));
        assert!(config.collector);

        let ctx = config.context();
        assert_eq!(ctx.mode(), Mode::Record);
        assert_eq!(ctx.test_id(), "test-7");
        assert!(ctx.file_export());
    }

    #[test]
    fn invalid_mode_is_a_configuration_error() {
        let err = InterceptorConfig::from_lookup(lookup(&[(MODE_VAR, "capture")])).unwrap_err();
        assert!(matches!(err, InterceptError::InvalidMode(_)));
    }
}
