//! In-process duplicate guard and collector gate.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::ports::sink::{CollectorProbe, Dedup};

/// Remembers which test identifiers have already been streamed.
#[derive(Debug, Default)]
pub struct MockIds {
    seen: Mutex<HashSet<String>>,
}

impl MockIds {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dedup for MockIds {
    fn unique(&self, test_id: &str) -> bool {
        self.seen.lock().insert(test_id.to_string())
    }
}

/// Collector gate with a fixed answer, typically taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl CollectorProbe for StaticProbe {
    fn available(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_test_id_is_unique_once() {
        let ids = MockIds::new();
        assert!(ids.unique("a"));
        assert!(!ids.unique("a"));
        assert!(ids.unique("b"));
    }

    #[test]
    fn static_probe_reports_configured_value() {
        assert!(StaticProbe(true).available());
        assert!(!StaticProbe(false).available());
    }
}
