//! Serves recorded records from a cassette.

use std::collections::HashMap;

use super::format::Cassette;
use crate::record::DependencyRecord;

/// Key for indexing records by request method and URL.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct RequestKey {
    method: String,
    url: String,
}

/// Replays records from a loaded cassette, serving them sequentially per
/// method/URL pair.
#[derive(Debug)]
pub struct CassetteReplayer {
    /// Per method+URL queue of records (in order).
    queues: HashMap<RequestKey, Vec<DependencyRecord>>,
    /// Per method+URL cursor tracking position.
    cursors: HashMap<RequestKey, usize>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<RequestKey, Vec<DependencyRecord>> = HashMap::new();
        for record in &cassette.mocks {
            let key = RequestKey {
                method: record.request.method.clone(),
                url: record.request.url.clone(),
            };
            queues.entry(key).or_default().push(record.clone());
        }
        let cursors = queues.keys().map(|k| (k.clone(), 0)).collect();
        Self { queues, cursors }
    }

    /// Return the next record for the given method and URL, or `None` when
    /// the cassette has no (more) records for that pair.
    pub fn next_record(&mut self, method: &str, url: &str) -> Option<&DependencyRecord> {
        let key = RequestKey {
            method: method.to_string(),
            url: url.to_string(),
        };
        let queue = self.queues.get(&key)?;
        let cursor = self.cursors.get_mut(&key)?;
        let record = queue.get(*cursor)?;
        *cursor += 1;
        Some(record)
    }

    /// Number of records not served yet, across all keys.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues
            .iter()
            .map(|(key, queue)| {
                let used = self.cursors.get(key).copied().unwrap_or(0);
                queue.len().saturating_sub(used)
            })
            .sum()
    }
}
