//! Collects records into a cassette file.

use std::path::PathBuf;

use chrono::Utc;

use super::format::Cassette;
use crate::record::DependencyRecord;

/// Collects dependency records and writes them as a YAML cassette file.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    mocks: Vec<DependencyRecord>,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mocks: Vec::new(),
        }
    }

    /// Destination file of this recorder.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one record.
    pub fn record(&mut self, record: DependencyRecord) {
        self.mocks.push(record);
    }

    /// Append several records in order.
    pub fn extend(&mut self, records: impl IntoIterator<Item = DependencyRecord>) {
        self.mocks.extend(records);
    }

    /// Number of records collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mocks.len()
    }

    /// Whether nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mocks.is_empty()
    }

    /// Finish recording and write the cassette YAML file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            mocks: self.mocks,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::tests::sample_record;

    #[test]
    fn record_and_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.cassette.yaml");

        let mut recorder = CassetteRecorder::new(&path, "test-recording");
        assert!(recorder.is_empty());
        recorder.record(sample_record("t", "http://svc/a", "1"));
        recorder.extend([
            sample_record("t", "http://svc/b", "2"),
            sample_record("t", "http://svc/c", "3"),
        ]);
        assert_eq!(recorder.len(), 3);

        let result_path = recorder.finish().expect("finish should succeed");
        assert_eq!(result_path, path);

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.name, "test-recording");
        assert_eq!(cassette.mocks.len(), 3);
        assert_eq!(cassette.mocks[0].request.url, "http://svc/a");
        assert_eq!(cassette.mocks[2].response.body, b"3");
    }
}
