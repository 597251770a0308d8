//! Streaming sink that appends records to a cassette.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cassette::recorder::CassetteRecorder;
use crate::context::Context;
use crate::ports::sink::StreamSink;
use crate::record::DependencyRecord;

/// Delivers records straight into a shared cassette recorder.
pub struct CassetteSink {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl CassetteSink {
    /// Creates a sink writing into the given recorder.
    pub fn new(recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { recorder }
    }
}

impl StreamSink for CassetteSink {
    fn put(&self, ctx: &Context, destination: &str, record: &DependencyRecord) -> bool {
        let mut recorder = self.recorder.lock();
        if recorder.path() != std::path::Path::new(destination) {
            debug!(
                destination,
                cassette = %recorder.path().display(),
                "destination does not match cassette"
            );
            return false;
        }
        debug!(test_id = ctx.test_id(), destination, "record streamed to cassette");
        recorder.record(record.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::tests::sample_record;
    use crate::context::Mode;

    #[test]
    fn puts_records_for_matching_destination_only() {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new("/tmp/mocks.yaml", "m")));
        let sink = CassetteSink::new(Arc::clone(&recorder));
        let ctx = Context::new(Mode::Record, "t");
        let record = sample_record("t", "http://svc/a", "1");

        assert!(sink.put(&ctx, "/tmp/mocks.yaml", &record));
        assert!(!sink.put(&ctx, "/tmp/other.yaml", &record));
        assert_eq!(recorder.lock().len(), 1);
    }
}
