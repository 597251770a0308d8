//! Replays records loaded from a cassette file.

use std::path::Path;

use http::{Response, StatusCode};
use parking_lot::Mutex;

use crate::body::Body;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::codec::RecordedError;
use crate::context::Context;
use crate::error::CodecError;
use crate::ports::replay::{ReplayLookup, Replayed};
use crate::record::{restore_headers, DependencyRecord, Meta, RequestSnapshot};

/// Serves recorded responses by exact method and URL match.
pub struct CassetteReplay {
    replayer: Mutex<CassetteReplayer>,
}

impl CassetteReplay {
    /// Creates a replay source backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self {
            replayer: Mutex::new(replayer),
        }
    }

    /// Loads a cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        Ok(Self::new(CassetteReplayer::new(&Cassette::load(path)?)))
    }
}

impl ReplayLookup for CassetteReplay {
    fn lookup(
        &self,
        _ctx: &Context,
        request: &RequestSnapshot,
        _meta: &Meta,
    ) -> Result<Option<Replayed>, CodecError> {
        let record = {
            let mut replayer = self.replayer.lock();
            replayer.next_record(request.method.as_str(), &request.uri.to_string()).cloned()
        };
        record.map(replayed_from).transpose()
    }
}

/// Rebuilds the response/error pair of a record.
///
/// A zero status code means the call produced no response.
fn replayed_from(record: DependencyRecord) -> Result<Replayed, CodecError> {
    let response = if record.response.status_code == 0 {
        None
    } else {
        let status = StatusCode::from_u16(record.response.status_code)
            .map_err(|e| CodecError::InvalidResponse(e.to_string()))?;
        let mut response = Response::new(Body::from_bytes(record.response.body));
        *response.status_mut() = status;
        *response.headers_mut() = restore_headers(&record.response.headers);
        Some(response)
    };
    let error = (!record.error.is_empty()).then(|| RecordedError::new(record.error));
    Ok(Replayed { response, error })
}
