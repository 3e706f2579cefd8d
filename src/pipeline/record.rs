use log::{info, warn};

use crate::history::{HistoryRecord, HistoryStore, PersistenceError};

/// Remember that `source_url` was published as `video_id`.
///
/// Failures are logged and handed back; the upload has already happened, so
/// callers must not treat them as fatal.
pub fn record(store: &HistoryStore, source_url: &str, video_id: &str) -> Result<(), PersistenceError> {
    match store.append(HistoryRecord::new(source_url, video_id)) {
        Ok(()) => {
            info!("saved to uploaded videos list ({})", store.path().display());
            Ok(())
        }
        Err(e) => {
            warn!("could not save uploaded video to list: {e}");
            Err(e)
        }
    }
}
