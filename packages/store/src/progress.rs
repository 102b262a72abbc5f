//! Progress reporting while datasets load.
//!
//! The store only reports; rendering (progress bars, log lines, nothing) is
//! chosen by the caller.

use std::sync::Arc;

/// Receives progress updates from [`crate::PointStore::from_manifest`].
///
/// `Send + Sync` so one reporter can be shared behind an `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of sources to load.
    fn set_total(&self, total: u64);

    /// Advances by `delta` sources.
    fn inc(&self, delta: u64);

    /// Describes the source currently loading.
    fn set_message(&self, msg: String);

    /// Marks loading complete.
    fn finish(&self, msg: String);
}

/// Discards all updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
