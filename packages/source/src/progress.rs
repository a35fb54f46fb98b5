//! Progress reporting for table loads.
//!
//! The loader reports one unit per fetched table through
//! [`ProgressCallback`]; binaries decide how to render it.

use std::sync::Arc;

/// Receives progress updates while tables are fetched.
///
/// Implementations must be `Send + Sync` because table fetches run
/// concurrently and share one callback.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (one unit per table).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
