//! Progress reporting for a splitting batch.
//!
//! The pipeline reports through [`ProgressCallback`] without knowing how
//! progress is rendered: a terminal progress bar, log lines, or nothing.

use std::sync::Arc;

/// Receives batch progress. Implementations must be `Send + Sync` so a
/// batch can run on a blocking worker thread.
pub trait ProgressCallback: Send + Sync {
    /// Number of fragments the batch will produce (pages × regions).
    fn set_total(&self, total: u64);

    /// Fragments processed so far, and distinct names found among them.
    fn set_processed(&self, processed: u64, unique_names: usize);

    /// A name was seen for the first time.
    fn name_discovered(&self, name: &str);

    /// The batch completed.
    fn finish(&self, msg: String);

    /// The batch stopped on a fatal error. `msg` replaces any progress
    /// display.
    fn abandon(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_processed(&self, _processed: u64, _unique_names: usize) {}
    fn name_discovered(&self, _name: &str) {}
    fn finish(&self, _msg: String) {}
    fn abandon(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
