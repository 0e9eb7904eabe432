//! Progress reporting for the pipeline phases.
//!
//! The pipeline reports through [`ProgressCallback`] so it stays free of
//! any terminal rendering. The CLI supplies an `indicatif` implementation;
//! tests and library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates for the phase currently running.
pub trait ProgressCallback: Send + Sync {
    /// Starts a phase with `total` units of work.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
