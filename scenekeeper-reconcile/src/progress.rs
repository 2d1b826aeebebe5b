//! Acquisition progress reporting.

use crate::acquisition::AcquisitionOutcome;

/// Trait for receiving acquisition progress updates.
pub trait AcquisitionProgress {
    /// Called when a phase starts (e.g., "Fetching acquisition series list").
    fn on_phase(&self, message: &str);

    /// Called after each missing scene reaches its terminal status.
    fn on_outcome(&self, current: usize, total: usize, outcome: &AcquisitionOutcome);

    /// Called when the run is complete.
    fn on_complete(&self, message: &str);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl AcquisitionProgress for SilentProgress {
    fn on_phase(&self, _message: &str) {}
    fn on_outcome(&self, _current: usize, _total: usize, _outcome: &AcquisitionOutcome) {}
    fn on_complete(&self, _message: &str) {}
}

