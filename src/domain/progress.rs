//! Progress reporting for long-running jobs.
//!
//! "How often to report" lives in [`Cadence`]; "what to do with a report"
//! lives behind the [`ProgressReporter`] trait.

use async_trait::async_trait;

/// A single progress observation: `done` of `total` items processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Items processed so far.
    pub done: u64,
    /// Total items in this run.
    pub total: u64,
}

impl ProgressUpdate {
    /// Progress for a run with nothing to do.
    pub const COMPLETE: Self = Self { done: 1, total: 1 };

    /// Creates an update.
    #[must_use]
    pub const fn new(done: u64, total: u64) -> Self {
        Self { done, total }
    }

    /// Percentage rounded up and clamped to 0–100. An empty run is complete.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let done = self.done.min(self.total);
        let pct = (done.saturating_mul(100)).div_ceil(self.total);
        u8::try_from(pct.min(100)).unwrap_or(100)
    }

    /// Whether this update marks the end of the run.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

/// How often a job reports while iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    every: u64,
}

impl Cadence {
    /// Reports every `every` items (minimum 1).
    #[must_use]
    pub const fn every(every: u64) -> Self {
        Self {
            every: if every == 0 { 1 } else { every },
        }
    }

    /// Reporting interval.
    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.every
    }

    /// Whether the zero-based item `index` of `total` should be reported.
    ///
    /// The first item of each interval and the final item always report.
    #[must_use]
    pub const fn should_report(&self, index: u64, total: u64) -> bool {
        index % self.every == 0 || index.saturating_add(1) == total
    }

    /// The update to emit after processing zero-based item `index`.
    #[must_use]
    pub fn update_for(&self, index: u64, total: u64) -> Option<ProgressUpdate> {
        self.should_report(index, total)
            .then(|| ProgressUpdate::new(index.saturating_add(1), total))
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::every(1000)
    }
}

/// Sink for progress updates.
///
/// Reporting never fails the job; implementations log their own problems.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Receives one update.
    async fn report(&self, update: ProgressUpdate);
}

/// Reporter that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

#[async_trait]
impl ProgressReporter for NoProgress {
    async fn report(&self, _update: ProgressUpdate) {}
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_up() {
        assert_eq!(ProgressUpdate::new(1, 3).percent(), 34);
        assert_eq!(ProgressUpdate::new(1, 1000).percent(), 1);
        assert_eq!(ProgressUpdate::new(999, 1000).percent(), 100);
        assert_eq!(ProgressUpdate::new(0, 10).percent(), 0);
    }

    #[test]
    fn empty_run_is_complete() {
        assert_eq!(ProgressUpdate::new(0, 0).percent(), 100);
        assert_eq!(ProgressUpdate::COMPLETE.percent(), 100);
        assert!(ProgressUpdate::COMPLETE.is_complete());
    }

    #[test]
    fn cadence_reports_interval_starts_and_last_item() {
        let cadence = Cadence::every(1000);
        let reported: Vec<u64> = (0..2500)
            .filter(|i| cadence.should_report(*i, 2500))
            .collect();
        assert_eq!(reported, vec![0, 1000, 2000, 2499]);
    }

    #[test]
    fn final_update_is_full() {
        let cadence = Cadence::every(1000);
        let Some(last) = cadence.update_for(4, 5) else {
            panic!("last item must report");
        };
        assert_eq!(last.percent(), 100);
        assert!(cadence.update_for(3, 5).is_none());
    }

    #[test]
    fn zero_cadence_reports_everything() {
        let cadence = Cadence::every(0);
        assert_eq!(cadence.interval(), 1);
        assert!((0..10).all(|i| cadence.should_report(i, 10)));
    }
}
