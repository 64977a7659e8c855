//! Progress, status and confirmation hooks for a conversion run.
//!
//! Front-ends implement [`ProgressSink`] and pass it to
//! [`crate::convert::run`]. The library never touches presentation state
//! directly: it reports `(current, total)` progress, short status texts, asks
//! once for a go/no-go after triage, and resets the sink to idle on exit.
//!
//! # Example
//!
//! ```rust
//! use heic2pdf::{ConversionIssue, ProgressSink};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingSink {
//!     files: AtomicUsize,
//! }
//!
//! impl ProgressSink for CountingSink {
//!     fn report_progress(&self, current: usize, total: usize) {
//!         self.files.store(current, Ordering::SeqCst);
//!         eprintln!("{current}/{total}");
//!     }
//!
//!     fn confirm(&self, issues: &[ConversionIssue]) -> bool {
//!         issues.len() < 5
//!     }
//! }
//! ```

use crate::output::ConversionIssue;

/// Status text shown when no run is in flight.
pub const IDLE_STATUS: &str = "Ready";

/// Receives run feedback from the orchestrator.
///
/// All methods have default implementations so callers only override what
/// they care about. The default `confirm` proceeds.
pub trait ProgressSink: Send + Sync {
    /// Called after each file is converted, and with `(0, 0)` on reset.
    fn report_progress(&self, current: usize, total: usize) {
        let _ = (current, total);
    }

    /// Called with short human-readable status texts.
    fn report_status(&self, text: &str) {
        let _ = text;
    }

    /// Asked once, when triage found issues. Return `false` to cancel the run.
    fn confirm(&self, issues: &[ConversionIssue]) -> bool {
        let _ = issues;
        true
    }

    /// Return the sink to its idle state. Always called when a run exits.
    fn reset(&self) {
        self.report_progress(0, 0);
        self.report_status(IDLE_STATUS);
    }
}

/// A sink that ignores everything and always proceeds.
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {}

/// Resets the wrapped sink when dropped, whichever way the run exits.
pub(crate) struct IdleGuard<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> IdleGuard<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.sink.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<String>>,
        progress: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressSink for Recorder {
        fn report_progress(&self, current: usize, total: usize) {
            self.progress.lock().unwrap().push((current, total));
        }

        fn report_status(&self, text: &str) {
            self.statuses.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn noop_sink_proceeds() {
        let sink = NoopProgressSink;
        sink.report_progress(1, 2);
        sink.report_status("working");
        assert!(sink.confirm(&[]));
        sink.reset();
    }

    #[test]
    fn guard_resets_on_drop() {
        let rec = Recorder::default();
        {
            let _guard = IdleGuard::new(&rec);
            rec.report_progress(3, 4);
            rec.report_status("Processed: a.jpg (3/4)");
        }
        assert_eq!(rec.progress.lock().unwrap().last(), Some(&(0, 0)));
        assert_eq!(
            rec.statuses.lock().unwrap().last().map(String::as_str),
            Some(IDLE_STATUS)
        );
    }

    #[test]
    fn guard_resets_on_early_return() {
        fn failing(sink: &dyn ProgressSink) -> Result<(), &'static str> {
            let _guard = IdleGuard::new(sink);
            sink.report_status("about to fail");
            Err("boom")
        }

        let rec = Recorder::default();
        assert!(failing(&rec).is_err());
        assert_eq!(
            rec.statuses.lock().unwrap().as_slice(),
            &["about to fail".to_string(), IDLE_STATUS.to_string()]
        );
    }
}
