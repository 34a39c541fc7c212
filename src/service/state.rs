//! Export outcome bookkeeping shared between the trigger loop and the
//! diagnostics reporter.
//!
//! [`SharedStatus`] is a type alias for `Arc<Mutex<ServiceStatus>>`, cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// ExportState
// ---------------------------------------------------------------------------

/// Phase of the export loop.
///
/// ```text
/// Idle ──request──▶ Exporting ──ok──▶ Done
///                             ──err─▶ Failed
/// Done / Failed ──request──▶ Exporting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting,
    Done,
    Failed,
}

impl ExportState {
    pub fn label(&self) -> &'static str {
        match self {
            ExportState::Idle => "Idle",
            ExportState::Exporting => "Exporting",
            ExportState::Done => "Done",
            ExportState::Failed => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ServiceStatus {
    pub state: ExportState,
    pub exports_ok: u64,
    pub exports_failed: u64,
    /// Frames written by the most recent successful export.
    pub last_frames: Option<usize>,
    /// Reason of the most recent failure; cleared on success.
    pub last_error: Option<String>,
}

impl ServiceStatus {
    pub fn record_success(&mut self, frames: usize) {
        self.state = ExportState::Done;
        self.exports_ok += 1;
        self.last_frames = Some(frames);
        self.last_error = None;
    }

    pub fn record_failure(&mut self, reason: String) {
        self.state = ExportState::Failed;
        self.exports_failed += 1;
        self.last_error = Some(reason);
    }

    /// One-line report for the diagnostics log.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "exports: {} ({} ok, {} failed)",
            self.state.label(),
            self.exports_ok,
            self.exports_failed
        );
        if let Some(frames) = self.last_frames {
            line.push_str(&format!(", last {frames} frames"));
        }
        if let Some(err) = &self.last_error {
            line.push_str(&format!(", last error: {err}"));
        }
        line
    }
}

/// Thread-safe handle to [`ServiceStatus`].
///
/// Lock for a short critical section only; never hold it across `.await`.
pub type SharedStatus = Arc<Mutex<ServiceStatus>>;

pub fn new_shared_status() -> SharedStatus {
    Arc::new(Mutex::new(ServiceStatus::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        let status = ServiceStatus::default();
        assert_eq!(status.state, ExportState::Idle);
        assert_eq!(status.exports_ok + status.exports_failed, 0);
        assert!(status.last_frames.is_none());
    }

    #[test]
    fn success_clears_previous_error() {
        let mut status = ServiceStatus::default();
        status.record_failure("encoder unavailable: busy".into());
        assert_eq!(status.state, ExportState::Failed);

        status.record_success(441_000);
        assert_eq!(status.state, ExportState::Done);
        assert_eq!(status.last_frames, Some(441_000));
        assert!(status.last_error.is_none());
        assert_eq!((status.exports_ok, status.exports_failed), (1, 1));
    }

    #[test]
    fn summary_mentions_counts_and_last_error() {
        let mut status = ServiceStatus::default();
        assert_eq!(status.summary(), "exports: Idle (0 ok, 0 failed)");

        status.record_success(100);
        status.record_failure("write failed: disk full".into());
        assert_eq!(
            status.summary(),
            "exports: Failed (1 ok, 1 failed), last 100 frames, last error: write failed: disk full"
        );
    }

    #[test]
    fn labels() {
        assert_eq!(ExportState::Idle.label(), "Idle");
        assert_eq!(ExportState::Exporting.label(), "Exporting");
        assert_eq!(ExportState::Done.label(), "Done");
        assert_eq!(ExportState::Failed.label(), "Failed");
    }

    #[test]
    fn shared_status_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedStatus>();
    }
}
