//! Trigger loop and capture diagnostics.
//!
//! [`ExportService`] responds to [`HotkeyEvent`]s received over a
//! `tokio::sync::mpsc` channel.  Each export runs on
//! `tokio::task::spawn_blocking` because it copies a large window and writes a
//! file; the async runtime never stalls and the audio callback is only ever
//! blocked for the duration of the buffer copy.
//!
//! [`StatsReporter`] drains the lock-free capture counters on a timer, so the
//! real-time callback itself never logs.
//!
//! # Flow
//!
//! ```text
//! HotkeyEvent::ExportRequested
//!   └─▶ spawn_blocking(exporter.export_snapshot)     [Exporting]
//!         ├─ Ok(frames) → log, record success        [Done]
//!         └─ Err(e)     → log "export failed", record [Failed]
//! ```

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::{CaptureStats, CircularAudioBuffer, StatsSnapshot};
use crate::export::{ExportError, SnapshotExporter};
use crate::hotkey::HotkeyEvent;

use super::state::{ExportState, ServiceStatus, SharedStatus};

// ---------------------------------------------------------------------------
// ExportService
// ---------------------------------------------------------------------------

/// Runs exports in response to trigger events.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use audio_stager::audio::{CircularAudioBuffer, StreamFormat};
/// use audio_stager::export::{SnapshotExporter, WavEncoder};
/// use audio_stager::service::{new_shared_status, ExportService};
///
/// # async fn example() {
/// let format = StreamFormat::new(44_100, 2).unwrap();
/// let buffer = Arc::new(CircularAudioBuffer::with_duration(&format, 10.0));
/// let exporter = SnapshotExporter::new(buffer, format, 10.0, Arc::new(WavEncoder::new("out.wav")));
///
/// let (hotkey_tx, hotkey_rx) = tokio::sync::mpsc::channel(16);
/// let service = ExportService::new(Arc::new(exporter), new_shared_status());
/// service.run(hotkey_rx).await;
/// # }
/// ```
pub struct ExportService {
    exporter: Arc<SnapshotExporter>,
    status: SharedStatus,
}

impl ExportService {
    pub fn new(exporter: Arc<SnapshotExporter>, status: SharedStatus) -> Self {
        Self { exporter, status }
    }

    /// Process events until the sender side of `rx` is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<HotkeyEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                HotkeyEvent::ExportRequested => {
                    let _ = self.export_once().await;
                }
            }
        }
        log::debug!("export service: trigger channel closed");
    }

    /// Run one export on the blocking pool and record its outcome.
    pub async fn export_once(&self) -> Result<usize, ExportError> {
        lock_status(&self.status).state = ExportState::Exporting;

        let exporter = Arc::clone(&self.exporter);
        let result = match tokio::task::spawn_blocking(move || exporter.export_snapshot()).await {
            Ok(result) => result,
            Err(e) => Err(ExportError::WriteFailed(format!("export task failed: {e}"))),
        };

        let mut status = lock_status(&self.status);
        match &result {
            Ok(frames) => {
                log::info!("Successfully wrote {frames} frames to file");
                status.record_success(*frames);
            }
            Err(e) => {
                log::error!("export failed: {e}");
                status.record_failure(e.to_string());
            }
        }
        result
    }
}

fn lock_status(status: &SharedStatus) -> MutexGuard<'_, ServiceStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// StatsReporter
// ---------------------------------------------------------------------------

/// Periodically logs what the capture callback has been doing, along with
/// the export outcomes recorded by [`ExportService`].
pub struct StatsReporter {
    stats: Arc<CaptureStats>,
    buffer: Arc<CircularAudioBuffer>,
    status: SharedStatus,
    last: StatsSnapshot,
}

impl StatsReporter {
    pub fn new(
        stats: Arc<CaptureStats>,
        buffer: Arc<CircularAudioBuffer>,
        status: SharedStatus,
    ) -> Self {
        Self {
            stats,
            buffer,
            status,
            last: StatsSnapshot::default(),
        }
    }

    /// Counter increase since the previous tick; logs it.
    pub fn tick(&mut self) -> StatsSnapshot {
        let now = self.stats.snapshot();
        let delta = now.since(&self.last);
        self.last = now;

        log::info!(
            "capture: {} blocks, {} samples, buffer {}/{} filled",
            delta.blocks_written,
            delta.samples_written,
            self.buffer.available(),
            self.buffer.capacity()
        );
        if delta.blocks_dropped > 0 {
            log::warn!("capture: dropped {} malformed blocks", delta.blocks_dropped);
        }
        if delta.blocks_written == 0 {
            log::warn!("capture: no audio received since last report");
        }

        let summary = lock_status(&self.status).summary();
        log::info!("{summary}");
        delta
    }

    /// Tick every `period` forever.
    pub async fn run(mut self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // first tick completes immediately
        loop {
            interval.tick().await;
            self.tick();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
