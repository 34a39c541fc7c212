//! Snapshot exporter and the encoder interface it writes through.
//!
//! # Overview
//!
//! [`SnapshotEncoder`] is the seam to whatever serialises samples to a sound
//! file.  It is object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SnapshotEncoder>`.
//!
//! [`SnapshotExporter`] copies the most recent window out of the
//! [`CircularAudioBuffer`] and hands it to the encoder.  It runs on ordinary
//! threads and may block on file I/O; the buffer lock is only held for the
//! copy, so the capture callback is never stalled by an export.
//!
//! [`MockEncoder`] (available under `#[cfg(test)]`) records what it was given
//! and returns a pre-configured result.

use std::sync::Arc;

use thiserror::Error;

use crate::audio::{BufferError, CircularAudioBuffer, StreamFormat};

// ---------------------------------------------------------------------------
// EncoderError
// ---------------------------------------------------------------------------

/// Failures reported by a [`SnapshotEncoder`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncoderError {
    /// The output could not be opened or created.
    #[error("cannot open output: {0}")]
    Open(String),

    /// Writing or finalising the output failed.
    #[error("write error: {0}")]
    Write(String),
}

// ---------------------------------------------------------------------------
// ExportError
// ---------------------------------------------------------------------------

/// Why an export failed.  Exports are never retried: a retry would snapshot
/// a different window.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl From<EncoderError> for ExportError {
    fn from(err: EncoderError) -> Self {
        match err {
            EncoderError::Open(reason) => ExportError::EncoderUnavailable(reason),
            EncoderError::Write(reason) => ExportError::WriteFailed(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// SnapshotEncoder trait
// ---------------------------------------------------------------------------

/// Serialises interleaved samples to a sound file.
///
/// # Contract
///
/// - `samples` are interleaved `f32` in `format`'s channel order and contain a
///   whole number of frames.
/// - Returns the number of frames written.
pub trait SnapshotEncoder: Send + Sync {
    fn write_snapshot(&self, samples: &[f32], format: &StreamFormat) -> Result<usize, EncoderError>;
}

// Compile-time assertion: Box<dyn SnapshotEncoder> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SnapshotEncoder>) {}
};

// ---------------------------------------------------------------------------
// SnapshotExporter
// ---------------------------------------------------------------------------

/// Exports the most recent window of captured audio on demand.
pub struct SnapshotExporter {
    buffer: Arc<CircularAudioBuffer>,
    format: StreamFormat,
    window_samples: usize,
    encoder: Arc<dyn SnapshotEncoder>,
}

impl SnapshotExporter {
    /// Create an exporter for a window of `window_secs` seconds.
    ///
    /// The window is rounded down to whole frames.  It is not checked
    /// against the buffer capacity here; an oversized window is reported by
    /// every [`export_snapshot`](Self::export_snapshot) call.
    pub fn new(
        buffer: Arc<CircularAudioBuffer>,
        format: StreamFormat,
        window_secs: f32,
        encoder: Arc<dyn SnapshotEncoder>,
    ) -> Self {
        Self {
            window_samples: format.samples_for_duration(window_secs),
            buffer,
            format,
            encoder,
        }
    }

    /// Interleaved samples per export.
    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    /// Snapshot the most recent window and write it through the encoder.
    ///
    /// Returns the number of frames written.
    ///
    /// # Errors
    ///
    /// - [`ExportError::Buffer`] when the window exceeds the buffer capacity.
    /// - [`ExportError::EncoderUnavailable`] when the encoder cannot open its
    ///   output.
    /// - [`ExportError::WriteFailed`] when the encoder fails mid-write or
    ///   reports zero frames.
    pub fn export_snapshot(&self) -> Result<usize, ExportError> {
        let mut samples = vec![0.0_f32; self.window_samples];
        let captured = self.buffer.snapshot_window_into(&mut samples)?;
        if captured < samples.len() {
            log::warn!(
                "only {captured} of {} samples captured so far; snapshot starts with silence",
                samples.len()
            );
        }

        let frames = self.encoder.write_snapshot(&samples, &self.format)?;
        if frames == 0 {
            return Err(ExportError::WriteFailed("encoder wrote zero frames".into()));
        }
        Ok(frames)
    }
}

// ---------------------------------------------------------------------------
// MockEncoder
// ---------------------------------------------------------------------------

/// Test encoder that records the last snapshot and returns a fixed outcome.
#[cfg(test)]
pub struct MockEncoder {
    outcome: Option<Result<usize, EncoderError>>,
    pub last: std::sync::Mutex<Option<Vec<f32>>>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockEncoder {
    /// Reports `samples / channels` frames, like a real encoder.
    pub fn ok() -> Self {
        Self {
            outcome: None,
            last: std::sync::Mutex::new(None),
            calls: Default::default(),
        }
    }

    /// Always returns `result`.
    pub fn returning(result: Result<usize, EncoderError>) -> Self {
        Self {
            outcome: Some(result),
            ..Self::ok()
        }
    }
}

#[cfg(test)]
impl SnapshotEncoder for MockEncoder {
    fn write_snapshot(&self, samples: &[f32], format: &StreamFormat) -> Result<usize, EncoderError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(samples.to_vec());
        match &self.outcome {
            Some(result) => result.clone(),
            None => Ok(format.frames_in(samples.len())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
