//! Export side: on-demand snapshot of the circular buffer to a sound file.
//!
//! ```text
//! trigger → SnapshotExporter::export_snapshot()
//!         → CircularAudioBuffer::snapshot_window(window)
//!         → SnapshotEncoder::write_snapshot(samples, format)   (WavEncoder)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use audio_stager::audio::{CircularAudioBuffer, StreamFormat};
//! use audio_stager::export::{SnapshotExporter, WavEncoder};
//!
//! let format = StreamFormat::new(44_100, 2).unwrap();
//! let buffer = Arc::new(CircularAudioBuffer::with_duration(&format, 10.0));
//! let exporter = SnapshotExporter::new(
//!     buffer,
//!     format,
//!     10.0,
//!     Arc::new(WavEncoder::new("audio_staged.wav")),
//! );
//!
//! match exporter.export_snapshot() {
//!     Ok(frames) => println!("wrote {frames} frames"),
//!     Err(e) => eprintln!("export failed: {e}"),
//! }
//! ```

pub mod exporter;
pub mod wav;

pub use exporter::{EncoderError, ExportError, SnapshotEncoder, SnapshotExporter};
pub use wav::WavEncoder;

#[cfg(test)]
pub use exporter::MockEncoder;
