//! Capture side: device callback → pipeline → circular buffer.
//!
//! # Data flow
//!
//! ```text
//! Device → cpal callback (real-time thread)
//!        → CapturePipeline::on_block(samples, byte_len)
//!        → CircularAudioBuffer::write
//! ```
//!
//! The buffer is constructed once by the caller and shared by `Arc` with the
//! pipeline and the exporter; there is no global instance.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use audio_stager::audio::{CaptureStats, CapturePipeline, CircularAudioBuffer, StreamFormat};
//!
//! let format = StreamFormat::new(48_000, 2).unwrap();
//! let buffer = Arc::new(CircularAudioBuffer::with_duration(&format, 1.0));
//! let pipeline = CapturePipeline::new(Arc::clone(&buffer), format, Arc::new(CaptureStats::default()));
//!
//! let block = [0.25_f32; 512];
//! pipeline.on_block(&block, std::mem::size_of_val(&block));
//! assert_eq!(buffer.available(), 512);
//! ```

pub mod buffer;
pub mod capture;
pub mod format;
pub mod pipeline;

pub use buffer::{BufferError, CircularAudioBuffer};
pub use capture::{AudioCapture, CaptureError, FormatCheck, StreamHandle};
pub use format::{FormatError, StreamFormat};
pub use pipeline::{CaptureStats, CapturePipeline, MalformedBlock, StatsSnapshot};
