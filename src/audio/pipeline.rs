//! Real-time side of the capture path.
//!
//! [`CapturePipeline`] is the typed context moved into the audio device
//! callback.  It holds a reference to the shared buffer, the stream format and
//! a set of lock-free counters, and nothing else.  [`CapturePipeline::on_block`]
//! runs once per callback: no logging, no allocation, no I/O.  Blocks that do
//! not make sense for the configured format are dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::buffer::CircularAudioBuffer;
use super::format::StreamFormat;

// ---------------------------------------------------------------------------
// MalformedBlock
// ---------------------------------------------------------------------------

/// Reason a callback block was dropped instead of written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedBlock {
    /// Zero bytes delivered.
    Empty,
    /// Byte length is not a whole number of `f32` samples.
    PartialSample,
    /// Byte length claims more samples than the delivered slice holds.
    LengthMismatch,
    /// Sample count is not a whole number of frames.
    PartialFrame,
}

// ---------------------------------------------------------------------------
// CaptureStats
// ---------------------------------------------------------------------------

/// Counters updated from the audio thread with relaxed atomics.
#[derive(Debug, Default)]
pub struct CaptureStats {
    blocks_written: AtomicU64,
    samples_written: AtomicU64,
    blocks_dropped: AtomicU64,
}

/// Point-in-time copy of [`CaptureStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub blocks_written: u64,
    pub samples_written: u64,
    pub blocks_dropped: u64,
}

impl CaptureStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            blocks_written: self.blocks_written.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            blocks_dropped: self.blocks_dropped.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Counter increase since `earlier`.
    pub fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            blocks_written: self.blocks_written.saturating_sub(earlier.blocks_written),
            samples_written: self.samples_written.saturating_sub(earlier.samples_written),
            blocks_dropped: self.blocks_dropped.saturating_sub(earlier.blocks_dropped),
        }
    }
}

// ---------------------------------------------------------------------------
// CapturePipeline
// ---------------------------------------------------------------------------

/// Forwards device callback blocks into the [`CircularAudioBuffer`].
///
/// Cheap to clone; clones share the buffer and the counters.
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    buffer: Arc<CircularAudioBuffer>,
    format: StreamFormat,
    stats: Arc<CaptureStats>,
}

impl CapturePipeline {
    pub fn new(
        buffer: Arc<CircularAudioBuffer>,
        format: StreamFormat,
        stats: Arc<CaptureStats>,
    ) -> Self {
        Self {
            buffer,
            format,
            stats,
        }
    }

    /// Entry point for the device callback.
    ///
    /// `byte_len` is the size of the delivered block in bytes; it is
    /// converted to a sample count with the stream format.  Malformed blocks
    /// are dropped silently and only show up in [`CaptureStats`].
    pub fn on_block(&self, samples: &[f32], byte_len: usize) {
        match self.validate(samples, byte_len) {
            Ok(count) => {
                self.buffer.write(&samples[..count]);
                self.stats.blocks_written.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .samples_written
                    .fetch_add(count as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.blocks_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of samples to write for this block.
    fn validate(&self, samples: &[f32], byte_len: usize) -> Result<usize, MalformedBlock> {
        if byte_len == 0 || samples.is_empty() {
            return Err(MalformedBlock::Empty);
        }
        let count = self
            .format
            .bytes_to_samples(byte_len)
            .ok_or(MalformedBlock::PartialSample)?;
        if count > samples.len() {
            return Err(MalformedBlock::LengthMismatch);
        }
        if !self.format.is_frame_aligned(count) {
            return Err(MalformedBlock::PartialFrame);
        }
        Ok(count)
    }

    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    pub fn stats(&self) -> &Arc<CaptureStats> {
        &self.stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BYTES: usize = std::mem::size_of::<f32>();

    fn stereo_pipeline(capacity: usize) -> (CapturePipeline, Arc<CircularAudioBuffer>) {
        let buffer = Arc::new(CircularAudioBuffer::new(capacity));
        let format = StreamFormat::new(44_100, 2).unwrap();
        let pipeline = CapturePipeline::new(
            Arc::clone(&buffer),
            format,
            Arc::new(CaptureStats::default()),
        );
        (pipeline, buffer)
    }

    #[test]
    fn whole_block_is_written() {
        let (pipeline, buffer) = stereo_pipeline(16);
        let block = [0.1_f32, -0.1, 0.2, -0.2];

        pipeline.on_block(&block, std::mem::size_of_val(&block));

        assert_eq!(buffer.snapshot_window(4).unwrap(), block.to_vec());
        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.blocks_written, 1);
        assert_eq!(stats.samples_written, 4);
        assert_eq!(stats.blocks_dropped, 0);
    }

    #[test]
    fn byte_length_limits_samples_written() {
        let (pipeline, buffer) = stereo_pipeline(16);
        let block = [1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0];

        // Only the first two frames are valid.
        pipeline.on_block(&block, 4 * BYTES);

        assert_eq!(buffer.total_written(), 4);
        assert_eq!(buffer.snapshot_window(4).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn malformed_blocks_are_dropped_and_counted() {
        let (pipeline, buffer) = stereo_pipeline(16);
        let block = [1.0_f32, 2.0, 3.0, 4.0];

        assert_eq!(pipeline.validate(&[], 0), Err(MalformedBlock::Empty));
        assert_eq!(pipeline.validate(&block, 0), Err(MalformedBlock::Empty));
        assert_eq!(pipeline.validate(&block, 7), Err(MalformedBlock::PartialSample));
        assert_eq!(
            pipeline.validate(&block, 6 * BYTES),
            Err(MalformedBlock::LengthMismatch)
        );
        assert_eq!(
            pipeline.validate(&block, 3 * BYTES),
            Err(MalformedBlock::PartialFrame)
        );

        pipeline.on_block(&[], 0);
        pipeline.on_block(&block, 7);
        pipeline.on_block(&block, 6 * BYTES);
        pipeline.on_block(&block, 3 * BYTES);

        assert_eq!(buffer.total_written(), 0);
        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.blocks_dropped, 4);
        assert_eq!(stats.blocks_written, 0);
    }

    #[test]
    fn blocks_are_applied_in_delivery_order() {
        let (pipeline, buffer) = stereo_pipeline(8);
        for i in 0..6 {
            let v = i as f32;
            let block = [v, v];
            pipeline.on_block(&block, 2 * BYTES);
        }
        assert_eq!(
            buffer.snapshot_window(8).unwrap(),
            vec![2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 5.0]
        );
    }

    #[test]
    fn stats_delta() {
        let earlier = StatsSnapshot {
            blocks_written: 10,
            samples_written: 5_120,
            blocks_dropped: 1,
        };
        let later = StatsSnapshot {
            blocks_written: 15,
            samples_written: 7_680,
            blocks_dropped: 1,
        };
        assert_eq!(
            later.since(&earlier),
            StatsSnapshot {
                blocks_written: 5,
                samples_written: 2_560,
                blocks_dropped: 0,
            }
        );
    }

    #[test]
    fn pipeline_is_send_and_static() {
        fn assert_send<T: Send + 'static>() {}
        assert_send::<CapturePipeline>();
    }
}
