//! Stream format descriptor shared by the capture and export sides.
//!
//! Samples are always interleaved 32-bit float.  Only the sample rate and
//! channel count vary, and both are fixed for the lifetime of the process.

use thiserror::Error;

/// Size of one `f32` sample in bytes.
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<f32>();

/// Bit depth of every sample.
pub const BITS_PER_CHANNEL: u16 = 32;

// ---------------------------------------------------------------------------
// FormatError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("channel count must be greater than zero")]
    ZeroChannels,
}

// ---------------------------------------------------------------------------
// StreamFormat
// ---------------------------------------------------------------------------

/// Immutable description of the captured stream.
///
/// Every byte count handed over by the audio device is interpreted with this
/// format's sample size, and every exported frame count with its channel
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    sample_rate: u32,
    channels: u16,
}

impl StreamFormat {
    /// Build a format descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when either value is zero.
    pub fn new(sample_rate: u32, channels: u16) -> Result<Self, FormatError> {
        if sample_rate == 0 {
            return Err(FormatError::ZeroSampleRate);
        }
        if channels == 0 {
            return Err(FormatError::ZeroChannels);
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_channel(&self) -> u16 {
        BITS_PER_CHANNEL
    }

    pub fn bytes_per_sample(&self) -> usize {
        BYTES_PER_SAMPLE
    }

    /// Bytes per frame (`channels × bytes_per_sample`).
    pub fn frame_size(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Number of samples contained in `byte_len` bytes.
    ///
    /// Returns `None` when `byte_len` is not a whole number of samples.
    pub fn bytes_to_samples(&self, byte_len: usize) -> Option<usize> {
        if byte_len % BYTES_PER_SAMPLE != 0 {
            return None;
        }
        Some(byte_len / BYTES_PER_SAMPLE)
    }

    /// Returns `true` when `sample_count` covers a whole number of frames.
    pub fn is_frame_aligned(&self, sample_count: usize) -> bool {
        sample_count % self.channels as usize == 0
    }

    /// Interleaved sample count for `secs` seconds of audio, rounded down to
    /// whole frames.
    ///
    /// Non-finite and non-positive durations yield `0`; durations too long
    /// to address saturate at the largest whole-frame count.
    pub fn samples_for_duration(&self, secs: f32) -> usize {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        let channels = self.channels as usize;
        let frames = (secs as f64 * self.sample_rate as f64).floor() as usize;
        frames
            .checked_mul(channels)
            .unwrap_or(usize::MAX / channels * channels)
    }

    /// Number of whole frames in `sample_count` interleaved samples.
    pub fn frames_in(&self, sample_count: usize) -> usize {
        sample_count / self.channels as usize
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_values() {
        assert_eq!(StreamFormat::new(0, 2), Err(FormatError::ZeroSampleRate));
        assert_eq!(StreamFormat::new(44_100, 0), Err(FormatError::ZeroChannels));
    }

    #[test]
    fn stereo_float_frame_size() {
        let fmt = StreamFormat::new(44_100, 2).unwrap();
        assert_eq!(fmt.bytes_per_sample(), 4);
        assert_eq!(fmt.frame_size(), 8);
        assert_eq!(fmt.bits_per_channel(), 32);
    }

    #[test]
    fn byte_length_conversion() {
        let fmt = StreamFormat::new(48_000, 2).unwrap();
        assert_eq!(fmt.bytes_to_samples(0), Some(0));
        assert_eq!(fmt.bytes_to_samples(4_096), Some(1_024));
        assert_eq!(fmt.bytes_to_samples(4_097), None);
    }

    #[test]
    fn ten_seconds_matches_capture_buffer_size() {
        let fmt = StreamFormat::new(44_100, 2).unwrap();
        assert_eq!(fmt.samples_for_duration(10.0), 882_000);
        assert_eq!(fmt.frames_in(882_000), 441_000);
    }

    #[test]
    fn duration_rounds_down_to_whole_frames() {
        let fmt = StreamFormat::new(3, 2).unwrap();
        // 0.5 s × 3 Hz = 1.5 frames → 1 frame → 2 samples
        assert_eq!(fmt.samples_for_duration(0.5), 2);
        assert_eq!(fmt.samples_for_duration(-1.0), 0);
    }

    #[test]
    fn non_finite_duration_is_empty() {
        let fmt = StreamFormat::new(44_100, 2).unwrap();
        assert_eq!(fmt.samples_for_duration(f32::INFINITY), 0);
        assert_eq!(fmt.samples_for_duration(f32::NEG_INFINITY), 0);
        assert_eq!(fmt.samples_for_duration(f32::NAN), 0);
    }

    #[test]
    fn huge_duration_saturates_on_a_frame_boundary() {
        let fmt = StreamFormat::new(u32::MAX, 3).unwrap();
        let samples = fmt.samples_for_duration(f32::MAX);
        assert!(fmt.is_frame_aligned(samples));
        assert!(samples > 0);
    }

    #[test]
    fn frame_alignment() {
        let fmt = StreamFormat::new(44_100, 2).unwrap();
        assert!(fmt.is_frame_aligned(512));
        assert!(!fmt.is_frame_aligned(511));
    }
}
