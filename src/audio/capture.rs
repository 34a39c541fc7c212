//! Device capture via `cpal`.
//!
//! [`AudioCapture`] selects an input device (by name or the host default) and
//! checks its preferred configuration against the configured
//! [`StreamFormat`].  [`AudioCapture::start`] opens an `f32` input stream with
//! that format and moves a [`CapturePipeline`] into the data callback.  The
//! returned [`StreamHandle`] is a RAII guard; dropping it stops the stream.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::format::StreamFormat;
use super::pipeline::CapturePipeline;

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the hardware stream, after which the pipeline is
/// never invoked again.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up the capture stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("no input device matching {0:?}")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// FormatCheck
// ---------------------------------------------------------------------------

/// Result of comparing the device's preferred format with the configured one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCheck {
    Match,
    Mismatch {
        device_rate: u32,
        device_channels: u16,
        device_float: bool,
    },
}

/// Compare a device's preferred stream parameters with `format`.
pub fn compare_format(
    format: &StreamFormat,
    device_rate: u32,
    device_channels: u16,
    device_float: bool,
) -> FormatCheck {
    if device_rate == format.sample_rate()
        && device_channels == format.channels()
        && device_float
    {
        FormatCheck::Match
    } else {
        FormatCheck::Mismatch {
            device_rate,
            device_channels,
            device_float,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Input device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use audio_stager::audio::{
///     AudioCapture, CaptureStats, CapturePipeline, CircularAudioBuffer, StreamFormat,
/// };
///
/// let format = StreamFormat::new(44_100, 2).unwrap();
/// let buffer = Arc::new(CircularAudioBuffer::with_duration(&format, 10.0));
/// let pipeline = CapturePipeline::new(buffer, format, Arc::new(CaptureStats::default()));
///
/// let capture = AudioCapture::open(None).unwrap();
/// let _handle = capture.start(format, pipeline).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop capturing.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    name: String,
}

impl AudioCapture {
    /// Select an input device.
    ///
    /// With `Some(name)` the first input device whose name contains `name` is
    /// used (e.g. a loopback device such as `"BlackHole"`); with `None` the
    /// host's default input device.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] / [`CaptureError::DeviceNotFound`] when no
    /// suitable device exists.
    pub fn open(name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match name {
            Some(wanted) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n.contains(wanted)).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(wanted.to_string()))?,
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
        };
        let name = device.name().unwrap_or_else(|_| "<unknown>".into());

        Ok(Self { device, name })
    }

    /// Device name as reported by the host.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check the device's preferred configuration against `format` and log
    /// the outcome.  A mismatch is not fatal: the stream is still opened
    /// with `format` and the host may convert or reject it.
    pub fn check_format(&self, format: &StreamFormat) -> Result<FormatCheck, CaptureError> {
        let supported = self.device.default_input_config()?;
        let check = compare_format(
            format,
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format() == cpal::SampleFormat::F32,
        );
        match &check {
            FormatCheck::Match => log::info!("device '{}': stream formats match", self.name),
            FormatCheck::Mismatch {
                device_rate,
                device_channels,
                device_float,
            } => log::warn!(
                "device '{}' prefers {device_rate} Hz × {device_channels} ch (float: {device_float}), \
                 configured {} Hz × {} ch float",
                self.name,
                format.sample_rate(),
                format.channels()
            ),
        }
        Ok(check)
    }

    /// Start capturing and feed every callback block to `pipeline`.
    ///
    /// The data callback runs on the host's real-time audio thread and only
    /// calls [`CapturePipeline::on_block`].
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(
        &self,
        format: StreamFormat,
        pipeline: CapturePipeline,
    ) -> Result<StreamHandle, CaptureError> {
        let config = cpal::StreamConfig {
            channels: format.channels(),
            sample_rate: cpal::SampleRate(format.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = self.device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                pipeline.on_block(data, std::mem::size_of_val(data));
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        log::info!(
            "capture started on '{}' ({} Hz, {} ch)",
            self.name,
            format.sample_rate(),
            format.channels()
        );
        Ok(StreamHandle { _stream: stream })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
