//! Application entry point: audio-stager.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load and validate [`AppConfig`] (defaults on first run).
//! 3. Allocate the circular buffer for the configured format and duration.
//! 4. Open the input device and start the cpal stream with a
//!    [`CapturePipeline`] as its callback context.
//! 5. Build the [`SnapshotExporter`] with a [`WavEncoder`].
//! 6. Spawn the hotkey listener thread.
//! 7. Run the export service and stats reporter on a tokio runtime until
//!    Ctrl-C, then drop the stream and the buffer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;

use audio_stager::{
    audio::{AudioCapture, CaptureStats, CapturePipeline, CircularAudioBuffer},
    config::AppConfig,
    export::{SnapshotExporter, WavEncoder},
    hotkey::{parse_chord, HotkeyEvent, HotkeyListener},
    service::{new_shared_status, ExportService, StatsReporter},
};

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("audio-stager starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.validate().context("invalid configuration")?;
    let format = config.audio.stream_format()?;

    // 3. Buffer, owned here and shared by reference with both sides
    let buffer = Arc::new(CircularAudioBuffer::with_duration(
        &format,
        config.audio.buffer_secs,
    ));
    log::info!(
        "buffer: {} samples ({} s at {} Hz × {} ch)",
        buffer.capacity(),
        config.audio.buffer_secs,
        format.sample_rate(),
        format.channels()
    );

    // 4. Capture
    let stats = Arc::new(CaptureStats::default());
    let pipeline = CapturePipeline::new(Arc::clone(&buffer), format, Arc::clone(&stats));
    let capture = AudioCapture::open(config.audio.device.as_deref())
        .context("failed to open input device")?;
    if let Err(e) = capture.check_format(&format) {
        log::warn!("could not query device format: {e}");
    }
    let stream = capture
        .start(format, pipeline)
        .context("failed to start capture")?;

    // 5. Exporter
    let encoder = Arc::new(WavEncoder::new(config.export.output_path.clone()));
    let exporter = Arc::new(SnapshotExporter::new(
        Arc::clone(&buffer),
        format,
        config.export.window_secs,
        encoder,
    ));

    // 6. Hotkey listener thread
    let chord = parse_chord(&config.hotkey.export_chord).unwrap_or_else(|| {
        log::warn!(
            "unrecognised export chord {:?}; falling back to Ctrl+Meta+C",
            config.hotkey.export_chord
        );
        parse_chord("Ctrl+Meta+C").expect("default chord parses")
    });
    let (hotkey_tx, hotkey_rx) = mpsc::channel::<HotkeyEvent>(16);
    let _hotkey_listener = HotkeyListener::start(chord, hotkey_tx);
    log::info!(
        "press {} to export the last {} s to {}",
        config.hotkey.export_chord,
        config.export.window_secs,
        config.export.output_path.display()
    );

    // 7. Services
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let status = new_shared_status();
    rt.block_on(async {
        if config.diagnostics.stats_interval_secs > 0 {
            let reporter =
                StatsReporter::new(Arc::clone(&stats), Arc::clone(&buffer), Arc::clone(&status));
            tokio::spawn(reporter.run(Duration::from_secs(
                config.diagnostics.stats_interval_secs,
            )));
        }

        let service = ExportService::new(exporter, Arc::clone(&status));
        tokio::select! {
            _ = service.run(hotkey_rx) => {
                log::warn!("hotkey listener stopped");
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    log::error!("failed to listen for Ctrl-C: {e}");
                }
                log::info!("shutting down");
            }
        }
    });

    // Stop the callback before the buffer goes away.
    drop(stream);
    log::info!(
        "captured {} samples in total",
        buffer.total_written()
    );
    Ok(())
}
