//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Missing keys fall back to
//! their defaults, so a partial `settings.toml` is valid.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::audio::StreamFormat;

use super::AppPaths;

/// Longest buffer or export window accepted from settings, in seconds.
pub const MAX_DURATION_SECS: f32 = 3_600.0;

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Capture format and buffer sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz the stream is opened with.
    pub sample_rate: u32,
    /// Interleaved channel count (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Seconds of audio held by the circular buffer.
    pub buffer_secs: f32,
    /// Substring of the input device name to capture from (e.g. a loopback
    /// device such as `"BlackHole"`).  `None` means the system default.
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            buffer_secs: 10.0,
            device: None,
        }
    }
}

impl AudioConfig {
    /// The [`StreamFormat`] described by this section.
    pub fn stream_format(&self) -> Result<StreamFormat> {
        Ok(StreamFormat::new(self.sample_rate, self.channels)?)
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Snapshot export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Seconds of the most recent audio written per export.
    pub window_secs: f32,
    /// Destination WAV file; replaced on every export.
    pub output_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            window_secs: 10.0,
            output_path: PathBuf::from("audio_staged.wav"),
        }
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Chord that triggers an export (e.g. `"Ctrl+Meta+C"`).
    pub export_chord: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            export_chord: "Ctrl+Meta+C".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DiagnosticsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// How often capture counters are logged; `0` disables the report.
    pub stats_interval_secs: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            stats_interval_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use audio_stager::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub export: ExportConfig,
    pub hotkey: HotkeyConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the capture and export paths cannot work with.
    pub fn validate(&self) -> Result<()> {
        let format = self.audio.stream_format()?;

        for (key, secs) in [
            ("audio.buffer_secs", self.audio.buffer_secs),
            ("export.window_secs", self.export.window_secs),
        ] {
            if !secs.is_finite() || secs > MAX_DURATION_SECS {
                bail!(
                    "{key} = {secs} must be a finite number of seconds \
                     no larger than {MAX_DURATION_SECS}"
                );
            }
        }

        let capacity = format.samples_for_duration(self.audio.buffer_secs);
        if capacity == 0 {
            bail!(
                "audio.buffer_secs = {} holds no whole frame at {} Hz",
                self.audio.buffer_secs,
                format.sample_rate()
            );
        }

        let window = format.samples_for_duration(self.export.window_secs);
        if window == 0 {
            bail!("export.window_secs must be positive");
        }
        if window > capacity {
            bail!(
                "export.window_secs = {} exceeds audio.buffer_secs = {}",
                self.export.window_secs,
                self.audio.buffer_secs
            );
        }

        if self.export.output_path.as_os_str().is_empty() {
            bail!("export.output_path is empty");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.audio.sample_rate, loaded.audio.sample_rate);
        assert_eq!(original.audio.channels, loaded.audio.channels);
        assert_eq!(original.audio.buffer_secs, loaded.audio.buffer_secs);
        assert_eq!(original.audio.device, loaded.audio.device);
        assert_eq!(original.export.window_secs, loaded.export.window_secs);
        assert_eq!(original.export.output_path, loaded.export.output_path);
        assert_eq!(original.hotkey.export_chord, loaded.hotkey.export_chord);
        assert_eq!(
            original.diagnostics.stats_interval_secs,
            loaded.diagnostics.stats_interval_secs
        );
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.hotkey.export_chord, "Ctrl+Meta+C");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[audio]\nsample_rate = 48000\ndevice = \"BlackHole\"\n\n[export]\nwindow_secs = 5.0\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.audio.sample_rate, 48_000);
        assert_eq!(cfg.audio.channels, 2);
        assert_eq!(cfg.audio.device.as_deref(), Some("BlackHole"));
        assert_eq!(cfg.export.window_secs, 5.0);
        assert_eq!(cfg.export.output_path, PathBuf::from("audio_staged.wav"));
        assert_eq!(cfg.diagnostics.stats_interval_secs, 30);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[audio]\nsample_rate = \"fast\"\n").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.audio.sample_rate, 44_100);
        assert_eq!(cfg.audio.channels, 2);
        assert_eq!(cfg.audio.buffer_secs, 10.0);
        assert!(cfg.audio.device.is_none());
        assert_eq!(cfg.export.window_secs, 10.0);
        assert_eq!(cfg.export.output_path, PathBuf::from("audio_staged.wav"));
        assert_eq!(cfg.hotkey.export_chord, "Ctrl+Meta+C");

        let format = cfg.audio.stream_format().unwrap();
        assert_eq!(format.samples_for_duration(cfg.audio.buffer_secs), 882_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_window_larger_than_buffer() {
        let mut cfg = AppConfig::default();
        cfg.export.window_secs = 12.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut cfg = AppConfig::default();
        cfg.audio.channels = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.audio.buffer_secs = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.export.window_secs = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.export.output_path = PathBuf::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn infinite_buffer_from_file_fails_validation() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[audio]\nbuffer_secs = inf\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert!(cfg.audio.buffer_secs.is_infinite());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_durations() {
        let mut cfg = AppConfig::default();
        cfg.audio.buffer_secs = 1e12;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.audio.buffer_secs = MAX_DURATION_SECS;
        cfg.export.window_secs = f32::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.audio.buffer_secs = MAX_DURATION_SECS;
        cfg.export.window_secs = MAX_DURATION_SECS;
        assert!(cfg.validate().is_ok());
    }
}
