//! audio-stager keeps the last few seconds of a live audio stream in memory
//! and writes them to a WAV file when a global shortcut is pressed.
//!
//! - [`audio`]: stream format, circular buffer, real-time capture pipeline,
//!   cpal device glue.
//! - [`export`]: snapshot exporter and the WAV encoder.
//! - [`hotkey`]: global shortcut listener.
//! - [`service`]: export trigger loop and capture diagnostics.
//! - [`config`]: TOML settings.

pub mod audio;
pub mod config;
pub mod export;
pub mod hotkey;
pub mod service;
