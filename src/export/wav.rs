//! 32-bit float WAV output via `hound`.
//!
//! Samples are written to `<output>.part` and renamed over the output path
//! once the file is finalised, so a failed export never leaves a truncated
//! file behind.

use std::path::{Path, PathBuf};

use crate::audio::StreamFormat;

use super::exporter::{EncoderError, SnapshotEncoder};

/// Writes each snapshot to a fixed path, replacing the previous export.
#[derive(Debug, Clone)]
pub struct WavEncoder {
    path: PathBuf,
}

impl WavEncoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn part_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }
}

fn wav_spec(format: &StreamFormat) -> hound::WavSpec {
    hound::WavSpec {
        channels: format.channels(),
        sample_rate: format.sample_rate(),
        bits_per_sample: format.bits_per_channel(),
        sample_format: hound::SampleFormat::Float,
    }
}

impl SnapshotEncoder for WavEncoder {
    fn write_snapshot(&self, samples: &[f32], format: &StreamFormat) -> Result<usize, EncoderError> {
        let part = self.part_path();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| EncoderError::Open(format!("{}: {e}", parent.display())))?;
        }

        let mut writer = hound::WavWriter::create(&part, wav_spec(format))
            .map_err(|e| EncoderError::Open(format!("{}: {e}", part.display())))?;

        let written = samples
            .iter()
            .try_for_each(|&s| writer.write_sample(s))
            .and_then(|()| writer.finalize());
        if let Err(e) = written {
            let _ = std::fs::remove_file(&part);
            return Err(EncoderError::Write(e.to_string()));
        }

        std::fs::rename(&part, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&part);
            EncoderError::Write(format!("{}: {e}", self.path.display()))
        })?;

        Ok(format.frames_in(samples.len()))
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
    fn writes_float_wav_with_stream_format() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("audio_staged.wav");
        let encoder = WavEncoder::new(&path);
        let format = StreamFormat::new(44_100, 2).unwrap();
        let samples = [0.5_f32, -0.5, 0.25, -0.25, 0.0, 1.0];

        let frames = encoder.write_snapshot(&samples, &format).expect("write");
        assert_eq!(frames, 3);

        let mut reader = hound::WavReader::open(&path).expect("open");
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.duration(), 3);

        let read: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples.to_vec());
        assert!(!encoder.part_path().exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("exports").join("nested").join("clip.wav");
        let format = StreamFormat::new(8_000, 1).unwrap();

        let frames = WavEncoder::new(&path)
            .write_snapshot(&[0.1, 0.2], &format)
            .expect("write");
        assert_eq!(frames, 2);
        assert!(path.exists());
    }

    #[test]
    fn overwrites_previous_export() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("audio_staged.wav");
        let encoder = WavEncoder::new(&path);
        let format = StreamFormat::new(8_000, 1).unwrap();

        encoder.write_snapshot(&[0.1; 10], &format).unwrap();
        encoder.write_snapshot(&[0.2; 4], &format).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.duration(), 4);
    }

    #[test]
    fn unwritable_location_is_an_open_error() {
        let dir = tempdir().expect("temp dir");
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("clip.wav");
        let format = StreamFormat::new(8_000, 1).unwrap();

        let err = WavEncoder::new(&path)
            .write_snapshot(&[0.1], &format)
            .unwrap_err();
        assert!(matches!(err, EncoderError::Open(_)));
    }
}
