//! WAV export of lane signals
//!
//! Writes one channel per lane at the control frame rate, for inspecting
//! automation in an audio editor or feeding it to CV hardware.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Errors raised while exporting lanes
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported bit depth {0}, expected 16, 24 or 32")]
    UnsupportedBitDepth(u16),

    #[error("nothing to record: the session has no lanes")]
    NoChannels,

    #[error("too many channels: {0}")]
    TooManyChannels(usize),

    #[error("expected {expected} channels per frame, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

/// Multi-channel WAV recorder for lane frames
pub struct LaneRecorder {
    writer: WavWriter<BufWriter<File>>,
    channels: usize,
    bits: u16,
    frames_written: u64,
}

impl LaneRecorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `channels` - One per lane
    /// * `frame_rate` - Control frames per second, used as the WAV sample rate
    /// * `bits` - 16 or 24 for integer samples, 32 for float
    pub fn new(
        path: &Path,
        channels: usize,
        frame_rate: u32,
        bits: u16,
    ) -> Result<Self, ExportError> {
        let sample_format = match bits {
            16 | 24 => SampleFormat::Int,
            32 => SampleFormat::Float,
            other => return Err(ExportError::UnsupportedBitDepth(other)),
        };
        if channels == 0 {
            return Err(ExportError::NoChannels);
        }
        let channel_count =
            u16::try_from(channels).map_err(|_| ExportError::TooManyChannels(channels))?;

        let spec = WavSpec {
            channels: channel_count,
            sample_rate: frame_rate.max(1),
            bits_per_sample: bits,
            sample_format,
        };

        let writer = WavWriter::create(path, spec)?;
        log::debug!(
            "recording {} channels at {} Hz, {} bit",
            channels,
            spec.sample_rate,
            bits
        );

        Ok(Self {
            writer,
            channels,
            bits,
            frames_written: 0,
        })
    }

    /// Number of channels per frame
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Get the number of frames written
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write one frame, one sample per channel
    ///
    /// Integer formats expect samples in [-1, 1] and clip outside it; float
    /// samples are written unchanged.
    pub fn write_frame(&mut self, samples: &[f32]) -> Result<(), ExportError> {
        if samples.len() != self.channels {
            return Err(ExportError::ChannelMismatch {
                expected: self.channels,
                actual: samples.len(),
            });
        }

        for &sample in samples {
            match self.bits {
                16 => {
                    let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
                    self.writer.write_sample(value)?;
                }
                24 => {
                    let value = (sample.clamp(-1.0, 1.0) * 8_388_607.0).round() as i32;
                    self.writer.write_sample(value)?;
                }
                _ => self.writer.write_sample(sample)?,
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<(), ExportError> {
        self.writer.finalize()?;
        Ok(())
    }
}

/// Map a lane value from `[min, max]` onto `[-1, 1]`
pub fn normalize(value: f64, min: f64, max: f64) -> f32 {
    let range = max - min;
    if range.abs() < f64::EPSILON {
        return 0.0;
    }
    (((value - min) / range) * 2.0 - 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_unsupported_bit_depth() {
        let file = NamedTempFile::new().unwrap();
        for bits in [0, 8, 20, 64] {
            match LaneRecorder::new(file.path(), 1, 100, bits) {
                Err(ExportError::UnsupportedBitDepth(b)) => assert_eq!(b, bits),
                _ => panic!("bit depth {} should be rejected", bits),
            }
        }
    }

    #[test]
    fn test_no_channels() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(
            LaneRecorder::new(file.path(), 0, 100, 16),
            Err(ExportError::NoChannels)
        ));
    }

    #[test]
    fn test_channel_mismatch() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = LaneRecorder::new(file.path(), 2, 100, 32).unwrap();
        assert!(matches!(
            recorder.write_frame(&[0.5]),
            Err(ExportError::ChannelMismatch { expected: 2, actual: 1 })
        ));
        assert_eq!(recorder.frames_written(), 0);
    }

    #[test]
    fn test_records_16_bit() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut recorder = LaneRecorder::new(&path, 2, 100, 16).unwrap();
        recorder.write_frame(&[1.0, -1.0]).unwrap();
        recorder.write_frame(&[0.0, 2.0]).unwrap();
        assert_eq!(recorder.frames_written(), 2);
        recorder.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 100);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, -i16::MAX, 0, i16::MAX]);
    }

    #[test]
    fn test_records_float() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut recorder = LaneRecorder::new(&path, 1, 100, 32).unwrap();
        recorder.write_frame(&[440.0]).unwrap();
        recorder.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_format, SampleFormat::Float);
        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![440.0]);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(40.0, 40.0, 800.0), -1.0);
        assert_eq!(normalize(800.0, 40.0, 800.0), 1.0);
        assert_eq!(normalize(420.0, 40.0, 800.0), 0.0);
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.0);
    }
}
