//! Decoded audio clips.
//!
//! A clip is an immutable in-memory buffer of interleaved f32 samples
//! with a known duration, shared as `Arc<AudioClip>` between the track
//! entry that owns it and any voice currently rendering it.

use soundstage_core::{Result, SoundStageError};
use std::io::Cursor;

/// A decoded audio buffer.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved samples, `channels` per frame.
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl AudioClip {
    /// Build a clip from interleaved samples.
    pub fn from_samples(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(SoundStageError::Decode(format!(
                "invalid clip format: {channels} channels at {sample_rate} Hz"
            )));
        }
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Decode a WAV file held in memory.
    pub fn decode_wav(bytes: &[u8]) -> Result<Self> {
        let reader = hound::WavReader::new(Cursor::new(bytes))
            .map_err(|e| SoundStageError::Decode(format!("WAV header: {e}")))?;
        let spec = reader.spec();

        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| SoundStageError::Decode(format!("WAV samples: {e}")))?,
            (hound::SampleFormat::Int, bits) if bits <= 32 => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|e| SoundStageError::Decode(format!("WAV samples: {e}")))?
            }
            (format, bits) => {
                return Err(SoundStageError::Decode(format!(
                    "unsupported WAV format: {bits}-bit {format:?}"
                )))
            }
        };

        Self::from_samples(samples, spec.channels, spec.sample_rate)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Sample at a frame for one channel; zero outside the clip.
    pub fn frame(&self, frame: usize, channel: u16) -> f32 {
        let channel = channel.min(self.channels - 1) as usize;
        self.samples
            .get(frame * self.channels as usize + channel)
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_wav_bytes(seconds: f64, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut bytes, spec).unwrap();
            let total = (seconds * sample_rate as f64) as usize;
            for i in 0..total {
                let t = i as f64 / sample_rate as f64;
                let v = (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 0.2;
                writer.write_sample((v * 32767.0) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes.into_inner()
    }

    #[test]
    fn decodes_16_bit_wav() {
        let clip = AudioClip::decode_wav(&sine_wav_bytes(2.0, 22050)).unwrap();
        assert_eq!(clip.channels(), 1);
        assert_eq!(clip.sample_rate(), 22050);
        assert!((clip.duration_seconds() - 2.0).abs() < 0.01);
        // Samples are normalized to [-1, 1].
        assert!(clip.frame(100, 0).abs() <= 1.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(AudioClip::decode_wav(b"not a wav file").is_err());
    }

    #[test]
    fn frame_out_of_range_is_silence() {
        let clip = AudioClip::from_samples(vec![0.5; 8], 2, 44100).unwrap();
        assert_eq!(clip.frame_count(), 4);
        assert_eq!(clip.frame(4, 0), 0.0);
        // Channel index clamps to the last channel.
        assert_eq!(clip.frame(0, 5), 0.5);
    }
}
