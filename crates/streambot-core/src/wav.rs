// SPDX-FileCopyrightText: 2026 Streambot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validated WAV payloads.
//!
//! A [`WavClip`] can only be constructed from bytes that decode as a complete
//! RIFF/WAVE stream, so everything downstream of synthesis can assume the
//! payload is playable.

use std::io::Cursor;
use std::time::Duration;

use crate::error::StreambotError;

/// A complete, decodable waveform.
#[derive(Clone, PartialEq, Eq)]
pub struct WavClip {
    bytes: Vec<u8>,
    duration: Duration,
    sample_rate: u32,
    channels: u16,
}

impl WavClip {
    /// Validates `bytes` as a WAV stream and computes its duration.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, StreambotError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes.as_slice())).map_err(|e| {
            StreambotError::Audio {
                message: "payload is not a decodable WAV stream".into(),
                source: Some(Box::new(e)),
            }
        })?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(StreambotError::audio("WAV stream has a zero sample rate"));
        }
        // `duration()` counts frames, independent of channel count.
        let frames = u64::from(reader.duration());
        let duration = Duration::from_nanos(frames * 1_000_000_000 / u64::from(spec.sample_rate));
        let (sample_rate, channels) = (spec.sample_rate, spec.channels);
        // The header may promise more samples than the data chunk holds.
        let complete = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().try_for_each(|s| s.map(drop)),
            hound::SampleFormat::Int => reader.samples::<i32>().try_for_each(|s| s.map(drop)),
        };
        complete.map_err(|e| StreambotError::Audio {
            message: "WAV data chunk is truncated".into(),
            source: Some(Box::new(e)),
        })?;
        drop(reader);
        Ok(Self {
            bytes,
            duration,
            sample_rate,
            channels,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl std::fmt::Debug for WavClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavClip")
            .field("len", &self.bytes.len())
            .field("duration", &self.duration)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Encodes `samples` of silence at `sample_rate` as a mono 16-bit WAV.
///
/// Used for fixtures and sample generation placeholders.
pub fn silence(sample_rate: u32, samples: u32) -> Result<WavClip, StreambotError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| StreambotError::Audio {
                message: "failed to start WAV writer".into(),
                source: Some(Box::new(e)),
            })?;
        for _ in 0..samples {
            writer.write_sample(0i16).map_err(|e| StreambotError::Audio {
                message: "failed to write WAV sample".into(),
                source: Some(Box::new(e)),
            })?;
        }
        writer.finalize().map_err(|e| StreambotError::Audio {
            message: "failed to finalize WAV".into(),
            source: Some(Box::new(e)),
        })?;
    }
    WavClip::from_bytes(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_round_trips_with_duration() {
        let clip = silence(8000, 4000).unwrap();
        assert_eq!(clip.sample_rate(), 8000);
        assert_eq!(clip.channels(), 1);
        assert_eq!(clip.duration(), Duration::from_millis(500));
        assert!(clip.bytes().starts_with(b"RIFF"));
    }

    #[test]
    fn rejects_garbage() {
        let err = WavClip::from_bytes(b"definitely not audio".to_vec()).unwrap_err();
        assert!(matches!(err, StreambotError::Audio { .. }));
    }

    #[test]
    fn rejects_truncated_data_chunk() {
        let mut bytes = silence(8000, 4000).unwrap().into_bytes();
        bytes.truncate(bytes.len() - 1001);
        let err = WavClip::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, StreambotError::Audio { .. }));
        assert!(err.to_string().contains("truncated"), "{err}");
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(WavClip::from_bytes(Vec::new()).is_err());
    }
}
