// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! WAV export of captured takes (RIFF, 16-bit signed PCM).

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

use super::capture::Take;
use crate::audio::{CaptureFormat, BITS_PER_SAMPLE, CHUNK_FRAMES};

#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: hound::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: hound::Error,
    },
}

fn spec_for(format: &CaptureFormat) -> WavSpec {
    WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// Write a take to `path`, replacing any existing file
pub fn write_wav(path: &Path, take: &Take) -> Result<(), WavError> {
    let wrap = |source| WavError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut writer = WavWriter::create(path, spec_for(&take.format)).map_err(wrap)?;
    {
        let mut samples = writer.get_i16_writer(take.samples.len() as u32);
        for sample in &take.samples {
            samples.write_sample(*sample);
        }
        samples.flush().map_err(wrap)?;
    }
    writer.finalize().map_err(wrap)
}

/// Read a 16-bit WAV file back into a take
pub fn read_wav(path: &Path) -> Result<Take, WavError> {
    let wrap = |source| WavError::Read {
        path: path.display().to_string(),
        source,
    };

    let mut reader = WavReader::open(path).map_err(wrap)?;
    let spec = reader.spec();
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(wrap)?;

    Ok(Take {
        format: CaptureFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            chunk_frames: CHUNK_FRAMES,
        },
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_written_header_matches_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stem_track1.wav");
        let take = Take {
            format: CaptureFormat::stereo(44100),
            samples: vec![i16::MIN, -1, 0, 1, i16::MAX, 42],
        };

        write_wav(&path, &take).unwrap();

        let reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(reader.duration(), 3);

        let back = read_wav(&path).unwrap();
        assert_eq!(back.samples, take.samples);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("x.wav");
        let take = Take {
            format: CaptureFormat::stereo(48000),
            samples: vec![0; 4],
        };

        let err = write_wav(&path, &take).unwrap_err();
        assert!(matches!(err, WavError::Write { .. }));
    }
}
