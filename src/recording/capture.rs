// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Stem capture.
//!
//! A take is a fixed number of blocking chunk reads. The read count is
//! derived from the loop length, so a take is never cut short.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::audio::{AudioError, CaptureFormat, CaptureStream};
use crate::project::track_file_name;
use crate::timing::capture_iterations;

/// Everything needed to record one stem
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingJob {
    /// Destination WAV file
    pub path: PathBuf,
    /// 1-based track number used in the file name
    pub track_number: u8,
    pub format: CaptureFormat,
    /// Number of chunk reads
    pub iterations: u64,
}

impl RecordingJob {
    pub fn new(
        dir: &Path,
        name: &str,
        track_counter: u8,
        format: CaptureFormat,
        loop_seconds: f64,
    ) -> Self {
        Self {
            path: dir.join(track_file_name(name, track_counter)),
            track_number: track_counter + 1,
            format,
            iterations: capture_iterations(format.sample_rate, format.chunk_frames, loop_seconds),
        }
    }

    /// Frames the take will contain
    pub fn frames(&self) -> u64 {
        self.iterations * self.format.chunk_frames as u64
    }
}

/// Captured interleaved samples
#[derive(Debug, Clone, PartialEq)]
pub struct Take {
    pub format: CaptureFormat,
    pub samples: Vec<i16>,
}

impl Take {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.format.sample_rate as f64
    }
}

/// Read `job.iterations` chunks from an open stream
pub fn capture_take(stream: &mut dyn CaptureStream, job: &RecordingJob) -> Result<Take, AudioError> {
    let mut samples = Vec::with_capacity(job.frames() as usize * job.format.channels as usize);

    for _ in 0..job.iterations {
        stream.read_chunk(&mut samples)?;
    }

    debug!(
        track = job.track_number,
        frames = samples.len() / job.format.channels as usize,
        "take captured"
    );

    Ok(Take {
        format: job.format,
        samples,
    })
}
