// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio capture for stem recording.
//!
//! This module provides:
//! - The fixed capture format (16-bit stereo, 128 frame chunks)
//! - `AudioInput` / `CaptureStream` traits the sequencer records through
//! - A cpal implementation of both

pub mod input;

pub use input::{list_devices, print_devices, CpalInput};

use thiserror::Error;

/// Rate requested first
pub const PREFERRED_SAMPLE_RATE: u32 = 48000;
/// Rate used when the device rejects the preferred one
pub const FALLBACK_SAMPLE_RATE: u32 = 44100;
/// Stems are always stereo
pub const CAPTURE_CHANNELS: u16 = 2;
/// Frames per blocking read
pub const CHUNK_FRAMES: u32 = 128;
/// Stems are always 16-bit signed PCM
pub const BITS_PER_SAMPLE: u16 = 16;

/// An enumerated audio input device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInputInfo {
    /// Position in the host's input device list
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
}

/// Capture parameters negotiated once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub chunk_frames: u32,
}

impl CaptureFormat {
    /// Stereo, 128 frame chunks at `sample_rate`
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: CAPTURE_CHANNELS,
            chunk_frames: CHUNK_FRAMES,
        }
    }

    /// Interleaved samples in one chunk
    pub fn samples_per_chunk(&self) -> usize {
        self.chunk_frames as usize * self.channels as usize
    }
}

/// An open input stream. Dropping it closes the stream.
pub trait CaptureStream {
    /// Block until one chunk of interleaved samples is available and append it to `out`.
    fn read_chunk(&mut self, out: &mut Vec<i16>) -> Result<(), AudioError>;
}

/// Host audio input
pub trait AudioInput {
    fn input_devices(&self) -> Result<Vec<AudioInputInfo>, AudioError>;

    /// Whether `device` accepts `sample_rate` at its full channel count
    fn supports_rate(&self, device: &AudioInputInfo, sample_rate: u32) -> bool;

    fn open_stream(
        &mut self,
        device_index: usize,
        format: &CaptureFormat,
    ) -> Result<Box<dyn CaptureStream>, AudioError>;
}

/// Audio error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// Host could not enumerate devices
    #[error("Audio host error: {0}")]
    Host(String),
    /// Device index no longer present
    #[error("Audio input {0} not available")]
    NoDevice(usize),
    /// Device cannot deliver the requested format
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
    /// Failed to build, start or read the stream
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
}
