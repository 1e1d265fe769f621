// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording and export system.
//!
//! This module provides:
//! - Fixed-length capture of one stem from an input stream
//! - 16-bit PCM WAV export

pub mod capture;
pub mod wav;

pub use capture::{capture_take, RecordingJob, Take};
pub use wav::{read_wav, write_wav, WavError};
