// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! underbridge - multichannel stem exporter for the OP-Z and OP-XY.
//!
//! Solos each of the eight tracks over MIDI, records the device's USB
//! audio while the pattern plays and writes one WAV file per track.

pub mod audio;
pub mod config;
pub mod device;
pub mod discovery;
pub mod midi;
pub mod project;
pub mod recording;
pub mod sequencer;
pub mod timing;
