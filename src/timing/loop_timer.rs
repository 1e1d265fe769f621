// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Loop length calculation.
//!
//! One bar is four beats, so a bar lasts `240 / bpm` seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Seconds per bar at 1 BPM (4 beats x 60 s)
const SECONDS_PER_BAR_AT_ONE_BPM: f64 = 240.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TempoError {
    #[error("invalid tempo '{0}'")]
    InvalidTempo(String),
}

/// Status shown once a tempo is accepted
pub const TEMPO_ACCEPTED: &str = "BPM Set!";

impl TempoError {
    pub fn status_message(&self) -> &'static str {
        "Please enter accurate BPM."
    }
}

/// Recording duration of one loop in seconds
pub fn compute_loop_seconds(bpm: u32, bars: u32, extra_seconds: u32) -> f64 {
    SECONDS_PER_BAR_AT_ONE_BPM / bpm as f64 * bars as f64 + extra_seconds as f64
}

/// Parse a user-entered tempo. Only positive integers are accepted.
pub fn parse_tempo(text: &str) -> Result<u32, TempoError> {
    match text.trim().parse::<u32>() {
        Ok(bpm) if bpm > 0 => Ok(bpm),
        _ => Err(TempoError::InvalidTempo(text.to_string())),
    }
}

/// Number of fixed-size chunk reads covering `loop_seconds`
pub fn capture_iterations(sample_rate: u32, chunk_frames: u32, loop_seconds: f64) -> u64 {
    (sample_rate as f64 / chunk_frames as f64 * loop_seconds).ceil() as u64
}

/// Holds the most recently accepted loop length
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopTimer {
    loop_seconds: f64,
}

impl LoopTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the loop length. On error the previous value is kept.
    pub fn set_loop(&mut self, bpm_text: &str, bars: u32, extra_seconds: u32) -> Result<f64, TempoError> {
        let bpm = parse_tempo(bpm_text)?;
        self.loop_seconds = compute_loop_seconds(bpm, bars, extra_seconds);
        info!("Loop time set! {}", self.loop_seconds);
        Ok(self.loop_seconds)
    }

    pub fn loop_seconds(&self) -> f64 {
        self.loop_seconds
    }
}

/// Pauses between MIDI changes and capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    /// After muting, before soloing
    #[serde(with = "millis")]
    pub mute_settle: Duration,
    /// Before and after restoring the mutes
    #[serde(with = "millis")]
    pub restore_settle: Duration,
    /// Before advancing to the next pattern
    #[serde(with = "millis")]
    pub pattern_advance: Duration,
    /// Between MIDI and audio discovery
    #[serde(with = "millis")]
    pub discovery_pause: Duration,
}

impl SettleDelays {
    /// No waiting at all
    pub fn none() -> Self {
        Self {
            mute_settle: Duration::ZERO,
            restore_settle: Duration::ZERO,
            pattern_advance: Duration::ZERO,
            discovery_pause: Duration::ZERO,
        }
    }
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            mute_settle: Duration::from_millis(100),
            restore_settle: Duration::from_secs(1),
            pattern_advance: Duration::from_secs(5),
            discovery_pause: Duration::from_secs(1),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
