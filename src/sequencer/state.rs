// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session state mutated by the recording sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::CHANNEL_COUNT;

/// Recordable tracks per pattern (channels 0-7)
pub const TRACKS_PER_PATTERN: u8 = 8;
/// Pattern index wraps to 0 when it reaches this value
pub const PATTERN_WRAP: u8 = 15;
/// Largest accepted pattern limit
pub const MAX_PATTERN_LIMIT: u8 = 16;
/// First modifier channel index
const MODIFIER_OFFSET: usize = TRACKS_PER_PATTERN as usize;

/// Single pattern or whole project capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Record the 8 tracks of the current pattern
    #[default]
    Pattern,
    /// Record pattern after pattern, one subdirectory each
    Project,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Pattern => f.write_str("pattern"),
            Mode::Project => f.write_str("project"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pattern" => Ok(Mode::Pattern),
            "project" | "song" => Ok(Mode::Project),
            other => Err(format!("unknown mode '{}', expected pattern or project", other)),
        }
    }
}

/// Force-mute toggles for the six modifier channels (8-13)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierExcludes {
    pub send1: bool,
    pub send2: bool,
    pub tape: bool,
    pub master: bool,
    pub perform: bool,
    pub module: bool,
}

impl ModifierExcludes {
    /// Toggle names in channel order
    pub const NAMES: [&'static str; 6] = ["send1", "send2", "tape", "master", "perform", "module"];

    /// Toggles in channel order, index 0 is channel 8
    pub fn as_array(&self) -> [bool; 6] {
        [
            self.send1,
            self.send2,
            self.tape,
            self.master,
            self.perform,
            self.module,
        ]
    }

    /// Set a toggle by name
    pub fn set(&mut self, name: &str, value: bool) -> Result<(), String> {
        let slot = match name.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "send1" => &mut self.send1,
            "send2" => &mut self.send2,
            "tape" => &mut self.tape,
            "master" => &mut self.master,
            "perform" => &mut self.perform,
            "module" => &mut self.module,
            _ => return Err(format!("unknown modifier '{}'", name)),
        };
        *slot = value;
        Ok(())
    }
}

/// Mute value per channel, 1 = muted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteState([u8; CHANNEL_COUNT]);

impl MuteState {
    /// Everything audible
    pub fn open() -> Self {
        Self([0; CHANNEL_COUNT])
    }

    /// All tracks muted, modifiers from the exclude toggles
    pub fn for_pass(excludes: &ModifierExcludes) -> Self {
        let mut values = [1; CHANNEL_COUNT];
        for (n, exclude) in excludes.as_array().iter().enumerate() {
            values[MODIFIER_OFFSET + n] = u8::from(*exclude);
        }
        Self(values)
    }

    /// Unmute one track
    pub fn solo(&mut self, track: u8) {
        self.0[track as usize] = 0;
    }

    pub fn values(&self) -> &[u8; CHANNEL_COUNT] {
        &self.0
    }

    /// Unmuted tracks among channels 0-7
    pub fn audible_tracks(&self) -> Vec<u8> {
        (0..TRACKS_PER_PATTERN)
            .filter(|t| self.0[*t as usize] == 0)
            .collect()
    }
}

impl Default for MuteState {
    fn default() -> Self {
        Self::open()
    }
}

/// Counters carried across channels and patterns
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SequenceState {
    pattern_index: u8,
    track_counter: u8,
    loop_seconds: f64,
}

impl SequenceState {
    pub fn new(loop_seconds: f64) -> Self {
        Self {
            loop_seconds,
            ..Default::default()
        }
    }

    pub fn pattern_index(&self) -> u8 {
        self.pattern_index
    }

    pub fn track_counter(&self) -> u8 {
        self.track_counter
    }

    pub fn loop_seconds(&self) -> f64 {
        self.loop_seconds
    }

    /// Count one written stem, wrapping after 8
    pub fn advance_track(&mut self) {
        self.track_counter = (self.track_counter + 1) % TRACKS_PER_PATTERN;
    }

    /// Move to the next pattern, wrapping 15 to 0
    pub fn advance_pattern(&mut self) {
        self.pattern_index += 1;
        if self.pattern_index == PATTERN_WRAP {
            self.pattern_index = 0;
        }
    }

    /// Zero both counters, keeping the loop length
    pub fn reset(&mut self) {
        self.pattern_index = 0;
        self.track_counter = 0;
    }
}

/// Where the sequence currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Discovering,
    Armed,
    Recording { track: u8 },
    Restoring,
    NextChannel,
    NextPattern,
    Complete,
    Cancelled,
    Failed,
}
