// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Device profiles for the supported grooveboxes.
//!
//! Both devices currently share the same control numbers.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::midi::{messages, MidiOutput};

/// Number of channels addressed by a mute sweep (8 tracks + 6 modifiers)
pub const CHANNEL_COUNT: usize = 14;

/// Supported device identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    OpZ,
    OpXy,
}

impl DeviceKind {
    /// Auto-detect priority order
    pub const DETECT_ORDER: [DeviceKind; 2] = [DeviceKind::OpZ, DeviceKind::OpXy];

    /// Token matched against port and audio device names
    pub fn token(self) -> &'static str {
        match self {
            DeviceKind::OpZ => "OP-Z",
            DeviceKind::OpXy => "OP-XY",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "op-z" | "opz" => Ok(DeviceKind::OpZ),
            "op-xy" | "opxy" => Ok(DeviceKind::OpXy),
            other => Err(format!("unknown device '{}', expected op-z or op-xy", other)),
        }
    }
}

/// Control numbers used by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlMap {
    mute: u8,
    next_pattern: u8,
    next_pattern_value: u8,
}

const OP_Z_CONTROLS: ControlMap = ControlMap {
    mute: 53,
    next_pattern: 103,
    next_pattern_value: 16,
};

const OP_XY_CONTROLS: ControlMap = ControlMap {
    mute: 53,
    next_pattern: 103,
    next_pattern_value: 16,
};

/// MIDI control mapping for one device, fixed at discovery time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    kind: DeviceKind,
    controls: ControlMap,
}

impl DeviceProfile {
    /// Profile for the given device
    pub fn for_kind(kind: DeviceKind) -> Self {
        let controls = match kind {
            DeviceKind::OpZ => OP_Z_CONTROLS,
            DeviceKind::OpXy => OP_XY_CONTROLS,
        };
        Self { kind, controls }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.token()
    }

    /// Control Change muting (1) or unmuting (0) `channel`
    pub fn mute_message(&self, channel: u8, mute_value: u8) -> [u8; 3] {
        messages::control_change(channel, self.controls.mute, mute_value)
    }

    pub fn start_message(&self) -> [u8; 1] {
        [messages::START]
    }

    pub fn stop_message(&self) -> [u8; 1] {
        [messages::STOP]
    }

    /// Pattern advance. Global scope, always sent on channel 0.
    pub fn next_pattern_message(&self) -> [u8; 3] {
        messages::control_change(
            0,
            self.controls.next_pattern,
            self.controls.next_pattern_value,
        )
    }
}

/// Sends profile messages through a MIDI output
pub struct DeviceController<'a, O: MidiOutput + ?Sized> {
    profile: DeviceProfile,
    output: &'a mut O,
}

impl<'a, O: MidiOutput + ?Sized> DeviceController<'a, O> {
    pub fn new(profile: DeviceProfile, output: &'a mut O) -> Self {
        Self { profile, output }
    }

    pub fn mute_channel(&mut self, channel: u8, mute_value: u8) -> Result<()> {
        trace!(channel, mute_value, "mute");
        self.output
            .send(&self.profile.mute_message(channel, mute_value))
    }

    /// Send one mute message per channel, in index order
    pub fn apply_mute_state(&mut self, values: &[u8; CHANNEL_COUNT]) -> Result<()> {
        for (channel, value) in values.iter().enumerate() {
            self.mute_channel(channel as u8, *value)?;
        }
        Ok(())
    }

    /// Unmute a single channel
    pub fn solo(&mut self, channel: u8) -> Result<()> {
        self.mute_channel(channel, 0)
    }

    pub fn unmute_all(&mut self) -> Result<()> {
        self.apply_mute_state(&[0; CHANNEL_COUNT])
    }

    pub fn start_playback(&mut self) -> Result<()> {
        self.output.send(&self.profile.start_message())
    }

    pub fn stop_playback(&mut self) -> Result<()> {
        self.output.send(&self.profile.stop_message())
    }

    pub fn next_pattern(&mut self) -> Result<()> {
        self.output.send(&self.profile.next_pattern_message())
    }
}
