// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for underbridge.
//!
//! Settings live in an optional TOML file. Every field has a default, and
//! command line flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::DeviceKind;
use crate::sequencer::{ModifierExcludes, Mode, MAX_PATTERN_LIMIT};
use crate::timing::SettleDelays;

/// Accepted bar counts
pub const BARS_RANGE: std::ops::RangeInclusive<u32> = 1..=9;
/// Accepted extra seconds
pub const EXTRA_SECONDS_RANGE: std::ops::RangeInclusive<u32> = 0..=10;

/// Out of range settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("bars must be between 1 and 9, got {0}")]
    Bars(u32),
    #[error("patterns must be between 1 and 16, got {0}")]
    Patterns(u8),
    #[error("extra seconds must be between 0 and 10, got {0}")]
    ExtraSeconds(u32),
    #[error("bpm must be a positive number")]
    Bpm,
    #[error("a project name is required")]
    MissingName,
}

/// Root settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub device: DeviceSettings,
    pub recording: RecordingSettings,
    /// Modifier channels force-muted during capture
    pub excludes: ModifierExcludes,
    /// Settle delays in milliseconds
    pub timing: SettleDelays,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Trim the project name so the folder and the stem files agree
    pub fn normalize(&mut self) {
        let trimmed = self.recording.name.trim();
        if trimmed.len() != self.recording.name.len() {
            self.recording.name = trimmed.to_string();
        }
    }

    /// Check every user-facing parameter range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rec = &self.recording;
        if rec.bpm == 0 {
            return Err(ConfigError::Bpm);
        }
        if !BARS_RANGE.contains(&rec.bars) {
            return Err(ConfigError::Bars(rec.bars));
        }
        if !(1..=MAX_PATTERN_LIMIT).contains(&rec.patterns) {
            return Err(ConfigError::Patterns(rec.patterns));
        }
        if !EXTRA_SECONDS_RANGE.contains(&rec.extra_seconds) {
            return Err(ConfigError::ExtraSeconds(rec.extra_seconds));
        }
        if rec.name.trim().is_empty() {
            return Err(ConfigError::MissingName);
        }
        Ok(())
    }
}

/// Which groovebox to look for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceSettings {
    /// Preferred device, auto-detect falls back to the other one
    pub selection: DeviceKind,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            selection: DeviceKind::OpZ,
        }
    }
}

/// Capture parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecordingSettings {
    pub mode: Mode,
    /// Tempo, 0 means not set
    pub bpm: u32,
    pub bars: u32,
    /// Pattern limit for Project mode
    pub patterns: u8,
    /// Padding added to every loop
    pub extra_seconds: u32,
    /// Project name, also the stem file prefix
    pub name: String,
    /// Base directory the project folder is created in
    pub output: PathBuf,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Pattern,
            bpm: 0,
            bars: 1,
            patterns: MAX_PATTERN_LIMIT,
            extra_seconds: 0,
            name: String::new(),
            output: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid() -> Settings {
        let mut settings = Settings::default();
        settings.recording.bpm = 120;
        settings.recording.name = "jam".to_string();
        settings
    }

    #[test]
    fn test_parse_settings() {
        let text = r#"
[device]
selection = "op-xy"

[recording]
mode = "project"
bpm = 96
bars = 4
patterns = 3
extra_seconds = 2
name = "live set"
output = "/tmp/stems"

[excludes]
tape = true
master = true

[timing]
pattern_advance = 2500
"#;

        let settings = Settings::from_toml(text).unwrap();
        assert_eq!(settings.device.selection, DeviceKind::OpXy);
        assert_eq!(settings.recording.mode, Mode::Project);
        assert_eq!(settings.recording.bpm, 96);
        assert_eq!(settings.recording.patterns, 3);
        assert_eq!(settings.recording.output, PathBuf::from("/tmp/stems"));
        assert!(settings.excludes.tape && settings.excludes.master);
        assert!(!settings.excludes.send1);
        assert_eq!(settings.timing.pattern_advance.as_millis(), 2500);
        assert_eq!(settings.timing.mute_settle.as_millis(), 100);
        settings.validate().unwrap();
    }

    #[test]
    fn test_default_values() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.device.selection, DeviceKind::OpZ);
        assert_eq!(settings.recording.mode, Mode::Pattern);
        assert_eq!(settings.recording.bars, 1);
        assert_eq!(settings.recording.patterns, 16);
        assert_eq!(settings.timing, SettleDelays::default());
        // No tempo and no name yet
        assert_eq!(settings.validate(), Err(ConfigError::Bpm));
    }

    #[test]
    fn test_validate_ranges() {
        let mut s = valid();
        s.recording.bars = 10;
        assert_eq!(s.validate(), Err(ConfigError::Bars(10)));

        let mut s = valid();
        s.recording.patterns = 0;
        assert_eq!(s.validate(), Err(ConfigError::Patterns(0)));

        let mut s = valid();
        s.recording.patterns = 17;
        assert_eq!(s.validate(), Err(ConfigError::Patterns(17)));

        let mut s = valid();
        s.recording.extra_seconds = 11;
        assert_eq!(s.validate(), Err(ConfigError::ExtraSeconds(11)));

        let mut s = valid();
        s.recording.name = " ".to_string();
        assert_eq!(s.validate(), Err(ConfigError::MissingName));

        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn test_normalize_trims_name() {
        let mut s = valid();
        s.recording.name = "  jam ".to_string();
        s.normalize();
        assert_eq!(s.recording.name, "jam");

        let dir = tempdir().unwrap();
        let project = crate::project::ensure_project_dir(dir.path(), &s.recording.name).unwrap();
        assert_eq!(project.file_name().unwrap(), "jam");
        assert_eq!(crate::project::track_file_name(&s.recording.name, 0), "jam_track1.wav");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("underbridge.toml");
        let mut original = valid();
        original.excludes.perform = true;
        original.recording.mode = Mode::Project;

        fs::write(&path, original.to_toml().unwrap()).unwrap();
        let loaded = Settings::load(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
