// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI port and audio input discovery.
//!
//! Matching works on plain name lists so it can be exercised without
//! hardware. The sequencer feeds it whatever the backend enumerates.

use thiserror::Error;
use tracing::{info, warn};

use crate::audio::{AudioInputInfo, PREFERRED_SAMPLE_RATE, FALLBACK_SAMPLE_RATE};
use crate::device::{DeviceKind, DeviceProfile};

/// Discovery failures. Reported on the status line, never fatal by themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("no MIDI output port matches OP-Z or OP-XY")]
    DeviceNotFound,
    #[error("no audio input device matches {0}")]
    AudioDeviceNotFound(DeviceKind),
}

impl DiscoveryError {
    pub fn status_message(&self) -> String {
        match self {
            DiscoveryError::DeviceNotFound => "Can't find OP-Z or OP-XY: MIDI Error.".to_string(),
            DiscoveryError::AudioDeviceNotFound(kind) => {
                format!("{} Audio Device not found.", kind)
            }
        }
    }
}

/// A matched MIDI output port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiMatch {
    /// Index into the enumerated port list
    pub port_index: usize,
    pub port_name: String,
    pub profile: DeviceProfile,
    /// True when the match came from the auto-detect fallback
    pub auto_detected: bool,
}

impl MidiMatch {
    pub fn status_message(&self) -> String {
        if self.auto_detected {
            format!("{} found (auto-detected)", self.profile.name())
        } else {
            format!("{} found", self.profile.name())
        }
    }
}

/// A matched audio input device and its negotiated rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMatch {
    pub device_index: usize,
    pub device_name: String,
    pub sample_rate: u32,
    /// Preferred rate was rejected by the device
    pub degraded: bool,
}

fn first_port_matching(port_names: &[String], kind: DeviceKind) -> Option<(usize, &String)> {
    port_names
        .iter()
        .enumerate()
        .find(|(_, name)| name.contains(kind.token()))
}

/// Resolve the MIDI port for the selected device.
///
/// The selected device is tried first, then OP-Z and OP-XY in that order.
/// The first port containing the device token wins.
pub fn discover_midi_device(
    selection: Option<DeviceKind>,
    port_names: &[String],
) -> Result<MidiMatch, DiscoveryError> {
    info!(ports = ?port_names, "MIDI outputs");

    let make = |index: usize, name: &String, kind: DeviceKind, auto_detected: bool| MidiMatch {
        port_index: index,
        port_name: name.clone(),
        profile: DeviceProfile::for_kind(kind),
        auto_detected,
    };

    if let Some(kind) = selection {
        if let Some((index, name)) = first_port_matching(port_names, kind) {
            return Ok(make(index, name, kind, false));
        }
    }

    for kind in DeviceKind::DETECT_ORDER {
        if let Some((index, name)) = first_port_matching(port_names, kind) {
            if let Some(selected) = selection {
                warn!(
                    "{} selected but not connected, using {} on '{}'",
                    selected, kind, name
                );
            }
            return Ok(make(index, name, kind, true));
        }
    }

    Err(DiscoveryError::DeviceNotFound)
}

/// Resolve the audio input for `kind` and negotiate the sample rate.
///
/// `probe(device, rate)` reports whether the device accepts the rate at its
/// full input channel count.
pub fn discover_audio_device<F>(
    kind: DeviceKind,
    devices: &[AudioInputInfo],
    probe: F,
) -> Result<AudioMatch, DiscoveryError>
where
    F: Fn(&AudioInputInfo, u32) -> bool,
{
    for device in devices.iter().filter(|d| d.max_input_channels > 0) {
        info!("Input Device id {} - {}", device.index, device.name);
    }

    let device = devices
        .iter()
        .find(|d| d.name.contains(kind.token()) && d.max_input_channels > 0)
        .ok_or(DiscoveryError::AudioDeviceNotFound(kind))?;

    info!("Detected {} audio at index {}: {}", kind, device.index, device.name);

    let (sample_rate, degraded) = if probe(device, PREFERRED_SAMPLE_RATE) {
        (PREFERRED_SAMPLE_RATE, false)
    } else {
        warn!("{} Hz compatibility mode", FALLBACK_SAMPLE_RATE);
        (FALLBACK_SAMPLE_RATE, true)
    };

    Ok(AudioMatch {
        device_index: device.index,
        device_name: device.name.clone(),
        sample_rate,
        degraded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn input(index: usize, name: &str, channels: u16) -> AudioInputInfo {
        AudioInputInfo {
            index,
            name: name.to_string(),
            max_input_channels: channels,
        }
    }

    #[test]
    fn test_selected_device_found() {
        let ports = names(&["IAC Bus 1", "OP-Z MIDI"]);
        let found = discover_midi_device(Some(DeviceKind::OpZ), &ports).unwrap();

        assert_eq!(found.port_index, 1);
        assert_eq!(found.profile.kind(), DeviceKind::OpZ);
        assert!(!found.auto_detected);
        assert_eq!(found.status_message(), "OP-Z found");
    }

    #[test]
    fn test_selection_falls_through_to_auto_detect() {
        let ports = names(&["OP-XY Port 1"]);
        let found = discover_midi_device(Some(DeviceKind::OpZ), &ports).unwrap();

        assert_eq!(found.profile.kind(), DeviceKind::OpXy);
        assert!(found.auto_detected);
        assert_eq!(found.status_message(), "OP-XY found (auto-detected)");
    }

    #[test]
    fn test_auto_detect_prefers_op_z() {
        let ports = names(&["OP-XY Port 1", "OP-Z"]);
        let found = discover_midi_device(None, &ports).unwrap();

        assert_eq!(found.profile.kind(), DeviceKind::OpZ);
        assert_eq!(found.port_index, 1);
    }

    #[test]
    fn test_first_of_several_matches_wins() {
        let ports = names(&["OP-Z A", "OP-Z B"]);
        let found = discover_midi_device(Some(DeviceKind::OpZ), &ports).unwrap();
        assert_eq!(found.port_name, "OP-Z A");
    }

    #[test]
    fn test_no_device() {
        let err = discover_midi_device(Some(DeviceKind::OpXy), &names(&["IAC Bus 1"])).unwrap_err();
        assert_eq!(err, DiscoveryError::DeviceNotFound);
        assert_eq!(err.status_message(), "Can't find OP-Z or OP-XY: MIDI Error.");
    }

    #[test]
    fn test_audio_device_prefers_48k() {
        let devices = vec![input(0, "Built-in Microphone", 1), input(1, "OP-Z", 2)];
        let found = discover_audio_device(DeviceKind::OpZ, &devices, |_, _| true).unwrap();

        assert_eq!(found.device_index, 1);
        assert_eq!(found.sample_rate, 48000);
        assert!(!found.degraded);
    }

    #[test]
    fn test_audio_device_falls_back_to_44k() {
        let devices = vec![input(3, "OP-XY Audio", 2)];
        let found =
            discover_audio_device(DeviceKind::OpXy, &devices, |_, rate| rate != 48000).unwrap();

        assert_eq!(found.sample_rate, 44100);
        assert!(found.degraded);
    }

    #[test]
    fn test_audio_device_skips_output_only() {
        let devices = vec![input(0, "OP-Z", 0), input(1, "OP-Z", 2)];
        let found = discover_audio_device(DeviceKind::OpZ, &devices, |_, _| true).unwrap();
        assert_eq!(found.device_index, 1);
    }

    #[test]
    fn test_audio_device_not_found() {
        let devices = vec![input(0, "OP-Z", 2)];
        let err = discover_audio_device(DeviceKind::OpXy, &devices, |_, _| true).unwrap_err();

        assert_eq!(err, DiscoveryError::AudioDeviceNotFound(DeviceKind::OpXy));
        assert_eq!(err.status_message(), "OP-XY Audio Device not found.");
    }
}
