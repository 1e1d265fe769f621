// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! midir backend.
//!
//! Cross-platform implementation of the `MidiOutput` trait (Core MIDI,
//! ALSA, WinMM) used to drive the groovebox.

use anyhow::{anyhow, Result};
use midir::MidiOutputConnection;
use tracing::debug;

use super::{MidiOutput, MidiPorts};

const CLIENT_NAME: &str = "underbridge";

/// midir output connection.
pub struct MidirOutput {
    connection: MidiOutputConnection,
    port_name: String,
}

impl MidirOutput {
    /// Create a new output connected to the specified port.
    ///
    /// # Arguments
    /// * `port_index` - Index of the port in the system's MIDI output list
    ///
    /// # Returns
    /// * `Ok(MidirOutput)` on success
    /// * `Err` if the client could not be created or the connection failed
    pub fn new(port_index: usize) -> Result<Self> {
        let midi_out = midir::MidiOutput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI client: {}", e))?;

        let ports = midi_out.ports();
        let count = ports.len();
        let port = ports.get(port_index).ok_or_else(|| {
            anyhow!(
                "MIDI destination {} not found (only {} available)",
                port_index,
                count
            )
        })?;

        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| format!("Unknown {}", port_index));

        let connection = midi_out
            .connect(port, "underbridge-output")
            .map_err(|e| anyhow!("Failed to connect to {}: {}", port_name, e))?;

        debug!(port = %port_name, "MIDI output opened");

        Ok(Self {
            connection,
            port_name,
        })
    }
}

impl Drop for MidirOutput {
    fn drop(&mut self) {
        debug!(port = %self.port_name, "MIDI output closed");
    }
}

impl MidiOutput for MidirOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send MIDI message: {}", e))
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// System MIDI ports via midir
#[derive(Debug, Clone, Copy, Default)]
pub struct MidirPorts;

impl MidiPorts for MidirPorts {
    fn output_names(&self) -> Vec<String> {
        list_destinations().into_iter().map(|(_, name)| name).collect()
    }

    fn connect(&mut self, index: usize) -> Result<Box<dyn MidiOutput>> {
        Ok(Box::new(MidirOutput::new(index)?))
    }
}

/// List all available MIDI output ports.
///
/// # Returns
/// A vector of (index, name) tuples. Empty if no MIDI client can be created.
pub fn list_destinations() -> Vec<(usize, String)> {
    let midi_out = match midir::MidiOutput::new(CLIENT_NAME) {
        Ok(m) => m,
        Err(e) => {
            debug!("MIDI client unavailable: {}", e);
            return Vec::new();
        }
    };

    midi_out
        .ports()
        .iter()
        .enumerate()
        .map(|(i, port)| {
            let name = midi_out
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown {}", i));
            (i, name)
        })
        .collect()
}

/// Print all available MIDI output ports to stdout.
pub fn print_destinations() {
    let destinations = list_destinations();
    if destinations.is_empty() {
        println!("No MIDI destinations found.");
    } else {
        println!("Available MIDI destinations:");
        for (i, name) in destinations {
            println!("  {}: {}", i, name);
        }
    }
}
