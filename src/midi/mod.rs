// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output abstraction layer.
//!
//! The sequencer only ever talks to a [`MidiOutput`], so the hardware
//! transport (midir) can be swapped for a recording mock in tests.

pub mod midir_backend;

use anyhow::Result;

pub use midir_backend::{list_destinations, print_destinations, MidirOutput, MidirPorts};

/// Trait for MIDI output implementations.
///
/// Dropping the implementation closes the port.
pub trait MidiOutput: Send {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0xB0, 53, 1]` for a Control Change)
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the message could not be sent
    fn send(&mut self, message: &[u8]) -> Result<()>;

    /// Human readable name of the connected port.
    fn port_name(&self) -> &str;
}

impl<T: MidiOutput + ?Sized> MidiOutput for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        (**self).send(message)
    }

    fn port_name(&self) -> &str {
        (**self).port_name()
    }
}

/// Enumerates and opens MIDI output ports.
pub trait MidiPorts {
    /// Port names in system order
    fn output_names(&self) -> Vec<String>;

    /// Open the port at `index` of `output_names`
    fn connect(&mut self, index: usize) -> Result<Box<dyn MidiOutput>>;
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const CONTROL_CHANGE: u8 = 0xB0;

    // System Real-Time Messages
    pub const START: u8 = 0xFA;
    pub const STOP: u8 = 0xFC;

    /// Build a Control Change message on `channel`.
    pub fn control_change(channel: u8, control: u8, value: u8) -> [u8; 3] {
        [
            CONTROL_CHANGE | (channel & 0x0F),
            control & 0x7F,
            value & 0x7F,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock MIDI output for testing
    struct MockMidiOutput {
        messages: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl MockMidiOutput {
        fn new() -> Self {
            Self {
                messages: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn get_messages(&self) -> Vec<Vec<u8>> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl MidiOutput for MockMidiOutput {
        fn send(&mut self, message: &[u8]) -> Result<()> {
            self.messages.lock().unwrap().push(message.to_vec());
            Ok(())
        }

        fn port_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_mock_midi_output_send() {
        let mut output = MockMidiOutput::new();

        output.send(&messages::control_change(3, 53, 1)).unwrap();

        let messages = output.get_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], vec![0xB3, 53, 1]);
    }

    #[test]
    fn test_boxed_output_forwards() {
        let inner = MockMidiOutput::new();
        let log = Arc::clone(&inner.messages);
        let mut boxed: Box<dyn MidiOutput> = Box::new(inner);

        boxed.send(&[messages::START]).unwrap();

        assert_eq!(boxed.port_name(), "mock");
        assert_eq!(log.lock().unwrap().as_slice(), &[vec![0xFA]]);
    }

    #[test]
    fn test_control_change_masks_out_of_range() {
        // Channel 17 wraps to 1, values are limited to 7 bits
        assert_eq!(messages::control_change(17, 200, 255), [0xB1, 0x48, 0x7F]);
    }

    #[test]
    fn test_midi_message_constants() {
        assert_eq!(messages::CONTROL_CHANGE, 0xB0);
        assert_eq!(messages::START, 0xFA);
        assert_eq!(messages::STOP, 0xFC);
    }
}
