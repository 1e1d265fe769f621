// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Recording sequencer.
//!
//! This module provides:
//! - Mute, track and pattern state for a capture session
//! - The channel-by-channel recording sequence
//! - The status line and cancel flag shared with the front end

pub mod runner;
pub mod state;
pub mod status;

pub use runner::{Outcome, RunConfig, RunReport, SequenceError, Sequencer};
pub use state::{
    ModifierExcludes, Mode, MuteState, Phase, SequenceState, MAX_PATTERN_LIMIT, PATTERN_WRAP,
    TRACKS_PER_PATTERN,
};
pub use status::{CancelToken, SequencerHandle, StatusBoard};
