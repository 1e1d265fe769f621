// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! Loop length calculation and the settle delays that pace the
//! recording sequence.

pub mod loop_timer;

pub use loop_timer::{
    capture_iterations, compute_loop_seconds, parse_tempo, LoopTimer, SettleDelays, TempoError,
    TEMPO_ACCEPTED,
};
