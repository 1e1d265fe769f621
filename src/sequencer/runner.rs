// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The recording sequence.
//!
//! For every track of a pattern: mute everything, solo the track, start
//! playback while capturing, write the stem, then restore the mutes. In
//! Project mode the device is advanced and the next pattern follows.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::state::{ModifierExcludes, Mode, MuteState, Phase, SequenceState, TRACKS_PER_PATTERN};
use super::status::{CancelToken, SequencerHandle, StatusBoard};
use crate::audio::{AudioError, AudioInput, CaptureFormat};
use crate::device::{DeviceController, DeviceKind};
use crate::discovery::{discover_audio_device, discover_midi_device, AudioMatch, DiscoveryError, MidiMatch};
use crate::midi::{MidiOutput, MidiPorts};
use crate::project::{ensure_pattern_dir, pattern_dir, DirectoryError};
use crate::recording::{capture_take, write_wav, RecordingJob, WavError};
use crate::timing::SettleDelays;

/// Any failure that aborts a run
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("MIDI error: {0}")]
    Midi(String),
    #[error(transparent)]
    Wav(#[from] WavError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl SequenceError {
    fn midi(err: anyhow::Error) -> Self {
        SequenceError::Midi(format!("{:#}", err))
    }

    /// The single generic status shown for every aborted run
    pub fn status_message(device: DeviceKind) -> String {
        format!(
            "{} Sequence error try restarting the {} or press CANCEL Button",
            device, device
        )
    }
}

/// Parameters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// User selected device, `None` auto-detects
    pub selection: Option<DeviceKind>,
    pub mode: Mode,
    /// Stop once the pattern index reaches this value (1-16)
    pub pattern_limit: u8,
    pub loop_seconds: f64,
    /// Stem file name prefix
    pub name: String,
    /// Existing `{base}/{name}` directory
    pub project_dir: PathBuf,
    pub excludes: ModifierExcludes,
    pub delays: SettleDelays,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Complete,
    Cancelled,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: Outcome,
    pub device: Option<DeviceKind>,
    pub auto_detected: bool,
    pub sample_rate: u32,
    /// Stems in the order they were written
    pub files: Vec<PathBuf>,
    /// Next-pattern commands sent
    pub patterns_advanced: u32,
}

impl RunReport {
    fn new() -> Self {
        Self {
            outcome: Outcome::Complete,
            device: None,
            auto_detected: false,
            sample_rate: 0,
            files: Vec::new(),
            patterns_advanced: 0,
        }
    }
}

/// Drives the hardware through the capture sequence.
///
/// The sequencer owns the MIDI connection and the input stream for the
/// length of a run. Counters survive between runs of the same sequencer.
pub struct Sequencer<P: MidiPorts, A: AudioInput> {
    ports: P,
    audio: A,
    config: RunConfig,
    state: SequenceState,
    phase: Phase,
    status: StatusBoard,
    cancel: CancelToken,
}

impl<P: MidiPorts, A: AudioInput> Sequencer<P, A> {
    pub fn new(ports: P, audio: A, config: RunConfig) -> Self {
        let state = SequenceState::new(config.loop_seconds);
        Self {
            ports,
            audio,
            config,
            state,
            phase: Phase::Idle,
            status: StatusBoard::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Attach to an existing status line and cancel flag
    pub fn with_handle(mut self, handle: &SequencerHandle) -> Self {
        self.status = handle.status.clone();
        self.cancel = handle.cancel.clone();
        self
    }

    pub fn handle(&self) -> SequencerHandle {
        SequencerHandle {
            status: self.status.clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the whole sequence on the calling thread
    pub fn run(&mut self) -> Result<RunReport, SequenceError> {
        // A cancel pressed while idle recovers from a failed run
        if self.cancel.is_cancelled() {
            info!("cancel pending, counters reset");
            self.state.reset();
        }
        self.cancel.reset();
        let mut report = RunReport::new();

        self.phase = Phase::Discovering;
        let midi = self.discover_midi();
        pause(self.config.delays.discovery_pause);

        let kind = midi
            .as_ref()
            .map(|m| m.profile.kind())
            .or(self.config.selection)
            .unwrap_or(DeviceKind::OpZ);
        let audio = self.discover_audio(kind);
        self.status.set("Sequence started");

        let result = match (midi, audio) {
            (Some(midi), Ok(audio)) => {
                report.device = Some(midi.profile.kind());
                report.auto_detected = midi.auto_detected;
                report.sample_rate = audio.sample_rate;
                self.run_armed(&midi, &audio, &mut report)
            }
            (None, _) => Err(SequenceError::Discovery(DiscoveryError::DeviceNotFound)),
            (Some(_), Err(e)) => Err(e),
        };

        match result {
            Ok(outcome) => {
                report.outcome = outcome;
                Ok(report)
            }
            Err(e) => {
                self.phase = Phase::Failed;
                warn!("sequence aborted: {}", e);
                self.status.set(SequenceError::status_message(kind));
                Err(e)
            }
        }
    }

    fn discover_midi(&mut self) -> Option<MidiMatch> {
        let names = self.ports.output_names();
        match discover_midi_device(self.config.selection, &names) {
            Ok(found) => {
                self.status.set(found.status_message());
                Some(found)
            }
            Err(e) => {
                self.status.set(e.status_message());
                None
            }
        }
    }

    fn discover_audio(&mut self, kind: DeviceKind) -> Result<AudioMatch, SequenceError> {
        let devices = match self.audio.input_devices() {
            Ok(devices) => devices,
            Err(e) => {
                self.status.set(format!("Audio Device Error: {}", e));
                return Err(e.into());
            }
        };

        let audio = &self.audio;
        match discover_audio_device(kind, &devices, |d, rate| audio.supports_rate(d, rate)) {
            Ok(found) => Ok(found),
            Err(e) => {
                self.status.set(e.status_message());
                Err(e.into())
            }
        }
    }

    fn run_armed(
        &mut self,
        midi: &MidiMatch,
        audio: &AudioMatch,
        report: &mut RunReport,
    ) -> Result<Outcome, SequenceError> {
        let mut output = self
            .ports
            .connect(midi.port_index)
            .map_err(SequenceError::midi)?;
        info!(
            "Initialized device interface: {} on '{}'",
            midi.profile.name(),
            output.port_name()
        );

        let format = CaptureFormat::stereo(audio.sample_rate);
        self.phase = Phase::Armed;

        if self.config.mode == Mode::Project {
            self.prepare_pattern_dir();
        }

        loop {
            for track in 0..TRACKS_PER_PATTERN {
                if self.cancel.is_cancelled() {
                    self.finish_cancelled(output);
                    return Ok(Outcome::Cancelled);
                }
                if self.state.pattern_index() == self.config.pattern_limit {
                    self.finish_complete(output);
                    return Ok(Outcome::Complete);
                }

                let mut controller = DeviceController::new(midi.profile, output.as_mut());
                let path = self.record_track(&mut controller, track, &format, audio.device_index)?;
                report.files.push(path);
                self.restore(&mut controller)?;

                let last_track = track == TRACKS_PER_PATTERN - 1;
                if last_track && self.cancel.is_cancelled() {
                    drop(controller);
                    self.finish_cancelled(output);
                    return Ok(Outcome::Cancelled);
                }

                if last_track && self.config.mode == Mode::Project {
                    self.advance_pattern(&mut controller)?;
                    report.patterns_advanced += 1;
                } else {
                    self.phase = Phase::NextChannel;
                }
            }

            if self.config.mode == Mode::Pattern {
                self.finish_complete(output);
                return Ok(Outcome::Complete);
            }
        }
    }

    fn record_track(
        &mut self,
        controller: &mut DeviceController<'_, dyn MidiOutput>,
        track: u8,
        format: &CaptureFormat,
        device_index: usize,
    ) -> Result<PathBuf, SequenceError> {
        debug!(pattern = self.state.pattern_index(), track, "channel pass");

        let mut mutes = MuteState::for_pass(&self.config.excludes);
        controller
            .apply_mute_state(mutes.values())
            .map_err(SequenceError::midi)?;
        pause(self.config.delays.mute_settle);

        controller.solo(track).map_err(SequenceError::midi)?;
        mutes.solo(track);
        debug!(audible = ?mutes.audible_tracks(), "soloed");

        self.phase = Phase::Recording { track };
        self.status.set("Recording...");

        let job = RecordingJob::new(
            &self.output_dir(),
            &self.config.name,
            self.state.track_counter(),
            *format,
            self.state.loop_seconds(),
        );

        let mut stream = self.audio.open_stream(device_index, format)?;
        // Playback starts after the stream is open so the take has no gap
        controller.start_playback().map_err(SequenceError::midi)?;
        self.status.set("Playback started");
        let take = capture_take(stream.as_mut(), &job)?;
        drop(stream);

        controller.stop_playback().map_err(SequenceError::midi)?;
        self.status.set("Playback stopped");

        write_wav(&job.path, &take)?;
        self.state.advance_track();
        info!(path = %job.path.display(), track = job.track_number, "stem written");
        self.status.set("End of Recording");

        Ok(job.path)
    }

    fn restore(
        &mut self,
        controller: &mut DeviceController<'_, dyn MidiOutput>,
    ) -> Result<(), SequenceError> {
        self.phase = Phase::Restoring;
        pause(self.config.delays.restore_settle);
        controller.unmute_all().map_err(SequenceError::midi)?;
        pause(self.config.delays.restore_settle);
        Ok(())
    }

    fn advance_pattern(
        &mut self,
        controller: &mut DeviceController<'_, dyn MidiOutput>,
    ) -> Result<(), SequenceError> {
        self.phase = Phase::NextPattern;
        pause(self.config.delays.pattern_advance);
        controller.next_pattern().map_err(SequenceError::midi)?;
        self.status.set("Next Pattern");
        self.state.advance_pattern();
        info!(pattern = self.state.pattern_index(), "advanced pattern");

        if self.state.pattern_index() != self.config.pattern_limit {
            self.prepare_pattern_dir();
        }
        Ok(())
    }

    /// Pattern directory failures are reported, the run carries on
    fn prepare_pattern_dir(&mut self) {
        if let Err(e) = ensure_pattern_dir(&self.config.project_dir, self.state.pattern_index()) {
            warn!("{}", e);
            self.status.set(e.pattern_status());
        }
    }

    fn output_dir(&self) -> PathBuf {
        match self.config.mode {
            Mode::Project => pattern_dir(&self.config.project_dir, self.state.pattern_index()),
            Mode::Pattern => self.config.project_dir.clone(),
        }
    }

    fn finish_cancelled(&mut self, output: Box<dyn MidiOutput>) {
        self.state.reset();
        drop(output);
        self.phase = Phase::Cancelled;
        self.status.set("MIDI closed");
    }

    fn finish_complete(&mut self, output: Box<dyn MidiOutput>) {
        self.state.reset();
        drop(output);
        self.phase = Phase::Complete;
        self.status.set("Sequence complete");
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioInputInfo, CaptureStream};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use std::path::Path;

    /// Everything the fake hardware saw, in order
    #[derive(Debug, Default)]
    struct Log {
        midi: Vec<Vec<u8>>,
        reads: u64,
        streams_opened: u32,
        closed: bool,
    }

    type Shared = Arc<Mutex<Log>>;

    struct FakeOutput(Shared);

    impl MidiOutput for FakeOutput {
        fn send(&mut self, message: &[u8]) -> anyhow::Result<()> {
            self.0.lock().unwrap().midi.push(message.to_vec());
            Ok(())
        }

        fn port_name(&self) -> &str {
            "fake"
        }
    }

    impl Drop for FakeOutput {
        fn drop(&mut self) {
            self.0.lock().unwrap().closed = true;
        }
    }

    struct FakePorts {
        names: Vec<String>,
        log: Shared,
    }

    impl MidiPorts for FakePorts {
        fn output_names(&self) -> Vec<String> {
            self.names.clone()
        }

        fn connect(&mut self, _index: usize) -> anyhow::Result<Box<dyn MidiOutput>> {
            Ok(Box::new(FakeOutput(Arc::clone(&self.log))))
        }
    }

    struct FakeStream {
        log: Shared,
        samples: usize,
    }

    impl CaptureStream for FakeStream {
        fn read_chunk(&mut self, out: &mut Vec<i16>) -> Result<(), AudioError> {
            self.log.lock().unwrap().reads += 1;
            out.extend(std::iter::repeat(0).take(self.samples));
            Ok(())
        }
    }

    struct FakeAudio {
        devices: Vec<AudioInputInfo>,
        log: Shared,
    }

    impl AudioInput for FakeAudio {
        fn input_devices(&self) -> Result<Vec<AudioInputInfo>, AudioError> {
            Ok(self.devices.clone())
        }

        fn supports_rate(&self, _device: &AudioInputInfo, rate: u32) -> bool {
            rate == 48000
        }

        fn open_stream(
            &mut self,
            _device_index: usize,
            format: &CaptureFormat,
        ) -> Result<Box<dyn CaptureStream>, AudioError> {
            self.log.lock().unwrap().streams_opened += 1;
            Ok(Box::new(FakeStream {
                log: Arc::clone(&self.log),
                samples: format.samples_per_chunk(),
            }))
        }
    }

    fn sequencer(dir: &Path, mode: Mode, ports: &[&str], audio: &[&str]) -> (Sequencer<FakePorts, FakeAudio>, Shared) {
        let log = Shared::default();
        let ports = FakePorts {
            names: ports.iter().map(|s| s.to_string()).collect(),
            log: Arc::clone(&log),
        };
        let audio = FakeAudio {
            devices: audio
                .iter()
                .enumerate()
                .map(|(index, name)| AudioInputInfo {
                    index,
                    name: name.to_string(),
                    max_input_channels: 2,
                })
                .collect(),
            log: Arc::clone(&log),
        };
        let config = RunConfig {
            selection: Some(DeviceKind::OpZ),
            mode,
            pattern_limit: 16,
            loop_seconds: 0.01,
            name: "jam".to_string(),
            project_dir: dir.to_path_buf(),
            excludes: ModifierExcludes::default(),
            delays: SettleDelays::none(),
        };
        (Sequencer::new(ports, audio, config), log)
    }

    #[test]
    fn test_pattern_mode_records_eight_stems() {
        let dir = tempdir().unwrap();
        let (mut seq, log) = sequencer(dir.path(), Mode::Pattern, &["OP-Z"], &["OP-Z"]);

        let report = seq.run().unwrap();

        assert_eq!(report.outcome, Outcome::Complete);
        assert_eq!(report.files.len(), 8);
        assert_eq!(report.sample_rate, 48000);
        assert_eq!(report.patterns_advanced, 0);
        for n in 1..=8 {
            assert!(dir.path().join(format!("jam_track{}.wav", n)).is_file());
        }

        let log = log.lock().unwrap();
        assert_eq!(log.streams_opened, 8);
        // 48000 / 128 * 0.01 = 3.75 -> 4 reads per stem
        assert_eq!(log.reads, 32);
        assert!(log.closed);
        assert_eq!(seq.phase(), Phase::Complete);
        assert_eq!(seq.handle().status(), "Sequence complete");
    }

    #[test]
    fn test_message_order_for_one_pass() {
        let dir = tempdir().unwrap();
        let (mut seq, log) = sequencer(dir.path(), Mode::Pattern, &["OP-Z"], &["OP-Z"]);
        seq.run().unwrap();

        let log = log.lock().unwrap();
        // Per track: 14 mutes, solo, start, stop, 14 unmutes
        assert_eq!(log.midi.len(), 8 * 31);

        let first: &[Vec<u8>] = &log.midi[..31];
        assert!(first[..8].iter().all(|m| m[1] == 53 && m[2] == 1));
        assert_eq!(first[14], vec![0xB0, 53, 0]);
        assert_eq!(first[15], vec![0xFA]);
        assert_eq!(first[16], vec![0xFC]);
        assert!(first[17..].iter().all(|m| m[1] == 53 && m[2] == 0));

        let third_solo = &log.midi[2 * 31 + 14];
        assert_eq!(third_solo, &vec![0xB2, 53, 0]);
    }

    #[test]
    fn test_missing_midi_device_fails_with_generic_status() {
        let dir = tempdir().unwrap();
        let (mut seq, log) = sequencer(dir.path(), Mode::Pattern, &["IAC"], &["OP-Z"]);

        let err = seq.run().unwrap_err();

        assert!(matches!(err, SequenceError::Discovery(DiscoveryError::DeviceNotFound)));
        assert_eq!(seq.phase(), Phase::Failed);
        assert_eq!(
            seq.handle().status(),
            "OP-Z Sequence error try restarting the OP-Z or press CANCEL Button"
        );
        assert!(log.lock().unwrap().midi.is_empty());
    }

    #[test]
    fn test_missing_audio_device_fails() {
        let dir = tempdir().unwrap();
        let (mut seq, _log) = sequencer(dir.path(), Mode::Pattern, &["OP-XY"], &["Mic"]);

        let err = seq.run().unwrap_err();
        assert!(matches!(
            err,
            SequenceError::Discovery(DiscoveryError::AudioDeviceNotFound(DeviceKind::OpXy))
        ));
    }

    #[test]
    fn test_cancel_before_run_starts_is_cleared() {
        let dir = tempdir().unwrap();
        let (mut seq, _log) = sequencer(dir.path(), Mode::Pattern, &["OP-Z"], &["OP-Z"]);
        seq.handle().cancel();

        let report = seq.run().unwrap();
        assert_eq!(report.outcome, Outcome::Complete);
        assert_eq!(report.files.len(), 8);
    }

    #[test]
    fn test_pending_cancel_resets_counters() {
        let dir = tempdir().unwrap();
        let (mut seq, _log) = sequencer(dir.path(), Mode::Pattern, &["OP-Z"], &["OP-Z"]);
        seq.state.advance_track();
        seq.state.advance_track();
        seq.handle().cancel();

        let report = seq.run().unwrap();
        assert_eq!(report.files[0].file_name().unwrap(), "jam_track1.wav");
    }

    #[test]
    fn test_pattern_limit_already_reached() {
        let dir = tempdir().unwrap();
        let (mut seq, log) = sequencer(dir.path(), Mode::Project, &["OP-Z"], &["OP-Z"]);
        seq.config.pattern_limit = 0;

        let report = seq.run().unwrap();
        assert!(report.files.is_empty());
        assert!(log.lock().unwrap().closed);
    }
}
