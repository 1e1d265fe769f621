// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! underbridge command line front end

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};

use underbridge::audio::{self, CpalInput, CHUNK_FRAMES, FALLBACK_SAMPLE_RATE, PREFERRED_SAMPLE_RATE};
use underbridge::config::Settings;
use underbridge::device::DeviceKind;
use underbridge::midi::{self, MidirPorts};
use underbridge::project::ensure_project_dir;
use underbridge::sequencer::{Mode, Outcome, RunConfig, Sequencer, SequencerHandle};
use underbridge::timing::{
    capture_iterations, compute_loop_seconds, parse_tempo, LoopTimer, TEMPO_ACCEPTED,
};

/// How often the status line is polled
const STATUS_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "underbridge")]
#[command(about = "Multichannel stem exporter for the OP-Z and OP-XY", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record every track of the current pattern (or project) to WAV
    Record(RecordArgs),

    /// List available MIDI destinations
    ListMidi,

    /// List available audio inputs
    ListAudio,

    /// Show the loop length for a tempo
    LoopTime {
        /// Tempo in BPM
        #[arg(long)]
        bpm: String,

        /// Bars per loop (1-9)
        #[arg(long, default_value = "1")]
        bars: u32,

        /// Seconds added to every loop (0-10)
        #[arg(long, default_value = "0")]
        extra_seconds: u32,
    },
}

#[derive(Args)]
struct RecordArgs {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device to look for: op-z or op-xy
    #[arg(short, long)]
    device: Option<DeviceKind>,

    /// pattern records one pattern, project walks through the patterns
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Tempo in BPM
    #[arg(long)]
    bpm: Option<String>,

    /// Bars per loop (1-9)
    #[arg(long)]
    bars: Option<u32>,

    /// Patterns to record in project mode (1-16)
    #[arg(long)]
    patterns: Option<u8>,

    /// Seconds added to every loop (0-10)
    #[arg(long)]
    extra_seconds: Option<u32>,

    /// Force-mute a modifier channel (send1, send2, tape, master, perform, module)
    #[arg(long = "exclude")]
    excludes: Vec<String>,

    /// Project name, used for the folder and the file names
    #[arg(short, long)]
    name: Option<String>,

    /// Base directory the project folder is created in
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Merge the settings file with the command line
fn resolve_settings(args: &RecordArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let rec = &mut settings.recording;
    if let Some(device) = args.device {
        settings.device.selection = device;
    }
    if let Some(mode) = args.mode {
        rec.mode = mode;
    }
    if let Some(bpm) = &args.bpm {
        match parse_tempo(bpm) {
            Ok(bpm) => rec.bpm = bpm,
            Err(e) => return Err(anyhow!(e.status_message())),
        }
    }
    if let Some(bars) = args.bars {
        rec.bars = bars;
    }
    if let Some(patterns) = args.patterns {
        rec.patterns = patterns;
    }
    if let Some(extra) = args.extra_seconds {
        rec.extra_seconds = extra;
    }
    if let Some(name) = &args.name {
        rec.name = name.clone();
    }
    if let Some(output) = &args.output {
        rec.output = output.clone();
    }
    for name in &args.excludes {
        settings.excludes.set(name, true).map_err(|e| anyhow!(e))?;
    }

    settings.normalize();
    settings.validate()?;
    Ok(settings)
}

async fn record(args: RecordArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    let rec = &settings.recording;

    let mut timer = LoopTimer::new();
    let loop_seconds = timer
        .set_loop(&rec.bpm.to_string(), rec.bars, rec.extra_seconds)
        .map_err(|e| anyhow!(e.status_message()))?;
    println!("{}", TEMPO_ACCEPTED);

    let project_dir = match ensure_project_dir(&rec.output, &rec.name) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{}", e.project_status());
            return Err(e.into());
        }
    };

    let config = RunConfig {
        selection: Some(settings.device.selection),
        mode: rec.mode,
        pattern_limit: rec.patterns,
        loop_seconds,
        name: rec.name.clone(),
        project_dir,
        excludes: settings.excludes,
        delays: settings.timing,
    };
    info!(
        mode = %config.mode,
        loop_seconds,
        dir = %config.project_dir.display(),
        "starting sequence"
    );
    println!("Recording to {} (press Ctrl+C to cancel)", config.project_dir.display());

    let handle = SequencerHandle::new();

    // First Ctrl+C cancels at the next track, a second one quits
    let cancel = handle.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if cancel.is_cancelled() {
                eprintln!("Interrupted");
                process::exit(130);
            }
            println!("Cancelling after the current track... (Ctrl+C again to quit)");
            cancel.cancel();
        }
    });

    let worker_handle = handle.clone();
    let mut worker = tokio::task::spawn_blocking(move || {
        let mut sequencer =
            Sequencer::new(MidirPorts, CpalInput::new(), config).with_handle(&worker_handle);
        sequencer.run()
    });

    let mut ticker = tokio::time::interval(STATUS_POLL);
    let mut last_status = String::new();
    let joined = loop {
        tokio::select! {
            joined = &mut worker => break joined,
            _ = ticker.tick() => {
                let status = handle.status();
                if status != last_status {
                    println!("{}", status);
                    last_status = status;
                }
            }
        }
    };

    let status = handle.status();
    if status != last_status {
        println!("{}", status);
    }

    let report = joined.context("Sequencer worker stopped unexpectedly")??;
    let verb = match report.outcome {
        Outcome::Complete => "Recorded",
        Outcome::Cancelled => "Cancelled after",
    };
    println!(
        "{} {} stems at {} Hz",
        verb,
        report.files.len(),
        report.sample_rate
    );
    Ok(())
}

fn loop_time(bpm: &str, bars: u32, extra_seconds: u32) -> Result<()> {
    let bpm = parse_tempo(bpm).map_err(|e| anyhow!(e.status_message()))?;
    let seconds = compute_loop_seconds(bpm, bars, extra_seconds);

    println!("{} BPM, {} bars, +{}s: {:.3}s per loop", bpm, bars, extra_seconds, seconds);
    for rate in [PREFERRED_SAMPLE_RATE, FALLBACK_SAMPLE_RATE] {
        println!(
            "  {} Hz: {} reads of {} frames",
            rate,
            capture_iterations(rate, CHUNK_FRAMES, seconds),
            CHUNK_FRAMES
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Record(args) => record(args).await,
        Commands::ListMidi => {
            midi::print_destinations();
            Ok(())
        }
        Commands::ListAudio => {
            audio::print_devices();
            Ok(())
        }
        Commands::LoopTime {
            bpm,
            bars,
            extra_seconds,
        } => loop_time(&bpm, bars, extra_seconds),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
