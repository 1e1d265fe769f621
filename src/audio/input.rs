// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio input via cpal.
//!
//! The callback forwards interleaved i16 blocks over a channel; the
//! sequencer thread reassembles them into fixed-size chunks.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Host, Sample, SizedSample, Stream, StreamConfig};
use tracing::{debug, warn};

use super::{AudioError, AudioInput, AudioInputInfo, CaptureFormat, CaptureStream};

/// No data for this long means the device went away
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// cpal backed input host
pub struct CpalInput {
    host: Host,
}

impl CpalInput {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn device(&self, index: usize) -> Result<Device, AudioError> {
        self.host
            .input_devices()
            .map_err(|e| AudioError::Host(e.to_string()))?
            .nth(index)
            .ok_or(AudioError::NoDevice(index))
    }
}

impl Default for CpalInput {
    fn default() -> Self {
        Self::new()
    }
}

fn max_input_channels(device: &Device) -> u16 {
    device
        .supported_input_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

impl AudioInput for CpalInput {
    fn input_devices(&self) -> Result<Vec<AudioInputInfo>, AudioError> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::Host(e.to_string()))?;

        Ok(devices
            .enumerate()
            .map(|(index, device)| AudioInputInfo {
                index,
                name: device.name().unwrap_or_else(|_| format!("Unknown {}", index)),
                max_input_channels: max_input_channels(&device),
            })
            .collect())
    }

    fn supports_rate(&self, info: &AudioInputInfo, sample_rate: u32) -> bool {
        let Ok(device) = self.device(info.index) else {
            return false;
        };
        let Ok(mut configs) = device.supported_input_configs() else {
            return false;
        };
        configs.any(|c| {
            c.channels() == info.max_input_channels
                && c.min_sample_rate().0 <= sample_rate
                && c.max_sample_rate().0 >= sample_rate
        })
    }

    fn open_stream(
        &mut self,
        device_index: usize,
        format: &CaptureFormat,
    ) -> Result<Box<dyn CaptureStream>, AudioError> {
        let device = self.device(device_index)?;

        let candidates: Vec<_> = device
            .supported_input_configs()
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?
            .filter(|c| {
                c.channels() == format.channels
                    && c.min_sample_rate().0 <= format.sample_rate
                    && c.max_sample_rate().0 >= format.sample_rate
            })
            .collect();

        // Native i16 first, f32 is converted in the callback
        let sample_format = [cpal::SampleFormat::I16, cpal::SampleFormat::F32]
            .into_iter()
            .find(|f| candidates.iter().any(|c| c.sample_format() == *f))
            .ok_or_else(|| {
                AudioError::UnsupportedFormat(format!(
                    "{} ch @ {} Hz",
                    format.channels, format.sample_rate
                ))
            })?;

        let config = StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(format.chunk_frames),
        };

        let (stream, rx) = match build_stream(&device, &config, sample_format) {
            Ok(built) => built,
            Err(e) => {
                // Some hosts refuse fixed buffer sizes
                warn!("Fixed buffer rejected ({}), using host default", e);
                let fallback = StreamConfig {
                    buffer_size: cpal::BufferSize::Default,
                    ..config
                };
                build_stream(&device, &fallback, sample_format).map_err(AudioError::StreamFailed)?
            }
        };

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        debug!(
            device_index,
            sample_rate = format.sample_rate,
            ?sample_format,
            "input stream opened"
        );

        Ok(Box::new(CpalStream {
            _stream: stream,
            rx,
            pending: Vec::new(),
            samples_per_chunk: format.samples_per_chunk(),
        }))
    }
}

type Built = (Stream, Receiver<Vec<i16>>);

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    sample_format: cpal::SampleFormat,
) -> Result<Built, String> {
    match sample_format {
        cpal::SampleFormat::F32 => build_typed::<f32>(device, config),
        _ => build_typed::<i16>(device, config),
    }
}

fn build_typed<T>(device: &Device, config: &StreamConfig) -> Result<Built, String>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let (tx, rx) = mpsc::channel();

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let block: Vec<i16> = data.iter().map(|s| i16::from_sample(*s)).collect();
                // Receiver gone means the capture finished
                let _ = tx.send(block);
            },
            move |err| {
                warn!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| format!("Failed to build stream: {}", e))?;

    Ok((stream, rx))
}

/// Running cpal input stream
struct CpalStream {
    _stream: Stream,
    rx: Receiver<Vec<i16>>,
    pending: Vec<i16>,
    samples_per_chunk: usize,
}

impl CaptureStream for CpalStream {
    fn read_chunk(&mut self, out: &mut Vec<i16>) -> Result<(), AudioError> {
        while self.pending.len() < self.samples_per_chunk {
            match self.rx.recv_timeout(READ_TIMEOUT) {
                Ok(block) => self.pending.extend_from_slice(&block),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(AudioError::StreamFailed("audio input stalled".to_string()))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AudioError::StreamFailed("audio input closed".to_string()))
                }
            }
        }
        out.extend(self.pending.drain(..self.samples_per_chunk));
        Ok(())
    }
}

/// List available audio input devices
pub fn list_devices() -> Vec<AudioInputInfo> {
    CpalInput::new().input_devices().unwrap_or_default()
}

/// Print available audio input devices to stdout
pub fn print_devices() {
    let devices: Vec<_> = list_devices()
        .into_iter()
        .filter(|d| d.max_input_channels > 0)
        .collect();
    if devices.is_empty() {
        println!("No audio input devices found.");
    } else {
        println!("Available audio inputs:");
        for device in devices {
            println!(
                "  {}: {} ({} ch)",
                device.index, device.name, device.max_input_channels
            );
        }
    }
}
