//! CPAL-based audio host for native playback.
//!
//! Handles device selection, stream configuration, and sample format
//! conversion; the renderer only ever sees fixed-size f32 blocks.

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Sample, SampleFormat, SizedSample, StreamConfig, SupportedBufferSize};
use dasp_sample::FromSample;
use soundmask::AudioRenderer;

use crate::host_buffer::HostBuffer;

const HOST_BUFFER_FRAMES: u32 = 512;
const ENGINE_BLOCK_SIZE: usize = 512;
const PREFERRED_SAMPLE_RATE: u32 = 48_000;

/// Configuration the host ended up with after negotiation.
#[derive(Debug, Clone)]
pub struct AudioHostConfig {
    pub sample_rate: f32,
    pub channels: u16,
    pub buffer_size: usize,
    pub device_name: String,
}

/// Audio host that manages CPAL playback
pub struct AudioHost {
    _stream: cpal::Stream,
    config: AudioHostConfig,
}

impl AudioHost {
    /// Create and start a new audio host with the given renderer factory.
    ///
    /// The factory function receives (sample_rate, block_size) and should
    /// create the renderer with those parameters.
    pub fn new<R, F>(factory: F) -> anyhow::Result<Self>
    where
        R: AudioRenderer,
        F: FnOnce(f32, usize) -> R,
    {
        let (device, config, sample_format) = select_output_device()?;

        let sample_rate = config.sample_rate.0 as f32;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());

        let renderer = factory(sample_rate, ENGINE_BLOCK_SIZE);
        let buffer = HostBuffer::new(renderer, ENGINE_BLOCK_SIZE);

        let host_config = AudioHostConfig {
            sample_rate,
            channels: config.channels,
            buffer_size: ENGINE_BLOCK_SIZE,
            device_name,
        };

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32, R>(device, config, buffer)?,
            SampleFormat::I16 => build_stream::<i16, R>(device, config, buffer)?,
            SampleFormat::U16 => build_stream::<u16, R>(device, config, buffer)?,
            other => anyhow::bail!("unsupported sample format: {:?}", other),
        };

        stream.play().context("failed to start stream")?;

        Ok(Self {
            _stream: stream,
            config: host_config,
        })
    }

    /// Get the audio configuration
    pub fn config(&self) -> &AudioHostConfig {
        &self.config
    }
}

/// Select an output device and configure it
fn select_output_device() -> anyhow::Result<(cpal::Device, StreamConfig, SampleFormat)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default output device")?;

    // Prefer the engine's sample rate in a format we can convert from.
    if let Ok(configs) = device.supported_output_configs() {
        for supported in configs {
            let sample_format = supported.sample_format();
            if !matches!(
                sample_format,
                SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
            ) {
                continue;
            }

            if supported.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
                && supported.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
            {
                let supported_config =
                    supported.with_sample_rate(cpal::SampleRate(PREFERRED_SAMPLE_RATE));
                let buffer_size = choose_buffer_size(supported_config.buffer_size().clone());
                let mut config = supported_config.config();
                config.buffer_size = buffer_size;
                return Ok((device, config, sample_format));
            }
        }
    }

    // Fall back to whatever the device prefers.
    let supported = device
        .default_output_config()
        .context("failed to query default output config")?;
    let sample_format = supported.sample_format();
    let buffer_size = choose_buffer_size(supported.buffer_size().clone());
    let mut config = supported.config();
    config.buffer_size = buffer_size;
    tracing::info!(
        sample_rate = config.sample_rate.0,
        "preferred sample rate unavailable, using device default"
    );
    Ok((device, config, sample_format))
}

fn choose_buffer_size(supported: SupportedBufferSize) -> BufferSize {
    match supported {
        SupportedBufferSize::Range { min, max } => {
            BufferSize::Fixed(HOST_BUFFER_FRAMES.clamp(min, max))
        }
        SupportedBufferSize::Unknown => BufferSize::Fixed(HOST_BUFFER_FRAMES),
    }
}

/// Build an output stream for the given sample type
fn build_stream<T, R>(
    device: cpal::Device,
    config: StreamConfig,
    mut buffer: HostBuffer<R>,
) -> anyhow::Result<cpal::Stream>
where
    T: Sample + SizedSample + FromSample<f32>,
    R: AudioRenderer,
{
    let channels = config.channels as usize;
    let mut error_reported = false;

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [T], _| {
                if let Err(err) = process_callback(data, channels, &mut buffer) {
                    if !error_reported {
                        tracing::error!("audio callback error: {err}");
                        error_reported = true;
                    }
                }
            },
            move |err| {
                tracing::error!("stream error: {err}");
            },
            None,
        )
        .context("failed to build stream")?;

    Ok(stream)
}

/// Fill a cpal callback from the carry buffer, rendering fresh engine
/// blocks as it runs dry. The engine always sees fixed-size blocks while
/// cpal may ask for any number of frames.
fn process_callback<T, R>(
    output: &mut [T],
    channels: usize,
    buffer: &mut HostBuffer<R>,
) -> Result<(), &'static str>
where
    T: Sample + FromSample<f32>,
    R: AudioRenderer,
{
    if channels == 0 {
        return Err("no output channels available");
    }
    if output.len() % channels != 0 {
        return Err("output buffer length not divisible by channel count");
    }

    let total_frames = output.len() / channels;
    let mut frames_written = 0;

    while frames_written < total_frames {
        if buffer.carry_available == 0 {
            buffer.carry_left.fill(0.0);
            buffer.carry_right.fill(0.0);
            buffer
                .renderer
                .process_block(&mut buffer.carry_left, &mut buffer.carry_right);
            buffer.carry_index = 0;
            buffer.carry_available = buffer.engine_block_size;
            continue;
        }

        let frames_to_copy = (total_frames - frames_written).min(buffer.carry_available);
        for i in 0..frames_to_copy {
            let output_pos = (frames_written + i) * channels;
            let carry_pos = buffer.carry_index + i;

            for ch in 0..channels {
                let value = match ch {
                    0 => buffer.carry_left[carry_pos],
                    1 => buffer.carry_right[carry_pos],
                    _ => 0.0,
                };
                output[output_pos + ch] = T::from_sample_(value);
            }
        }

        frames_written += frames_to_copy;
        buffer.carry_index += frames_to_copy;
        buffer.carry_available -= frames_to_copy;
    }

    Ok(())
}
