//! Hardware audio context backed by cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::capture::{capture_ring, CaptureReader, CaptureWriter, CAPTURE_RING_CAPACITY};
use crate::context::{render_slot, AudioContext, ContextState, ProcessorSlot, SharedProcessor};
use crate::error::GraphError;

/// Max buffer size for typical devices: 8192 frames stereo = 16384 floats
const CONVERSION_BUFFER_LEN: usize = 16384;

/// Keeps a live input stream open; dropping it releases the device
pub struct CpalCapture {
    _stream: cpal::Stream,
}

/// Default output device of the default host
///
/// Construction only queries the device. The output stream is built on the
/// first [`AudioContext::resume`] and afterwards only paused and played.
pub struct CpalContext {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
    state: ContextState,
    slot: ProcessorSlot,
}

impl CpalContext {
    pub fn new() -> Result<Self, GraphError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(GraphError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| GraphError::Device(format!("Failed to get audio config: {}", e)))?;

        tracing::info!(
            device = device.name().unwrap_or_default(),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "audio output selected"
        );

        Ok(Self {
            device,
            config: config.into(),
            stream: None,
            state: ContextState::Suspended,
            slot: Arc::new(Mutex::new(None)),
        })
    }

    fn build_stream(&self) -> Result<cpal::Stream, GraphError> {
        let channels = self.config.channels as usize;
        let slot = self.slot.clone();
        // Pre-allocated conversion buffer (avoid allocation in audio callback)
        let mut stereo_buffer = vec![0.0f32; CONVERSION_BUFFER_LEN];

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if channels == 2 {
                        render_slot(&slot, data);
                        return;
                    }
                    downmix_block(&slot, &mut stereo_buffer, data, channels);
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| GraphError::Device(format!("Failed to create audio stream: {}", e)))
    }
}

/// Render into a device block of any channel count via the stereo scratch
///
/// Frames the scratch cannot hold are written as silence.
fn downmix_block(slot: &ProcessorSlot, stereo_buffer: &mut [f32], data: &mut [f32], channels: usize) {
    let channels = channels.max(1);
    let frames = (data.len() / channels).min(stereo_buffer.len() / 2);
    let stereo = &mut stereo_buffer[..frames * 2];
    render_slot(slot, stereo);

    let (head, tail) = data.split_at_mut(frames * channels);
    for (out, frame) in head.chunks_exact_mut(channels).zip(stereo.chunks_exact(2)) {
        if channels == 1 {
            out[0] = (frame[0] + frame[1]) * 0.5;
        } else {
            out[0] = frame[0];
            out[1] = frame[1];
            out[2..].fill(0.0);
        }
    }
    tail.fill(0.0);
}

impl AudioContext for CpalContext {
    type Capture = CpalCapture;

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), GraphError> {
        if self.state == ContextState::Running {
            return Ok(());
        }
        if self.stream.is_none() {
            self.stream = Some(self.build_stream()?);
        }
        if let Some(stream) = &self.stream {
            stream.play().map_err(|e| {
                tracing::warn!("Failed to start audio: {}", e);
                GraphError::PlaybackBlocked
            })?;
        }
        self.state = ContextState::Running;
        tracing::info!("audio context resumed");
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), GraphError> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| GraphError::Device(format!("Failed to pause audio: {}", e)))?;
        }
        self.state = ContextState::Suspended;
        tracing::info!("audio context suspended");
        Ok(())
    }

    fn set_processor(&mut self, processor: Option<SharedProcessor>) {
        *self.slot.lock() = processor;
    }

    fn in_use(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn open_capture(&mut self) -> Result<(CpalCapture, CaptureReader), GraphError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(GraphError::PermissionDenied)?;
        // Prefer capturing at the context rate; otherwise the writer resamples
        let supported = match input_config_at(&device, self.sample_rate()) {
            Some(config) => config,
            None => device.default_input_config().map_err(|e| {
                tracing::warn!("Input device refused: {}", e);
                GraphError::PermissionDenied
            })?,
        };

        let (producer, reader) = capture_ring(CAPTURE_RING_CAPACITY);
        let writer = CaptureWriter::new(producer, supported.sample_rate().0, self.sample_rate())?;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let stream = match format {
            SampleFormat::F32 => build_capture::<f32>(&device, &config, writer),
            SampleFormat::I16 => build_capture::<i16>(&device, &config, writer),
            SampleFormat::U16 => build_capture::<u16>(&device, &config, writer),
            other => Err(GraphError::Device(format!("Unsupported sample format: {}", other))),
        }?;

        stream
            .play()
            .map_err(|e| GraphError::Device(format!("Failed to start capture: {}", e)))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate.0,
            "live capture opened"
        );

        Ok((CpalCapture { _stream: stream }, reader))
    }
}

/// Supported input config running at `rate`, in a sample format we can read
fn input_config_at(device: &cpal::Device, rate: u32) -> Option<cpal::SupportedStreamConfig> {
    device
        .supported_input_configs()
        .ok()?
        .filter(|c| {
            matches!(
                c.sample_format(),
                SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16
            )
        })
        .find(|c| c.min_sample_rate().0 <= rate && rate <= c.max_sample_rate().0)
        .map(|c| c.with_sample_rate(cpal::SampleRate(rate)))
}

fn build_capture<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut writer: CaptureWriter,
) -> Result<cpal::Stream, GraphError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = (config.channels as usize).max(1);
    let scale = 1.0 / channels as f32;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks_exact(channels) {
                    let mono: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum::<f32>() * scale;
                    writer.push(mono);
                }
            },
            |err| {
                tracing::error!("Capture stream error: {}", err);
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => GraphError::PermissionDenied,
            other => GraphError::Device(format!("Failed to create capture stream: {}", other)),
        })
}
