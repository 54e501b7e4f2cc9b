//! Audio output using cpal
//!
//! Opens the output device and drives a block-based render callback from the
//! device's real-time thread. `cpal::Stream` is not `Send`, so an
//! `AudioOutput` must live and die on the thread that created it (see
//! [`crate::audio::sink`]).

use crate::audio::AudioFrame;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Preferred device rate; assets are resampled to whatever the device accepts
const PREFERRED_SAMPLE_RATE: u32 = 44100;

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    /// Stream errors reported by the device since the stream was built
    error_count: Arc<AtomicU32>,
}

impl AudioOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an output device (None = system default).
    ///
    /// A named device that cannot be found falls back to the default device.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices = host.output_devices().map_err(|e| {
                    Error::AudioOutput(format!("Failed to enumerate devices: {}", e))
                })?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("Found requested audio device: {}", name);
                        dev
                    }
                    None => {
                        warn!(
                            "Requested device '{}' not found, falling back to default device",
                            name
                        );
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "Device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?,
        };

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let (config, sample_format) = Self::get_best_config(&device)?;
        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            error_count: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Prefer 44.1kHz stereo f32, else take the device default.
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs.find(|config| {
            config.channels() == 2
                && config.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
                && config.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config
                .with_sample_rate(cpal::SampleRate(PREFERRED_SAMPLE_RATE))
                .config();
            return Ok((config, sample_format));
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

        let sample_format = supported_config.sample_format();
        Ok((supported_config.config(), sample_format))
    }

    /// Start the stream. `render` fills one block of stereo frames per call.
    ///
    /// The callback runs on the device's real-time thread and must not block.
    pub fn start<F>(&mut self, render: F) -> Result<()>
    where
        F: FnMut(&mut [AudioFrame]) + Send + 'static,
    {
        info!("Starting audio stream");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32, F>(render)?,
            SampleFormat::I16 => self.build_stream::<i16, F>(render)?,
            SampleFormat::U16 => self.build_stream::<u16, F>(render)?,
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        info!("Audio stream started successfully");
        Ok(())
    }

    fn build_stream<T, F>(&self, mut render: F) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
        F: FnMut(&mut [AudioFrame]) + Send + 'static,
    {
        let channels = self.config.channels as usize;
        let error_count = Arc::clone(&self.error_count);
        let mut block: Vec<AudioFrame> = Vec::new();

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels.max(1);
                    // Grows only when the device asks for a larger block
                    block.resize(frames, AudioFrame::zero());
                    render(&mut block);

                    for (out, frame) in data.chunks_mut(channels).zip(block.iter()) {
                        let frame = frame.clamped();
                        out[0] = T::from_sample(frame.left);
                        if channels > 1 {
                            out[1] = T::from_sample(frame.right);
                        }
                        for extra in out.iter_mut().skip(2) {
                            *extra = T::EQUILIBRIUM;
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_count.fetch_add(1, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    /// Pause and drop the stream.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
        }
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Stream errors reported since the stream was built
    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::SeqCst)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        // Depends on audio hardware; only verify it doesn't panic
        let _ = AudioOutput::list_devices();
    }

    #[test]
    fn test_sample_conversion_extremes() {
        assert_eq!(i16::from_sample(0.0f32), 0);
        assert_eq!(u16::from_sample(0.0f32), 32768);
        assert!(i16::from_sample(1.0f32) >= i16::MAX - 1);
    }
}
