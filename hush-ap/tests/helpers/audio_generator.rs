//! Asset fixture generation
//!
//! Writes small 16-bit WAV loops with known power so decoding, looping and
//! metering can be checked end to end.

use hound::{WavSpec, WavWriter};
use hush_common::Category;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Standard test sample rate (44.1 kHz)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// Generate silent stereo WAV file
pub fn generate_silent_wav<P: AsRef<Path>>(path: P, duration_ms: u64) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;
    for _ in 0..total_frames * 2 {
        writer.write_sample(0i16)?;
    }

    writer.finalize()
}

/// Generate a sine wave WAV file
///
/// `amplitude` is 0.0-1.0; a sine of amplitude A has mean square A²/2.
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let total_frames = (sample_rate as u64 * duration_ms) / 1000;

    for frame in 0..total_frames {
        let t = frame as f32 / sample_rate as f32;
        let value = (2.0 * PI * frequency_hz * t).sin() * amplitude;
        let sample = (value * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()
}

/// Path of a category's WAV asset inside `dir`
pub fn asset_path(dir: &Path, category: Category) -> PathBuf {
    dir.join(format!("{}.wav", category.asset_stem()))
}

/// Write a one-second stereo 440 Hz tone asset for `category`
pub fn write_tone_asset(dir: &Path, category: Category, amplitude: f32) -> PathBuf {
    let path = asset_path(dir, category);
    generate_sine_wav(&path, TEST_SAMPLE_RATE, 2, 1000, 440.0, amplitude)
        .expect("write tone asset");
    path
}

/// Write a one-second silent asset for `category`
pub fn write_silent_asset(dir: &Path, category: Category) -> PathBuf {
    let path = asset_path(dir, category);
    generate_silent_wav(&path, 1000).expect("write silent asset");
    path
}
