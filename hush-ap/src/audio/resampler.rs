//! Audio resampling using rubato
//!
//! Converts a decoded loop to the output device's sample rate once, at load
//! time, so the render callback only has to copy frames.

use crate::audio::types::DecodedAudio;
use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

const STEREO: usize = 2;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample decoded stereo audio to `output_rate`.
    ///
    /// Returns the input unchanged when it is already at the target rate.
    pub fn resample(audio: DecodedAudio, output_rate: u32) -> Result<DecodedAudio> {
        if audio.sample_rate == output_rate || audio.is_empty() {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(audio);
        }

        debug!(
            "Resampling from {}Hz to {}Hz",
            audio.sample_rate, output_rate
        );

        // De-interleave samples for rubato (which expects planar format)
        let planar_input = Self::deinterleave(&audio.samples);
        let input_frames = planar_input[0].len();

        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / audio.sample_rate as f64,
            1.0, // max_relative_ratio (no runtime changes)
            PolynomialDegree::Septic,
            input_frames,
            STEREO,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        let resampled = DecodedAudio::new(Self::interleave(planar_output), output_rate);
        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames,
            resampled.frame_count()
        );

        Ok(resampled)
    }

    /// Input:  [L, R, L, R, ...]
    /// Output: [[L, L, ...], [R, R, ...]]
    fn deinterleave(samples: &[f32]) -> Vec<Vec<f32>> {
        let num_frames = samples.len() / STEREO;
        let mut planar = vec![Vec::with_capacity(num_frames); STEREO];

        for frame in samples.chunks_exact(STEREO) {
            planar[0].push(frame[0]);
            planar[1].push(frame[1]);
        }

        planar
    }

    /// Input:  [[L, L, ...], [R, R, ...]]
    /// Output: [L, R, L, R, ...]
    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        match planar.as_slice() {
            [left, right] => left
                .iter()
                .zip(right.iter())
                .flat_map(|(&l, &r)| [l, r])
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let planar = Resampler::deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_interleave() {
        let interleaved = Resampler::interleave(vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_interleave_empty() {
        assert_eq!(Resampler::interleave(Vec::new()), Vec::<f32>::new());
    }

    #[test]
    fn test_resample_same_rate() {
        let input = DecodedAudio::new(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 44100);
        let output = Resampler::resample(input.clone(), 44100).unwrap();

        assert_eq!(output.samples, input.samples);
        assert_eq!(output.sample_rate, 44100);
    }

    #[test]
    fn test_resample_different_rate() {
        let input_rate = 48000;
        let duration_frames = 1000;

        let mut samples = Vec::with_capacity(duration_frames * 2);
        for i in 0..duration_frames {
            let t = i as f32 / input_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            samples.push(sample);
            samples.push(sample);
        }

        let output = Resampler::resample(DecodedAudio::new(samples, input_rate), 44100).unwrap();

        let expected_frames = (duration_frames as f64 * 44100.0 / input_rate as f64) as usize;
        let output_frames = output.frame_count();

        // Allow some variance due to resampler internals
        assert!(
            output_frames >= expected_frames - 10 && output_frames <= expected_frames + 10,
            "Expected ~{} frames, got {}",
            expected_frames,
            output_frames
        );
        assert_eq!(output.sample_rate, 44100);
    }
}
