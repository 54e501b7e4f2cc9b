//! Core audio data types
//!
//! Defines the decoded-audio container and the stereo frame passed from the
//! looping track to the output device.

/// Decoded audio ready for looping playback.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Mono sources are duplicated to both channels at decode time
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// PCM audio samples (interleaved stereo)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of stereo frames
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }

    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frame_count() as u64 * 1000) / self.sample_rate as u64
    }

    /// Get audio frame at specific frame index
    pub fn frame(&self, frame_index: usize) -> Option<AudioFrame> {
        let sample_index = frame_index * 2;
        if sample_index + 1 < self.samples.len() {
            Some(AudioFrame {
                left: self.samples[sample_index],
                right: self.samples[sample_index + 1],
            })
        } else {
            None
        }
    }

    /// True when there is nothing to loop
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

/// AudioFrame represents a single stereo sample (one frame of audio).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame {
            left: 0.0,
            right: 0.0,
        }
    }

    /// Create a frame from left and right samples
    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Clamp samples to valid range [-1.0, 1.0] to prevent clipping
    pub fn clamped(self) -> Self {
        AudioFrame {
            left: self.left.clamp(-1.0, 1.0),
            right: self.right.clamp(-1.0, 1.0),
        }
    }
}
