//! Endlessly looping track with render-side power metering
//!
//! A `LoopTrack` is the playable form of one category's asset. The output
//! thread pulls frames from it in blocks; while it renders, the track
//! measures the mean-square power of channel 0 over short windows and
//! publishes the latest window through an atomic so the metering loop can
//! read it from any thread without locking the render path.

use crate::audio::types::{AudioFrame, DecodedAudio};
use hush_common::Category;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, TryLockError};

/// Power reported for a window of digital silence (dBFS)
pub const SILENCE_DB: f32 = -160.0;

/// Length of one metering window in milliseconds
const METER_WINDOW_MS: u32 = 20;

/// Accumulator for the window currently being rendered
#[derive(Debug)]
struct PowerWindow {
    sum_squares: f64,
    frames: usize,
    window_frames: usize,
}

impl PowerWindow {
    fn new(sample_rate: u32) -> Self {
        Self {
            sum_squares: 0.0,
            frames: 0,
            window_frames: ((sample_rate * METER_WINDOW_MS) / 1000).max(1) as usize,
        }
    }

    /// Add one sample; returns the window's mean square when it completes
    fn push(&mut self, sample: f32) -> Option<f32> {
        self.sum_squares += (sample as f64) * (sample as f64);
        self.frames += 1;
        if self.frames < self.window_frames {
            return None;
        }
        let mean_square = (self.sum_squares / self.frames as f64) as f32;
        self.sum_squares = 0.0;
        self.frames = 0;
        Some(mean_square)
    }

    fn clear(&mut self) {
        self.sum_squares = 0.0;
        self.frames = 0;
    }
}

/// Decoded loop plus its playhead and power meter
#[derive(Debug)]
pub struct LoopTrack {
    category: Category,
    audio: DecodedAudio,
    /// Next frame to render
    cursor: AtomicUsize,
    playing: AtomicBool,
    window: Mutex<PowerWindow>,
    /// f32 bits of the last completed window's mean square
    last_mean_square: AtomicU32,
    has_reading: AtomicBool,
}

impl LoopTrack {
    /// Wrap decoded audio. The audio must contain at least one frame.
    pub fn new(category: Category, audio: DecodedAudio) -> Self {
        let window = PowerWindow::new(audio.sample_rate);
        Self {
            category,
            audio,
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            window: Mutex::new(window),
            last_mean_square: AtomicU32::new(0.0f32.to_bits()),
            has_reading: AtomicBool::new(false),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    pub fn frame_count(&self) -> usize {
        self.audio.frame_count()
    }

    /// Current playhead position in frames
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Start or stop advancing the playhead.
    ///
    /// Stopping discards any pending or published power reading.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
        if !playing {
            self.has_reading.store(false, Ordering::Release);
            self.window
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    /// Fill `out` with the next frames of the loop, wrapping at the end.
    ///
    /// Outputs silence (and leaves the playhead untouched) while stopped.
    /// Never blocks: if the meter window is contended the block plays
    /// unmetered.
    pub fn render(&self, out: &mut [AudioFrame]) {
        let frame_count = self.audio.frame_count();
        if !self.is_playing() || frame_count == 0 {
            out.fill(AudioFrame::zero());
            return;
        }

        let mut window = match self.window.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        let mut cursor = self.cursor.load(Ordering::Acquire);

        for slot in out.iter_mut() {
            let frame = self.audio.frame(cursor).unwrap_or_else(AudioFrame::zero);
            *slot = frame;

            if let Some(mean_square) = window.as_mut().and_then(|w| w.push(frame.left)) {
                self.last_mean_square
                    .store(mean_square.to_bits(), Ordering::Release);
                self.has_reading.store(true, Ordering::Release);
            }

            cursor += 1;
            if cursor >= frame_count {
                cursor = 0;
            }
        }

        self.cursor.store(cursor, Ordering::Release);
    }

    /// Average power of channel 0 over the last completed window, in dBFS.
    ///
    /// Returns `None` while stopped or before the first window completes.
    /// Digital silence reports [`SILENCE_DB`].
    pub fn average_power_db(&self) -> Option<f32> {
        if !self.is_playing() || !self.has_reading.load(Ordering::Acquire) {
            return None;
        }

        let mean_square = f32::from_bits(self.last_mean_square.load(Ordering::Acquire));
        if mean_square <= 0.0 || !mean_square.is_finite() {
            return Some(SILENCE_DB);
        }
        Some((10.0 * mean_square.log10()).max(SILENCE_DB))
    }
}
