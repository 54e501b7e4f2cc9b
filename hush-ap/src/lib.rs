//! # Hush Audio Player Library (hush-ap)
//!
//! Looping ambient playback with real-time loudness metering and a sleep
//! timer.
//!
//! **Architecture:** symphonia decodes a category's asset once, rubato
//! resamples it to the output rate, and a cpal stream (or a silent
//! real-time render thread) loops it while metering its power. The
//! [`PlaybackEngine`](playback::PlaybackEngine) owns transport, category
//! and loudness; the [`CountdownScheduler`](playback::CountdownScheduler)
//! stops playback when the sleep timer runs out; an
//! [`AppSession`](session::AppSession) owns both.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod session;

pub use error::{Error, Result};
pub use session::{AppSession, SessionOptions};
