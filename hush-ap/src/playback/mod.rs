//! Playback engine, loudness metering and the sleep timer

pub mod countdown;
pub mod engine;
pub mod meter;
pub mod ticker;

pub use countdown::{CountdownScheduler, CountdownSnapshot, PlaybackStop};
pub use engine::{EngineOptions, LoadOutcome, PlaybackEngine};
pub use ticker::PeriodicTask;
