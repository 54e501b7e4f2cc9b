//! # Hush Common Library
//!
//! Shared code for the Hush sleep-sounds engine including:
//! - Event types (HushEvent enum) and the ordered EventBus
//! - Category and playback state vocabulary
//! - Configuration path and asset folder resolution
//! - Human-readable countdown formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};
pub use events::{Category, EventBus, HushEvent, PlaybackState};
