//! Playback-related type definitions
//!
//! Supporting types for transport state and content categories.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    #[default]
    Stopped,
}

impl PlaybackState {
    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Content channel, each bound to one looping audio asset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    WhiteNoise,
    Nature,
    Rhythm,
}

impl Category {
    /// All categories in tab order
    pub const ALL: [Category; 3] = [Category::WhiteNoise, Category::Nature, Category::Rhythm];

    /// File stem of the asset bound to this category
    pub fn asset_stem(self) -> &'static str {
        match self {
            Category::WhiteNoise => "white_noise",
            Category::Nature => "nature_sounds",
            Category::Rhythm => "rhythm_beat",
        }
    }

    /// Display title
    pub fn title(self) -> &'static str {
        match self {
            Category::WhiteNoise => "White Noise",
            Category::Nature => "Nature",
            Category::Rhythm => "Rhythm",
        }
    }

    /// Tab index (0-based)
    pub fn index(self) -> usize {
        match self {
            Category::WhiteNoise => 0,
            Category::Nature => 1,
            Category::Rhythm => 2,
        }
    }

    /// Category for a tab index, None when out of range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::WhiteNoise => write!(f, "white_noise"),
            Category::Nature => write!(f, "nature"),
            Category::Rhythm => write!(f, "rhythm"),
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts the display name, the asset stem, kebab-case, or a tab index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");

        if let Ok(index) = normalized.parse::<usize>() {
            return Category::from_index(index)
                .ok_or_else(|| Error::InvalidInput(format!("No category at index {}", index)));
        }

        Category::ALL
            .into_iter()
            .find(|c| c.to_string() == normalized || c.asset_stem() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown category: {}", s)))
    }
}
