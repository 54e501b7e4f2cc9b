//! Playable sources and the loader that opens them per category
//!
//! The engine only talks to the [`AudioSource`] and [`SourceLoader`] traits,
//! so tests can script loads and power readings without touching files or
//! devices.

use crate::audio::decoder::SimpleDecoder;
use crate::audio::resampler::Resampler;
use crate::audio::sink::{Deck, OutputSink};
use crate::audio::track::LoopTrack;
use crate::error::{Error, Result};
use hush_common::Category;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Extensions tried, in order, when resolving a category's asset
pub const ASSET_EXTENSIONS: [&str; 5] = ["mp3", "m4a", "flac", "ogg", "wav"];

/// An opened, looping audio source for one category.
///
/// Dropping the source releases it (detaches it from the output).
pub trait AudioSource: Send + Sync {
    fn category(&self) -> Category;

    fn play(&self);

    fn pause(&self);

    fn is_playing(&self) -> bool;

    /// Average signal power of the most recent render window in dBFS.
    ///
    /// `None` when no reading is available (paused, not yet rendered).
    fn average_power_db(&self) -> Option<f32>;
}

/// Resolves and opens sources. Called from a blocking task.
pub trait SourceLoader: Send + Sync {
    fn open(&self, category: Category) -> Result<Arc<dyn AudioSource>>;
}

/// Source backed by a decoded [`LoopTrack`] attached to an output deck
pub struct LoopingSource {
    track: Arc<LoopTrack>,
    deck: Arc<Deck>,
}

impl LoopingSource {
    pub fn new(track: Arc<LoopTrack>, deck: Arc<Deck>) -> Self {
        Self { track, deck }
    }

    pub fn track(&self) -> &Arc<LoopTrack> {
        &self.track
    }
}

impl AudioSource for LoopingSource {
    fn category(&self) -> Category {
        self.track.category()
    }

    fn play(&self) {
        if !self.deck.is_attached(&self.track) {
            self.deck.attach(Arc::clone(&self.track));
        }
        self.track.set_playing(true);
    }

    fn pause(&self) {
        self.track.set_playing(false);
    }

    fn is_playing(&self) -> bool {
        self.track.is_playing()
    }

    fn average_power_db(&self) -> Option<f32> {
        self.track.average_power_db()
    }
}

impl Drop for LoopingSource {
    fn drop(&mut self) {
        self.track.set_playing(false);
        self.deck.detach(&self.track);
    }
}

/// Opens category assets from a folder and plays them through a sink
pub struct AssetLoader {
    asset_dir: PathBuf,
    sink: Arc<OutputSink>,
}

impl AssetLoader {
    pub fn new(asset_dir: impl Into<PathBuf>, sink: Arc<OutputSink>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            sink,
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// First existing `<stem>.<ext>` for the category, if any
    pub fn resolve(&self, category: Category) -> Option<PathBuf> {
        resolve_asset(&self.asset_dir, category)
    }
}

/// Find a category's asset in `dir`, trying [`ASSET_EXTENSIONS`] in order
pub fn resolve_asset(dir: &Path, category: Category) -> Option<PathBuf> {
    ASSET_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", category.asset_stem(), ext)))
        .find(|path| path.is_file())
}

impl SourceLoader for AssetLoader {
    fn open(&self, category: Category) -> Result<Arc<dyn AudioSource>> {
        let path = self.resolve(category).ok_or_else(|| {
            Error::source_unavailable(
                category,
                format!(
                    "no '{}' asset in {}",
                    category.asset_stem(),
                    self.asset_dir.display()
                ),
            )
        })?;

        debug!("Opening {} asset: {}", category, path.display());

        let decoded =
            SimpleDecoder::decode_file(&path).map_err(|e| Error::source_unavailable(category, e))?;
        if decoded.is_empty() {
            return Err(Error::source_unavailable(category, "asset contains no audio"));
        }

        let audio = Resampler::resample(decoded, self.sink.sample_rate())
            .map_err(|e| Error::source_unavailable(category, e))?;

        info!(
            "Loaded {} ({} frames, {}ms)",
            category,
            audio.frame_count(),
            audio.duration_ms()
        );

        let track = Arc::new(LoopTrack::new(category, audio));
        Ok(Arc::new(LoopingSource::new(
            track,
            Arc::clone(self.sink.deck()),
        )))
    }
}
