//! Scripted source loader for engine tests
//!
//! Per category the script decides the power a source reports, whether
//! opening fails, and how long opening blocks. The loader only keeps weak
//! handles, so tests can observe when the engine releases a source.

use hush_ap::audio::{AudioSource, SourceLoader};
use hush_ap::{Error, Result};
use hush_common::Category;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Power reported by sources unless scripted otherwise (loudness 0.5)
pub const DEFAULT_POWER_DB: f32 = -30.0;

pub struct FakeSource {
    category: Category,
    power_db: Mutex<Option<f32>>,
    playing: AtomicBool,
    play_calls: AtomicU32,
}

impl FakeSource {
    fn new(category: Category, power_db: Option<f32>) -> Self {
        Self {
            category,
            power_db: Mutex::new(power_db),
            playing: AtomicBool::new(false),
            play_calls: AtomicU32::new(0),
        }
    }

    pub fn set_power(&self, power_db: Option<f32>) {
        *self.power_db.lock().unwrap() = power_db;
    }

    pub fn play_calls(&self) -> u32 {
        self.play_calls.load(Ordering::SeqCst)
    }
}

impl AudioSource for FakeSource {
    fn category(&self) -> Category {
        self.category
    }

    fn play(&self) {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn average_power_db(&self) -> Option<f32> {
        if self.is_playing() {
            *self.power_db.lock().unwrap()
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct ScriptedLoader {
    power: Mutex<HashMap<Category, Option<f32>>>,
    failing: Mutex<HashSet<Category>>,
    delays: Mutex<HashMap<Category, Duration>>,
    opened: Mutex<Vec<Category>>,
    sources: Mutex<Vec<Weak<FakeSource>>>,
}

impl ScriptedLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_power(&self, category: Category, power_db: Option<f32>) {
        self.power.lock().unwrap().insert(category, power_db);
    }

    pub fn fail(&self, category: Category) {
        self.failing.lock().unwrap().insert(category);
    }

    pub fn succeed(&self, category: Category) {
        self.failing.lock().unwrap().remove(&category);
    }

    pub fn delay(&self, category: Category, delay: Duration) {
        self.delays.lock().unwrap().insert(category, delay);
    }

    /// Number of open attempts for `category`
    pub fn open_count(&self, category: Category) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == category)
            .count()
    }

    /// Most recently opened source for `category`, if still alive
    pub fn last_source(&self, category: Category) -> Option<Arc<FakeSource>> {
        self.sources
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter_map(Weak::upgrade)
            .find(|s| s.category == category)
    }

    /// Sources not yet released by their owner
    pub fn live_sources(&self) -> usize {
        self.sources
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }
}

impl SourceLoader for ScriptedLoader {
    fn open(&self, category: Category) -> Result<Arc<dyn AudioSource>> {
        self.opened.lock().unwrap().push(category);

        let delay = self.delays.lock().unwrap().get(&category).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if self.failing.lock().unwrap().contains(&category) {
            return Err(Error::source_unavailable(category, "scripted failure"));
        }

        let power_db = self
            .power
            .lock()
            .unwrap()
            .get(&category)
            .copied()
            .unwrap_or(Some(DEFAULT_POWER_DB));

        let source = Arc::new(FakeSource::new(category, power_db));
        self.sources.lock().unwrap().push(Arc::downgrade(&source));
        Ok(source)
    }
}
