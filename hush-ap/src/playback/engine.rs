//! Playback engine: one looping source, transport, category and loudness
//!
//! **Responsibilities:**
//! - Own the single loaded source for the current category
//! - Transport control (toggle, stop, ambient reset)
//! - Category switching with background loading
//! - Loudness metering loop while playing
//!
//! **Concurrency:**
//! State lives behind a short-held `std::sync::Mutex` that is never held
//! across an `.await`. Loads run on the blocking pool and are tagged with a
//! load generation; every command that can supersede a load bumps it, and a
//! load that lands with a stale generation is dropped. The metering loop is
//! tagged with an epoch so a tick racing a stop cannot publish after
//! loudness was reset to 0.

use crate::audio::source::{AudioSource, SourceLoader};
use crate::error::Error;
use crate::playback::meter::loudness_from_power_db;
use crate::playback::ticker::PeriodicTask;
use hush_common::time;
use hush_common::{Category, EventBus, HushEvent, PlaybackState};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

/// Default metering frequency (display refresh rate)
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Accepted metering frequencies
pub const REFRESH_HZ_RANGE: std::ops::RangeInclusive<u32> = 1..=240;

/// Result of a category switch or load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Requested category was already current; nothing reloaded
    Unchanged,
    /// New source installed (and playing if playback was active)
    Loaded,
    /// A later command superseded this load; result discarded
    Superseded,
    /// Asset missing or undecodable; engine left stopped
    Unavailable,
}

/// Engine construction options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub initial_category: Category,
    /// Metering frequency in Hz, clamped to [`REFRESH_HZ_RANGE`]
    pub refresh_hz: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            initial_category: Category::default(),
            refresh_hz: DEFAULT_REFRESH_HZ,
        }
    }
}

impl EngineOptions {
    pub fn meter_period(&self) -> Duration {
        let hz = self
            .refresh_hz
            .clamp(*REFRESH_HZ_RANGE.start(), *REFRESH_HZ_RANGE.end());
        Duration::from_nanos(1_000_000_000 / hz as u64)
    }
}

struct EngineState {
    category: Category,
    playback: PlaybackState,
    source: Option<Arc<dyn AudioSource>>,
    /// Play was requested while no source was installed yet
    play_requested: bool,
    load_generation: u64,
    meter: Option<PeriodicTask>,
    meter_epoch: u64,
}

struct EngineShared {
    loader: Arc<dyn SourceLoader>,
    state: Mutex<EngineState>,
    events: Arc<EventBus>,
    playing_tx: watch::Sender<bool>,
    loudness_tx: watch::Sender<f32>,
    category_tx: watch::Sender<Category>,
    meter_period: Duration,
}

/// Handle to the playback engine. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct PlaybackEngine {
    shared: Arc<EngineShared>,
}

impl PlaybackEngine {
    pub fn new(
        loader: Arc<dyn SourceLoader>,
        events: Arc<EventBus>,
        options: EngineOptions,
    ) -> Self {
        let (playing_tx, _) = watch::channel(false);
        let (loudness_tx, _) = watch::channel(0.0f32);
        let (category_tx, _) = watch::channel(options.initial_category);

        info!(
            "Playback engine created (category={}, meter period={:?})",
            options.initial_category,
            options.meter_period()
        );

        Self {
            shared: Arc::new(EngineShared {
                loader,
                state: Mutex::new(EngineState {
                    category: options.initial_category,
                    playback: PlaybackState::Stopped,
                    source: None,
                    play_requested: false,
                    load_generation: 0,
                    meter: None,
                    meter_epoch: 0,
                }),
                events,
                playing_tx,
                loudness_tx,
                category_tx,
                meter_period: options.meter_period(),
            }),
        }
    }

    /// Switch to `category`, loading its asset in the background.
    ///
    /// Selecting the current category is a no-op. Playback that was active
    /// continues with the new source once it is installed.
    pub async fn select_category(&self, category: Category) -> LoadOutcome {
        self.shared.select_category(category).await
    }

    /// Flip the transport. Returns the resulting state.
    ///
    /// A play request still waiting for its source counts as playing, so a
    /// second toggle withdraws it.
    pub async fn toggle_playback(&self) -> PlaybackState {
        let stopped = {
            let mut st = self.shared.lock_state();
            if st.playback.is_playing() {
                st.load_generation += 1;
                self.shared.stop_locked(&mut st);
                true
            } else if st.play_requested {
                st.load_generation += 1;
                st.play_requested = false;
                debug!("Pending play request withdrawn");
                true
            } else {
                false
            }
        };

        if stopped {
            PlaybackState::Stopped
        } else {
            self.shared.ensure_playing().await
        }
    }

    /// Stop playback if playing. Returns true if playback was stopped.
    ///
    /// Also supersedes any load in flight and withdraws a pending play
    /// request, so nothing can restart playback.
    pub fn stop(&self) -> bool {
        let mut st = self.shared.lock_state();
        st.load_generation += 1;
        st.play_requested = false;
        if !st.playback.is_playing() {
            return false;
        }
        self.shared.stop_locked(&mut st);
        true
    }

    /// Re-announce the playing state so dependent visuals restart.
    ///
    /// When stopped, playback is started through the normal transport path
    /// first, so the engine never reports playing without a playing source.
    pub async fn reset_ambient(&self) -> PlaybackState {
        let state = if self.is_playing() {
            PlaybackState::Playing
        } else {
            self.shared.ensure_playing().await
        };

        if state.is_playing() {
            self.shared.playing_tx.send_replace(true);
            self.shared.events.emit(HushEvent::AmbientReset {
                timestamp: time::now(),
            });
            debug!("Ambient reset announced");
        }
        state
    }

    pub fn current_category(&self) -> Category {
        self.shared.lock_state().category
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.shared.lock_state().playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state().is_playing()
    }

    /// True while a play request waits for its source to load
    pub fn is_play_pending(&self) -> bool {
        self.shared.lock_state().play_requested
    }

    /// Latest published loudness in [0, 1]
    pub fn loudness(&self) -> f32 {
        *self.shared.loudness_tx.borrow()
    }

    /// True while a source for the current category is installed
    pub fn has_source(&self) -> bool {
        self.shared.lock_state().source.is_some()
    }

    /// True while the metering loop is running
    pub fn is_metering(&self) -> bool {
        self.shared
            .lock_state()
            .meter
            .as_ref()
            .is_some_and(|meter| !meter.is_finished())
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.shared.events
    }

    /// Ordered stream of all future engine and countdown events
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<HushEvent> {
        self.shared.events.subscribe()
    }

    pub fn watch_playing(&self) -> watch::Receiver<bool> {
        self.shared.playing_tx.subscribe()
    }

    /// Loudness samples; intermediate values coalesce
    pub fn watch_loudness(&self) -> watch::Receiver<f32> {
        self.shared.loudness_tx.subscribe()
    }

    pub fn watch_category(&self) -> watch::Receiver<Category> {
        self.shared.category_tx.subscribe()
    }
}

impl EngineShared {
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn select_category(self: &Arc<Self>, category: Category) -> LoadOutcome {
        let (generation, released) = {
            let mut st = self.lock_state();
            if st.category == category {
                debug!("Category {} already selected", category);
                return LoadOutcome::Unchanged;
            }

            let old_category = st.category;
            st.category = category;
            st.load_generation += 1;

            self.category_tx.send_replace(category);
            self.events.emit(HushEvent::CategoryChanged {
                old_category,
                new_category: category,
                timestamp: time::now(),
            });
            info!("Category changed: {} -> {}", old_category, category);

            (st.load_generation, st.source.take())
        };
        drop(released);

        self.load(category, generation).await
    }

    /// Start playback, lazily loading the current category if needed.
    ///
    /// The request survives a category switch made while loading: whichever
    /// load lands current starts playback.
    async fn ensure_playing(self: &Arc<Self>) -> PlaybackState {
        let (category, generation) = {
            let mut st = self.lock_state();
            if st.playback.is_playing() {
                return PlaybackState::Playing;
            }
            st.load_generation += 1;
            if st.source.is_some() {
                self.start_locked(&mut st);
                return PlaybackState::Playing;
            }
            st.play_requested = true;
            (st.category, st.load_generation)
        };

        self.load(category, generation).await;
        self.lock_state().playback
    }

    /// Open `category` off the async runtime and install it if still current.
    async fn load(self: &Arc<Self>, category: Category, generation: u64) -> LoadOutcome {
        debug!("Loading {} (generation {})", category, generation);

        let loader = Arc::clone(&self.loader);
        let result = tokio::task::spawn_blocking(move || loader.open(category))
            .await
            .map_err(|e| Error::Internal(format!("Load task failed: {}", e)))
            .and_then(|opened| opened);

        let mut st = self.lock_state();
        if st.load_generation != generation {
            debug!("Discarding superseded load of {}", category);
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(source) => {
                let resume = st.playback.is_playing();
                if resume {
                    source.play();
                }
                st.source = Some(source);
                if !resume && st.play_requested {
                    self.start_locked(&mut st);
                }
                debug!("Installed source for {}", category);
                LoadOutcome::Loaded
            }
            Err(e) => {
                warn!("Source unavailable for {}: {}", category, e);
                st.play_requested = false;
                if st.playback.is_playing() {
                    self.stop_locked(&mut st);
                }
                let reason = match e {
                    Error::SourceUnavailable { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.events.emit(HushEvent::SourceUnavailable {
                    category,
                    reason,
                    timestamp: time::now(),
                });
                LoadOutcome::Unavailable
            }
        }
    }

    fn start_locked(self: &Arc<Self>, st: &mut EngineState) {
        st.play_requested = false;
        if let Some(source) = st.source.as_ref() {
            source.play();
        }

        let old_state = st.playback;
        st.playback = PlaybackState::Playing;
        self.playing_tx.send_replace(true);
        self.events.emit(HushEvent::PlaybackStateChanged {
            old_state,
            new_state: PlaybackState::Playing,
            timestamp: time::now(),
        });

        st.meter_epoch += 1;
        let epoch = st.meter_epoch;
        let engine = Arc::downgrade(self);
        st.meter = Some(PeriodicTask::spawn(
            "loudness meter",
            self.meter_period,
            move || sample_tick(&engine, epoch),
        ));

        info!("Playback started ({})", st.category);
    }

    fn stop_locked(&self, st: &mut EngineState) {
        st.play_requested = false;
        if let Some(source) = st.source.as_ref() {
            source.pause();
        }

        st.meter_epoch += 1;
        if let Some(meter) = st.meter.take() {
            meter.cancel();
        }

        let old_state = st.playback;
        st.playback = PlaybackState::Stopped;
        self.loudness_tx.send_replace(0.0);
        self.playing_tx.send_replace(false);
        self.events.emit(HushEvent::PlaybackStateChanged {
            old_state,
            new_state: PlaybackState::Stopped,
            timestamp: time::now(),
        });

        info!("Playback stopped ({})", st.category);
    }

    /// One metering tick. Breaks the loop once its epoch is over.
    fn sample_loudness(&self, epoch: u64) -> ControlFlow<()> {
        let st = self.lock_state();
        if st.meter_epoch != epoch || !st.playback.is_playing() {
            return ControlFlow::Break(());
        }

        // Mid-switch: hold the last published value
        let Some(source) = st.source.as_ref() else {
            return ControlFlow::Continue(());
        };

        let level = loudness_from_power_db(source.average_power_db());
        self.loudness_tx.send_if_modified(|current| {
            if *current == level {
                false
            } else {
                *current = level;
                true
            }
        });
        trace!("Loudness sample: {:.3}", level);

        ControlFlow::Continue(())
    }
}

fn sample_tick(engine: &Weak<EngineShared>, epoch: u64) -> ControlFlow<()> {
    match engine.upgrade() {
        Some(shared) => shared.sample_loudness(epoch),
        None => ControlFlow::Break(()),
    }
}
