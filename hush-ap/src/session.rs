//! Application session: owns the engine and the sleep timer
//!
//! One `AppSession` is constructed per run and hands out `Arc` handles to
//! its components; there are no global instances.

use crate::audio::source::SourceLoader;
use crate::config::Config;
use crate::playback::countdown::{CountdownScheduler, PlaybackStop, DEFAULT_TICK};
use crate::playback::engine::{EngineOptions, PlaybackEngine};
use crate::playback::ticker::PeriodicTask;
use hush_common::{EventBus, HushEvent, PlaybackState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub engine: EngineOptions,
    pub countdown_tick: Duration,
    /// Start playback this long after `start()` if still stopped
    pub autostart_delay: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            engine: EngineOptions::default(),
            countdown_tick: DEFAULT_TICK,
            autostart_delay: None,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            engine: EngineOptions {
                initial_category: config.initial_category,
                refresh_hz: config.refresh_hz,
            },
            countdown_tick: config.countdown_tick,
            autostart_delay: config.autostart_delay,
        }
    }
}

#[derive(Default)]
struct SessionTasks {
    ticker: Option<PeriodicTask>,
    autostart: Option<JoinHandle<()>>,
}

pub struct AppSession {
    events: Arc<EventBus>,
    engine: Arc<PlaybackEngine>,
    countdown: Arc<CountdownScheduler>,
    options: SessionOptions,
    tasks: Mutex<SessionTasks>,
}

impl AppSession {
    pub fn new(loader: Arc<dyn SourceLoader>, options: SessionOptions) -> Self {
        let events = Arc::new(EventBus::new());
        let engine = Arc::new(PlaybackEngine::new(
            loader,
            Arc::clone(&events),
            options.engine.clone(),
        ));
        let stopper: Arc<dyn PlaybackStop> = engine.clone();
        let countdown = Arc::new(CountdownScheduler::new(stopper, Arc::clone(&events)));

        Self {
            events,
            engine,
            countdown,
            options,
            tasks: Mutex::new(SessionTasks::default()),
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, SessionTasks> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    pub fn countdown(&self) -> &Arc<CountdownScheduler> {
        &self.countdown
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<HushEvent> {
        self.events.subscribe()
    }

    /// Spawn the countdown ticker and the optional autostart.
    ///
    /// Must be called from within a tokio runtime. Calling it again while
    /// running has no effect.
    pub fn start(&self) {
        let mut tasks = self.lock_tasks();
        if tasks.ticker.is_some() {
            debug!("Session already started");
            return;
        }

        tasks.ticker = Some(self.countdown.spawn_ticker(self.options.countdown_tick));

        if let Some(delay) = self.options.autostart_delay {
            let engine = Arc::clone(&self.engine);
            tasks.autostart = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if !engine.is_playing() && !engine.is_play_pending() {
                    info!("Autostarting playback");
                    engine.toggle_playback().await;
                }
            }));
        }

        info!("Session started");
    }

    /// Clear the sleep timer and re-announce (or start) playback
    pub async fn reset_playback(&self) -> PlaybackState {
        self.countdown.cancel();
        self.engine.reset_ambient().await
    }

    /// Cancel background tasks and stop playback
    pub fn shutdown(&self) {
        {
            let mut tasks = self.lock_tasks();
            if let Some(ticker) = tasks.ticker.take() {
                ticker.cancel();
            }
            if let Some(autostart) = tasks.autostart.take() {
                autostart.abort();
            }
        }
        self.engine.stop();
        info!("Session shut down");
    }
}

impl Drop for AppSession {
    fn drop(&mut self) {
        if let Some(autostart) = self.lock_tasks().autostart.take() {
            autostart.abort();
        }
    }
}
