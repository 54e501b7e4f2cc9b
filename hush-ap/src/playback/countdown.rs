//! Sleep timer: wall-clock target or fixed duration → one-second countdown
//! → stop playback
//!
//! The scheduler only needs the engine's stop command, expressed as the
//! [`PlaybackStop`] trait, so it can be driven against a fake in tests.

use crate::playback::engine::PlaybackEngine;
use crate::playback::ticker::PeriodicTask;
use chrono::{NaiveTime, Timelike};
use hush_common::human_time::{format_hms, format_sleep_estimate};
use hush_common::{time, EventBus, HushEvent};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

pub const SECONDS_PER_DAY: u32 = 86_400;

/// Default countdown tick period
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Seconds from `now` until the next occurrence of `target`.
///
/// Compared at whole-second precision. A target that is not strictly in
/// the future is taken to mean tomorrow, so the result is in 1..=86400.
pub fn seconds_until(target: NaiveTime, now: NaiveTime) -> u32 {
    let target = target.num_seconds_from_midnight() as i64;
    let now = now.num_seconds_from_midnight() as i64;
    let diff = target - now;
    if diff <= 0 {
        (diff + SECONDS_PER_DAY as i64) as u32
    } else {
        diff as u32
    }
}

/// The stop command issued when the countdown expires
pub trait PlaybackStop: Send + Sync {
    /// Stop playback; returns true if it was playing
    fn stop_playback(&self) -> bool;
}

impl PlaybackStop for PlaybackEngine {
    fn stop_playback(&self) -> bool {
        self.stop()
    }
}

/// Observable countdown state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownSnapshot {
    pub remaining_seconds: u32,
    pub is_active: bool,
}

pub struct CountdownScheduler {
    state: Mutex<CountdownSnapshot>,
    stopper: Arc<dyn PlaybackStop>,
    events: Arc<EventBus>,
    snapshot_tx: watch::Sender<CountdownSnapshot>,
}

impl CountdownScheduler {
    pub fn new(stopper: Arc<dyn PlaybackStop>, events: Arc<EventBus>) -> Self {
        let (snapshot_tx, _) = watch::channel(CountdownSnapshot::default());
        Self {
            state: Mutex::new(CountdownSnapshot::default()),
            stopper,
            events,
            snapshot_tx,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CountdownSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm the timer for the next occurrence of `target` (local time).
    ///
    /// Returns the remaining seconds.
    pub fn start(&self, target: NaiveTime) -> u32 {
        self.start_from(target, time::local_time_of_day())
    }

    /// Arm the timer for `target` as seen from `now`
    pub fn start_from(&self, target: NaiveTime, now: NaiveTime) -> u32 {
        let remaining_seconds = seconds_until(target, now);
        self.arm(remaining_seconds);
        info!(
            "Sleep timer started: {} until {}",
            format_hms(remaining_seconds),
            target.format("%H:%M:%S")
        );
        remaining_seconds
    }

    /// Arm the timer to run for `duration`, rounded up to whole seconds.
    ///
    /// A zero duration leaves the timer untouched and returns 0.
    pub fn start_for(&self, duration: Duration) -> u32 {
        let whole = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        let remaining_seconds = u32::try_from(whole).unwrap_or(u32::MAX);
        if remaining_seconds == 0 {
            debug!("Timer start ignored: zero duration");
            return 0;
        }

        self.arm(remaining_seconds);
        info!("Timer started for {}", format_hms(remaining_seconds));
        remaining_seconds
    }

    /// Arm the timer for a whole number of minutes
    pub fn start_minutes(&self, minutes: u32) -> u32 {
        self.start_for(Duration::from_secs(u64::from(minutes) * 60))
    }

    fn arm(&self, remaining_seconds: u32) {
        let mut st = self.lock_state();
        *st = CountdownSnapshot {
            remaining_seconds,
            is_active: true,
        };
        self.snapshot_tx.send_replace(*st);
        self.events.emit(HushEvent::CountdownStarted {
            remaining_seconds,
            timestamp: time::now(),
        });
    }

    /// Advance one second. At zero the timer deactivates and playback stops.
    pub fn tick(&self) -> CountdownSnapshot {
        let (snapshot, expired) = {
            let mut st = self.lock_state();
            if !st.is_active || st.remaining_seconds == 0 {
                return *st;
            }

            st.remaining_seconds -= 1;
            let expired = st.remaining_seconds == 0;
            if expired {
                st.is_active = false;
            }

            self.snapshot_tx.send_replace(*st);
            self.events.emit(HushEvent::CountdownTick {
                remaining_seconds: st.remaining_seconds,
            });
            if expired {
                self.events.emit(HushEvent::CountdownExpired {
                    timestamp: time::now(),
                });
            }
            (*st, expired)
        };

        if expired {
            let was_playing = self.stopper.stop_playback();
            info!("Sleep timer expired (playback was playing: {})", was_playing);
        }
        snapshot
    }

    /// Pause or resume without touching the remaining time.
    ///
    /// Nothing to resume once the timer reached zero; returns the new
    /// active flag.
    pub fn toggle_active(&self) -> bool {
        let mut st = self.lock_state();
        if st.remaining_seconds == 0 {
            debug!("Sleep timer toggle ignored: nothing remaining");
            return st.is_active;
        }

        st.is_active = !st.is_active;
        self.snapshot_tx.send_replace(*st);
        self.events.emit(HushEvent::CountdownToggled {
            is_active: st.is_active,
            remaining_seconds: st.remaining_seconds,
        });
        info!(
            "Sleep timer {} at {}",
            if st.is_active { "resumed" } else { "paused" },
            format_hms(st.remaining_seconds)
        );
        st.is_active
    }

    /// Clear the timer. Playback is not affected.
    pub fn cancel(&self) {
        let mut st = self.lock_state();
        if *st == CountdownSnapshot::default() {
            return;
        }

        *st = CountdownSnapshot::default();
        self.snapshot_tx.send_replace(*st);
        self.events.emit(HushEvent::CountdownCancelled {
            timestamp: time::now(),
        });
        info!("Sleep timer cancelled");
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.lock_state().remaining_seconds
    }

    pub fn is_active(&self) -> bool {
        self.lock_state().is_active
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        *self.lock_state()
    }

    /// Remaining time as `HH:MM:SS`
    pub fn formatted(&self) -> String {
        format_hms(self.remaining_seconds())
    }

    /// "Xh Ym" preview of how long a timer for `target` would run
    pub fn sleep_estimate(target: NaiveTime) -> String {
        Self::sleep_estimate_from(target, time::local_time_of_day())
    }

    pub fn sleep_estimate_from(target: NaiveTime, now: NaiveTime) -> String {
        format_sleep_estimate(seconds_until(target, now))
    }

    pub fn watch(&self) -> watch::Receiver<CountdownSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Drive [`tick`](Self::tick) every `period` until the scheduler is dropped
    pub fn spawn_ticker(self: &Arc<Self>, period: Duration) -> PeriodicTask {
        let scheduler = Arc::downgrade(self);
        PeriodicTask::spawn("countdown", period, move || match scheduler.upgrade() {
            Some(scheduler) => {
                scheduler.tick();
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(()),
        })
    }
}
