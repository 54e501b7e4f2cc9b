//! Event types for the Hush event system
//!
//! Provides shared event definitions and the EventBus used by the playback
//! engine and the countdown scheduler.
//!
//! # Delivery guarantees
//!
//! Every subscriber owns an unbounded channel, so events are delivered in
//! the order they were emitted and none are dropped. Loudness samples are
//! deliberately *not* events: they travel on a coalescing `watch` channel
//! owned by the engine.

mod playback_types;

pub use playback_types::{Category, PlaybackState};

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::trace;

/// Hush event types
///
/// Events can be serialized for logging or forwarding by a host process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HushEvent {
    /// Transport changed (Stopped ↔ Playing)
    ///
    /// Triggers:
    /// - UI: Swap play/pause icon, start or stop ripple animations
    PlaybackStateChanged {
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Selected category changed (a track reload follows)
    CategoryChanged {
        old_category: Category,
        new_category: Category,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Asset for a category could not be opened or decoded
    ///
    /// The engine stays usable and retries on the next switch or toggle.
    SourceUnavailable {
        category: Category,
        /// Human-readable failure reason
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current playing state re-announced so dependent animations restart
    AmbientReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sleep timer armed
    CountdownStarted {
        remaining_seconds: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One second elapsed on an active sleep timer
    CountdownTick {
        remaining_seconds: u32,
    },

    /// Sleep timer paused or resumed
    CountdownToggled {
        is_active: bool,
        remaining_seconds: u32,
    },

    /// Sleep timer cleared by the user or by a playback reset
    CountdownCancelled {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sleep timer reached zero; a stop command follows
    CountdownExpired {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl HushEvent {
    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            HushEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            HushEvent::CategoryChanged { .. } => "CategoryChanged",
            HushEvent::SourceUnavailable { .. } => "SourceUnavailable",
            HushEvent::AmbientReset { .. } => "AmbientReset",
            HushEvent::CountdownStarted { .. } => "CountdownStarted",
            HushEvent::CountdownTick { .. } => "CountdownTick",
            HushEvent::CountdownToggled { .. } => "CountdownToggled",
            HushEvent::CountdownCancelled { .. } => "CountdownCancelled",
            HushEvent::CountdownExpired { .. } => "CountdownExpired",
        }
    }
}

/// Ordered, lossless one-to-many event distribution
///
/// Subscribers that drop their receiver are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<HushEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    ///
    /// # Examples
    ///
    /// ```
    /// use hush_common::events::{EventBus, HushEvent};
    ///
    /// let bus = EventBus::new();
    /// let mut rx = bus.subscribe();
    /// bus.emit(HushEvent::CountdownTick { remaining_seconds: 3 });
    /// assert_eq!(
    ///     rx.try_recv().unwrap(),
    ///     HushEvent::CountdownTick { remaining_seconds: 3 }
    /// );
    /// ```
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<HushEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Emit an event to all live subscribers
    ///
    /// Returns the number of subscribers that received the event. Having no
    /// subscribers is not an error.
    pub fn emit(&self, event: HushEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        trace!(
            "Emitted {} to {} subscriber(s)",
            event.event_type(),
            subscribers.len()
        );
        subscribers.len()
    }

    /// Current number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_change(old: PlaybackState, new: PlaybackState) -> HushEvent {
        HushEvent::PlaybackStateChanged {
            old_state: old,
            new_state: new,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new();
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(HushEvent::CountdownTick { remaining_seconds: 1 }), 0);
    }

    #[test]
    fn test_eventbus_prunes_dropped_subscribers() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let _kept = bus.subscribe();
        drop(rx);

        assert_eq!(bus.emit(HushEvent::CountdownTick { remaining_seconds: 1 }), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_eventbus_preserves_order_without_drops() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        // Far more than any bounded buffer would hold
        for remaining in (0..5_000u32).rev() {
            bus.emit(HushEvent::CountdownTick {
                remaining_seconds: remaining,
            });
        }

        for expected in (0..5_000u32).rev() {
            match rx.recv().await {
                Some(HushEvent::CountdownTick { remaining_seconds }) => {
                    assert_eq!(remaining_seconds, expected)
                }
                other => panic!("Unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_eventbus_every_subscriber_sees_transport_flips() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(state_change(PlaybackState::Stopped, PlaybackState::Playing));
        bus.emit(state_change(PlaybackState::Playing, PlaybackState::Stopped));

        for rx in [&mut first, &mut second] {
            let mut seen = Vec::new();
            while let Ok(HushEvent::PlaybackStateChanged { new_state, .. }) = rx.try_recv() {
                seen.push(new_state);
            }
            assert_eq!(seen, vec![PlaybackState::Playing, PlaybackState::Stopped]);
        }
    }

    #[test]
    fn test_event_serialization_uses_type_tag() {
        let event = HushEvent::CategoryChanged {
            old_category: Category::WhiteNoise,
            new_category: Category::Rhythm,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CategoryChanged");
        assert_eq!(json["new_category"], "rhythm");
        assert_eq!(event.event_type(), "CategoryChanged");

        let parsed: HushEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}
