//! Test helper modules for hush-ap integration tests
//!
//! - audio_generator: WAV asset fixtures with known power
//! - fake_source: scripted `SourceLoader` / `AudioSource` for engine tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod fake_source;

use hush_common::HushEvent;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Drain everything currently queued on an event receiver
pub fn drain(rx: &mut UnboundedReceiver<HushEvent>) -> Vec<HushEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Event type names, for order assertions
pub fn types(events: &[HushEvent]) -> Vec<&'static str> {
    events.iter().map(HushEvent::event_type).collect()
}

/// Let the metering loop run a few ticks
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(80)).await;
}
