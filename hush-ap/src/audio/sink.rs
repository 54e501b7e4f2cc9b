//! Output sink: the render thread and the deck it plays from
//!
//! The deck holds at most one attached [`LoopTrack`]. A sink owns one render
//! thread that pulls blocks from the deck, either into a cpal device stream
//! or (for headless hosts and tests) into nothing at real-time pace.

use crate::audio::output::AudioOutput;
use crate::audio::track::LoopTrack;
use crate::audio::types::AudioFrame;
use crate::error::{Error, Result};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Block period of the null render thread
const NULL_BLOCK_MS: u64 = 10;

/// Rate used by the null sink when none is configured
pub const DEFAULT_NULL_SAMPLE_RATE: u32 = 44100;

/// Slot holding the one track attached to the output
#[derive(Debug, Default)]
pub struct Deck {
    slot: Mutex<Option<Arc<LoopTrack>>>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `track`, replacing (and detaching) any previous one
    pub fn attach(&self, track: Arc<LoopTrack>) {
        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(track);
        if let Some(previous) = previous {
            previous.set_playing(false);
        }
    }

    /// Detach `track` if it is the one attached. Returns true if detached.
    pub fn detach(&self, track: &Arc<LoopTrack>) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(current) if Arc::ptr_eq(current, track) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_attached(&self, track: &Arc<LoopTrack>) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, track))
    }

    /// Render one block. Never blocks: contention yields a silent block.
    pub fn render(&self, out: &mut [AudioFrame]) {
        match self.slot.try_lock() {
            Ok(slot) => match slot.as_ref() {
                Some(track) => track.render(out),
                None => out.fill(AudioFrame::zero()),
            },
            Err(_) => out.fill(AudioFrame::zero()),
        }
    }
}

/// Where rendered audio goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    /// cpal device; None = system default
    Device(Option<String>),
    /// Real-time render thread with no device
    Null { sample_rate: u32 },
}

/// Owns the render thread; stops and joins it on drop
pub struct OutputSink {
    deck: Arc<Deck>,
    sample_rate: u32,
    shutdown_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl OutputSink {
    pub fn open(kind: SinkKind) -> Result<Self> {
        match kind {
            SinkKind::Device(name) => Self::device(name),
            SinkKind::Null { sample_rate } => Self::null(sample_rate),
        }
    }

    /// Open a cpal device on a dedicated thread.
    ///
    /// Blocks until the stream is running (or failed) so the caller learns
    /// the device sample rate before any asset is resampled.
    pub fn device(device_name: Option<String>) -> Result<Self> {
        let deck = Arc::new(Deck::new());
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32>>();

        let render_deck = Arc::clone(&deck);
        let thread = thread::Builder::new()
            .name("hush-audio-output".to_string())
            .spawn(move || {
                let mut output = match AudioOutput::new(device_name.as_deref()) {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                if let Err(e) = output.start(move |block| render_deck.render(block)) {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                let _ = ready_tx.send(Ok(output.sample_rate()));

                // Park until shutdown is requested or the sink is dropped
                let _ = shutdown_rx.recv();

                if output.error_count() > 0 {
                    warn!(
                        "Audio stream reported {} errors during session",
                        output.error_count()
                    );
                }
                if let Err(e) = output.stop() {
                    warn!("Failed to stop audio stream: {}", e);
                }
            })?;

        let sample_rate = ready_rx.recv().map_err(|_| {
            Error::AudioOutput("Output thread exited during startup".to_string())
        })??;

        info!("Audio output sink running at {}Hz", sample_rate);
        Ok(Self {
            deck,
            sample_rate,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Start a render thread that consumes audio in real time without a device.
    pub fn null(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::Config("Null sink sample rate must be > 0".to_string()));
        }

        let deck = Arc::new(Deck::new());
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let block_frames = ((sample_rate as u64 * NULL_BLOCK_MS) / 1000).max(1) as usize;

        let render_deck = Arc::clone(&deck);
        let thread = thread::Builder::new()
            .name("hush-null-output".to_string())
            .spawn(move || {
                let mut block = vec![AudioFrame::zero(); block_frames];
                loop {
                    match shutdown_rx.recv_timeout(Duration::from_millis(NULL_BLOCK_MS)) {
                        Err(RecvTimeoutError::Timeout) => render_deck.render(&mut block),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Null render thread exiting");
            })?;

        info!("Null output sink running at {}Hz", sample_rate);
        Ok(Self {
            deck,
            sample_rate,
            shutdown_tx: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn deck(&self) -> &Arc<Deck> {
        &self.deck
    }

    /// Rate assets must be resampled to
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Render thread panicked");
            }
        }
    }
}
