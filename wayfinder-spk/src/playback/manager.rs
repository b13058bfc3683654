//! Single-owner playback manager
//!
//! All create/supersede/release operations on the active handle happen
//! inside one critical section, so concurrent workflows can neither release
//! the same resource twice nor leak one between a release and an acquire.

use super::{
    AudioAttributes, PlaybackBackend, PlaybackEvent, PlaybackResource, PlaybackSignal, PlaybackState,
};
use crate::error::PlaybackError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

const EVENT_BUFFER_SIZE: usize = 64;

struct ActiveHandle {
    generation: u64,
    url: String,
    state: PlaybackState,
    resource: Box<dyn PlaybackResource>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    active: Option<ActiveHandle>,
    released: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl Shared {
    fn publish(&self, url: &str, state: PlaybackState) {
        // Nobody listening is fine
        let _ = self.events.send(PlaybackEvent {
            url: url.to_string(),
            state,
        });
    }

    /// Free a handle taken out of the slot. Caller holds the slot lock.
    fn retire(&self, mut handle: ActiveHandle, terminal: Option<PlaybackState>) {
        if let Some(state) = terminal {
            handle.state = state;
            self.publish(&handle.url, state);
        }
        handle.resource.release();
        self.publish(&handle.url, PlaybackState::Idle);
    }
}

/// Owns the one live playback handle. Newer requests always win.
pub struct PlaybackManager {
    backend: Arc<dyn PlaybackBackend>,
    shared: Arc<Shared>,
}

impl PlaybackManager {
    pub fn new(backend: Arc<dyn PlaybackBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            backend,
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot::default()),
                events,
            }),
        }
    }

    /// Play `url`, superseding whatever is currently playing.
    ///
    /// The previous resource is released before the new one is acquired.
    /// Playback starts on its own once the backend reports `Ready`.
    pub fn play(&self, url: &str) -> Result<(), PlaybackError> {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let generation = {
            let mut slot = self.shared.slot.lock();
            if slot.released {
                return Err(PlaybackError::Released);
            }

            if let Some(previous) = slot.active.take() {
                info!("Superseding playback of {} ({})", previous.url, previous.state);
                self.shared.retire(previous, None);
            }

            slot.generation += 1;
            let generation = slot.generation;

            let resource = self
                .backend
                .open(url, AudioAttributes::speech(), signal_tx)
                .map_err(|e| {
                    error!("Failed to prepare audio from {}: {}", url, e);
                    e
                })?;

            debug!("Preparing to play audio from {}", url);
            slot.active = Some(ActiveHandle {
                generation,
                url: url.to_string(),
                state: PlaybackState::Preparing,
                resource,
            });
            self.shared.publish(url, PlaybackState::Preparing);
            generation
        };

        tokio::spawn(watch_signals(self.shared.clone(), generation, signal_rx));
        Ok(())
    }

    /// Stop and release the current handle, if any. The manager stays usable.
    pub fn stop(&self) {
        let mut slot = self.shared.slot.lock();
        if let Some(handle) = slot.active.take() {
            info!("Stopping playback of {}", handle.url);
            self.shared.retire(handle, None);
        }
    }

    /// Stop playback and refuse any further `play` calls. Idempotent.
    pub fn release(&self) {
        let mut slot = self.shared.slot.lock();
        if !slot.released {
            debug!("Releasing playback manager");
        }
        slot.released = true;
        if let Some(handle) = slot.active.take() {
            self.shared.retire(handle, None);
        }
    }

    pub fn is_released(&self) -> bool {
        self.shared.slot.lock().released
    }

    pub fn state(&self) -> PlaybackState {
        self.shared
            .slot
            .lock()
            .active
            .as_ref()
            .map(|handle| handle.state)
            .unwrap_or(PlaybackState::Idle)
    }

    pub fn current_url(&self) -> Option<String> {
        self.shared
            .slot
            .lock()
            .active
            .as_ref()
            .map(|handle| handle.url.clone())
    }

    /// Receive every state transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }
}

impl Drop for PlaybackManager {
    fn drop(&mut self) {
        let mut slot = self.shared.slot.lock();
        if let Some(handle) = slot.active.take() {
            self.shared.retire(handle, None);
        }
    }
}

/// Apply one resource's signals to the slot while it still owns it
async fn watch_signals(
    shared: Arc<Shared>,
    generation: u64,
    mut signals: mpsc::UnboundedReceiver<PlaybackSignal>,
) {
    while let Some(signal) = signals.recv().await {
        let mut slot = shared.slot.lock();
        let handle = match slot.active.as_mut() {
            Some(handle) if handle.generation == generation => handle,
            _ => {
                debug!("Dropping {:?} from superseded playback", signal);
                return;
            }
        };

        let terminal = match (handle.state, signal) {
            (PlaybackState::Preparing, PlaybackSignal::Ready) => match handle.resource.start() {
                Ok(()) => {
                    debug!("Audio prepared, starting playback of {}", handle.url);
                    handle.state = PlaybackState::Playing;
                    shared.publish(&handle.url, PlaybackState::Playing);
                    continue;
                }
                Err(e) => {
                    error!("Failed to start playback of {}: {}", handle.url, e);
                    PlaybackState::Error
                }
            },
            (PlaybackState::Playing, PlaybackSignal::Finished) => {
                debug!("Playback of {} completed", handle.url);
                PlaybackState::Completed
            }
            (PlaybackState::Preparing | PlaybackState::Playing, PlaybackSignal::Error(reason)) => {
                error!("Playback error for {}: {}", handle.url, reason);
                PlaybackState::Error
            }
            (state, signal) => {
                debug!("Ignoring {:?} while {}", signal, state);
                continue;
            }
        };

        if let Some(handle) = slot.active.take() {
            shared.retire(handle, Some(terminal));
        }
        return;
    }

    debug!("Playback signal channel {} closed", generation);
}
