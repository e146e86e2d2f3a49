use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::traits::{EngineListener, ListenerId, MediaEngine};
use super::types::{EngineEvent, EngineSettings, NativeEvent};
use crate::models::MediaSource;
use crate::utils::PlaybackResult;

/// A native event tagged with the binding generation that received it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundEvent {
    pub generation: u64,
    pub event: NativeEvent,
}

/// Owned attachment of one listener to one engine for one source.
///
/// Dropping the binding clears its liveness flag and unsubscribes the
/// listener, whatever state playback was in. Events the engine still
/// delivers to a cloned listener afterwards are swallowed.
pub struct EngineBinding {
    engine: Arc<dyn MediaEngine>,
    listener_id: ListenerId,
    generation: u64,
    alive: Arc<AtomicBool>,
    normalizer: EventNormalizer,
}

impl EngineBinding {
    /// Subscribe to `engine`, forwarding its events into `sender`.
    pub fn attach<M>(
        engine: Arc<dyn MediaEngine>,
        generation: u64,
        sender: mpsc::UnboundedSender<M>,
    ) -> Self
    where
        M: From<BoundEvent> + Send + 'static,
    {
        let alive = Arc::new(AtomicBool::new(true));
        let listener_alive = alive.clone();
        let listener: EngineListener = Arc::new(move |event| {
            if !listener_alive.load(Ordering::Acquire) {
                trace!("Dropping {:?} delivered after teardown", event);
                return;
            }
            // A closed channel means the controller is gone; nothing to do.
            let _ = sender.send(M::from(BoundEvent { generation, event }));
        });

        let listener_id = engine.subscribe(listener);
        debug!(
            "Bound {} engine ({}, generation {})",
            engine.name(),
            listener_id,
            generation
        );

        Self {
            engine,
            listener_id,
            generation,
            alive,
            normalizer: EventNormalizer::default(),
        }
    }

    /// Apply the one-time settings, then hand the source to the engine.
    pub async fn load(&self, source: &MediaSource, settings: &EngineSettings) -> PlaybackResult<()> {
        debug!(
            "Configuring engine: preload={}, inline={}, credentials={}",
            settings.preload.as_str(),
            settings.inline_playback,
            settings.credentials.as_str()
        );
        self.engine.configure(settings).await?;
        self.engine.load(source).await
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.alive.load(Ordering::Acquire)
    }

    pub fn normalize(&mut self, event: NativeEvent) -> Vec<EngineEvent> {
        self.normalizer.normalize(event)
    }
}

impl Drop for EngineBinding {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.engine.unsubscribe(self.listener_id);
        debug!(
            "Unbound {} engine ({}, generation {})",
            self.engine.name(),
            self.listener_id,
            self.generation
        );
    }
}

/// Translates native events into the state machine's vocabulary.
#[derive(Debug, Default)]
pub struct EventNormalizer {
    duration: Option<f64>,
    stalled: bool,
}

impl EventNormalizer {
    pub fn normalize(&mut self, event: NativeEvent) -> Vec<EngineEvent> {
        let mut events = Vec::with_capacity(2);

        match event {
            NativeEvent::LoadStart => {
                self.stalled = false;
                events.push(EngineEvent::LoadStart);
            }
            NativeEvent::LoadedMetadata { duration } => {
                let duration = (duration.is_finite() && duration > 0.0).then_some(duration);
                if self.duration.is_none() {
                    self.duration = duration;
                }
                events.push(EngineEvent::MetadataReady { duration });
            }
            NativeEvent::CanPlay | NativeEvent::CanPlayThrough => {
                self.resume(&mut events);
                events.push(EngineEvent::CanPlay);
            }
            NativeEvent::Play => {
                trace!("Ignoring play request event, waiting for playing");
            }
            NativeEvent::Playing => {
                self.resume(&mut events);
                events.push(EngineEvent::PlayBegin);
            }
            NativeEvent::Pause => events.push(EngineEvent::PlayEnd),
            NativeEvent::Ended => {
                events.push(EngineEvent::PlayEnd);
                events.push(EngineEvent::Ended);
            }
            NativeEvent::TimeUpdate { current_time } => {
                if current_time.is_finite() && current_time >= 0.0 {
                    events.push(EngineEvent::TimeAdvanced(current_time));
                }
            }
            NativeEvent::Progress { buffered_end } => {
                if let Some(duration) = self.duration
                    && buffered_end.is_finite()
                {
                    events.push(EngineEvent::BufferProgress(
                        (buffered_end / duration).clamp(0.0, 1.0),
                    ));
                }
            }
            NativeEvent::Waiting | NativeEvent::Stalled => {
                if !self.stalled {
                    self.stalled = true;
                    events.push(EngineEvent::BufferStall);
                }
            }
            NativeEvent::Seeking => events.push(EngineEvent::SeekBegin),
            NativeEvent::Seeked => {
                self.resume(&mut events);
                events.push(EngineEvent::SeekEnd);
            }
            NativeEvent::VolumeChange { volume, muted } => {
                if volume.is_finite() {
                    events.push(EngineEvent::VolumeChanged {
                        volume: volume.clamp(0.0, 1.0),
                        muted,
                    });
                }
            }
            NativeEvent::FullscreenChange { fullscreen } => {
                events.push(EngineEvent::FullscreenChanged(fullscreen));
            }
            NativeEvent::Error { message } => events.push(EngineEvent::LoadError(message)),
        }

        events
    }

    fn resume(&mut self, events: &mut Vec<EngineEvent>) {
        if self.stalled {
            self.stalled = false;
            events.push(EngineEvent::BufferResume);
        }
    }
}
