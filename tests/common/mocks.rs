use async_trait::async_trait;
use reel_playback::{
    models::MediaSource,
    player::{EngineListener, EngineSettings, ListenerId, MediaEngine, NativeEvent},
    utils::{PlaybackError, PlaybackResult},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Every call the controller made, in order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Configure(EngineSettings),
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f64),
    SetMuted(bool),
    SetFullscreen(bool),
    Release,
}

#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Emit load-start, metadata with this duration and can-play on load
    pub auto_ready: Option<f64>,
    /// Answer commands with the events a real engine would produce
    pub responsive: bool,
    pub reject_play: bool,
    pub deny_fullscreen: bool,
    /// Announce seeks, then refuse them
    pub fail_seek: bool,
    pub fail_load: bool,
    /// Keep invoking listeners after they were unsubscribed
    pub leak_listeners: bool,
}

#[derive(Default)]
struct MockState {
    volume: f64,
    muted: bool,
}

pub struct MockEngine {
    pub behavior: MockBehavior,
    calls: Mutex<Vec<EngineCall>>,
    listeners: Mutex<Vec<(ListenerId, EngineListener)>>,
    leaked: Mutex<Vec<EngineListener>>,
    state: Mutex<MockState>,
    next_listener: AtomicU64,
}

impl MockEngine {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            leaked: Mutex::new(Vec::new()),
            state: Mutex::new(MockState {
                volume: 1.0,
                muted: false,
            }),
            next_listener: AtomicU64::new(1),
        })
    }

    /// A loaded engine of `duration` seconds that answers every command
    pub fn ready(duration: f64) -> Arc<Self> {
        Self::new(MockBehavior {
            auto_ready: Some(duration),
            responsive: true,
            ..Default::default()
        })
    }

    /// Deliver an event to subscribed (and leaked) listeners
    pub fn emit(&self, event: NativeEvent) {
        let mut listeners: Vec<EngineListener> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        listeners.extend(self.leaked.lock().unwrap().iter().cloned());
        for listener in listeners {
            listener(event.clone());
        }
    }

    /// Deliver an event only to listeners that were unsubscribed
    pub fn emit_to_leaked(&self, event: NativeEvent) {
        let leaked: Vec<EngineListener> = self.leaked.lock().unwrap().clone();
        for listener in leaked {
            listener(event.clone());
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Seek(position) => Some(position),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn emit_volume(&self) {
        let (volume, muted) = {
            let state = self.state.lock().unwrap();
            (state.volume, state.muted)
        };
        if self.behavior.responsive {
            self.emit(NativeEvent::VolumeChange { volume, muted });
        }
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn subscribe(&self, listener: EngineListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap().push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let mut listeners = self.listeners.lock().unwrap();
        if let Some(index) = listeners.iter().position(|(existing, _)| *existing == id) {
            let (_, listener) = listeners.remove(index);
            if self.behavior.leak_listeners {
                self.leaked.lock().unwrap().push(listener);
            }
        }
    }

    async fn configure(&self, settings: &EngineSettings) -> PlaybackResult<()> {
        self.record(EngineCall::Configure(settings.clone()));
        Ok(())
    }

    async fn load(&self, source: &MediaSource) -> PlaybackResult<()> {
        self.record(EngineCall::Load(source.source_ref.to_string()));
        if self.behavior.fail_load {
            return Err(PlaybackError::Source("404 Not Found".to_string()));
        }
        if let Some(duration) = self.behavior.auto_ready {
            self.emit(NativeEvent::LoadStart);
            self.emit(NativeEvent::LoadedMetadata { duration });
            self.emit(NativeEvent::CanPlay);
        }
        Ok(())
    }

    async fn play(&self) -> PlaybackResult<()> {
        self.record(EngineCall::Play);
        if self.behavior.reject_play {
            return Err(PlaybackError::NotAllowed("autoplay blocked".to_string()));
        }
        if self.behavior.responsive {
            self.emit(NativeEvent::Play);
            self.emit(NativeEvent::Playing);
        }
        Ok(())
    }

    async fn pause(&self) -> PlaybackResult<()> {
        self.record(EngineCall::Pause);
        if self.behavior.responsive {
            self.emit(NativeEvent::Pause);
        }
        Ok(())
    }

    async fn seek(&self, position: Duration) -> PlaybackResult<()> {
        self.record(EngineCall::Seek(position));
        if self.behavior.fail_seek {
            self.emit(NativeEvent::Seeking);
            return Err(PlaybackError::Engine("seek not supported".to_string()));
        }
        if self.behavior.responsive {
            self.emit(NativeEvent::Seeking);
            self.emit(NativeEvent::Seeked);
            self.emit(NativeEvent::TimeUpdate {
                current_time: position.as_secs_f64(),
            });
        }
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> PlaybackResult<()> {
        self.record(EngineCall::SetVolume(volume));
        self.state.lock().unwrap().volume = volume;
        self.emit_volume();
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> PlaybackResult<()> {
        self.record(EngineCall::SetMuted(muted));
        self.state.lock().unwrap().muted = muted;
        self.emit_volume();
        Ok(())
    }

    async fn set_fullscreen(&self, fullscreen: bool) -> PlaybackResult<()> {
        self.record(EngineCall::SetFullscreen(fullscreen));
        if self.behavior.deny_fullscreen {
            return Err(PlaybackError::FullscreenDenied(
                "not triggered by a user gesture".to_string(),
            ));
        }
        if self.behavior.responsive {
            self.emit(NativeEvent::FullscreenChange { fullscreen });
        }
        Ok(())
    }

    async fn release(&self) -> PlaybackResult<()> {
        self.record(EngineCall::Release);
        Ok(())
    }
}
