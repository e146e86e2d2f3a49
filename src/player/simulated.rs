use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::traits::{EngineListener, ListenerId, MediaEngine};
use super::types::{EngineSettings, NativeEvent};
use crate::constants::{SIMULATED_DEFAULT_DURATION_SECS, SIMULATED_TICK_MS};
use crate::models::MediaSource;
use crate::utils::{PlaybackError, PlaybackResult};

/// How the simulated engine answers `play()`, mirroring browser policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayPolicy {
    #[default]
    Allowed,
    /// Playback is refused unless muted
    MutedOnly,
    Denied,
}

#[derive(Debug, Clone)]
pub struct SimulatedEngineOptions {
    /// Seconds; non-finite values simulate a live stream of unknown length
    pub duration: f64,
    pub autoplay: AutoplayPolicy,
    pub fullscreen_supported: bool,
    pub tick: Duration,
    /// Seconds of media buffered ahead of the playhead
    pub read_ahead: f64,
}

impl Default for SimulatedEngineOptions {
    fn default() -> Self {
        Self {
            duration: SIMULATED_DEFAULT_DURATION_SECS,
            autoplay: AutoplayPolicy::Allowed,
            fullscreen_supported: true,
            tick: Duration::from_millis(SIMULATED_TICK_MS),
            read_ahead: 15.0,
        }
    }
}

#[derive(Debug, Default)]
struct SimulatedState {
    loaded: bool,
    playing: bool,
    position: f64,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    ticker: Option<CancellationToken>,
}

struct Inner {
    options: SimulatedEngineOptions,
    state: Mutex<SimulatedState>,
    listeners: Mutex<HashMap<ListenerId, EngineListener>>,
    next_listener: AtomicU64,
}

/// A software media clock. Reports the same native events a real engine
/// would, without decoding anything.
#[derive(Clone)]
pub struct SimulatedEngine {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimulatedEngine {
    pub fn new(options: SimulatedEngineOptions) -> Self {
        let state = SimulatedState {
            volume: 1.0,
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                options,
                state: Mutex::new(state),
                listeners: Mutex::new(HashMap::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    pub fn position(&self) -> f64 {
        lock(&self.inner.state).position
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.inner.state).playing
    }

    pub fn is_fullscreen(&self) -> bool {
        lock(&self.inner.state).fullscreen
    }

    fn ensure_loaded(&self) -> PlaybackResult<()> {
        if lock(&self.inner.state).loaded {
            Ok(())
        } else {
            Err(PlaybackError::Engine("no source loaded".to_string()))
        }
    }

    fn start_ticker(&self) {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let inner = self.inner.clone();
        let tick = inner.options.tick;

        if let Some(previous) = lock(&self.inner.state).ticker.replace(token) {
            previous.cancel();
        }

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if !inner.advance(tick.as_secs_f64()) {
                            break;
                        }
                    }
                }
            }
            trace!("Simulated clock stopped");
        });
    }

    fn stop_ticker(&self) {
        if let Some(ticker) = lock(&self.inner.state).ticker.take() {
            ticker.cancel();
        }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(SimulatedEngineOptions::default())
    }
}

impl Inner {
    fn emit(&self, events: Vec<NativeEvent>) {
        let listeners: Vec<EngineListener> = lock(&self.listeners).values().cloned().collect();
        for event in events {
            for listener in &listeners {
                listener(event.clone());
            }
        }
    }

    fn duration(&self) -> Option<f64> {
        let duration = self.options.duration;
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }

    fn buffered_end(&self, position: f64) -> f64 {
        let end = position + self.options.read_ahead;
        self.duration().map_or(end, |duration| end.min(duration))
    }

    /// Move the clock forward; returns false once playback stopped.
    fn advance(&self, seconds: f64) -> bool {
        let mut events = Vec::new();
        let keep_running = {
            let mut state = lock(&self.state);
            if !state.playing {
                false
            } else {
                state.position += seconds;
                let ended = self
                    .duration()
                    .is_some_and(|duration| state.position >= duration);
                if let Some(duration) = self.duration() {
                    state.position = state.position.min(duration);
                }
                events.push(NativeEvent::TimeUpdate {
                    current_time: state.position,
                });
                events.push(NativeEvent::Progress {
                    buffered_end: self.buffered_end(state.position),
                });
                if ended {
                    state.playing = false;
                    state.ticker = None;
                    events.push(NativeEvent::Pause);
                    events.push(NativeEvent::Ended);
                }
                !ended
            }
        };
        self.emit(events);
        keep_running
    }
}

#[async_trait]
impl MediaEngine for SimulatedEngine {
    fn name(&self) -> &str {
        "simulated"
    }

    fn subscribe(&self, listener: EngineListener) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.listeners).insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        lock(&self.inner.listeners).remove(&id);
    }

    async fn configure(&self, settings: &EngineSettings) -> PlaybackResult<()> {
        debug!(
            "Simulated engine configured (preload {}, hardware acceleration {})",
            settings.preload.as_str(),
            settings.hardware_acceleration
        );
        Ok(())
    }

    async fn load(&self, source: &MediaSource) -> PlaybackResult<()> {
        let url = source.source_ref.to_url()?;
        info!("Simulating {}", url);

        self.stop_ticker();
        {
            let mut state = lock(&self.inner.state);
            state.loaded = true;
            state.playing = false;
            state.position = 0.0;
        }

        self.inner.emit(vec![
            NativeEvent::LoadStart,
            NativeEvent::LoadedMetadata {
                duration: self.inner.options.duration,
            },
            NativeEvent::Progress {
                buffered_end: self.inner.buffered_end(0.0),
            },
            NativeEvent::CanPlay,
        ]);
        Ok(())
    }

    async fn play(&self) -> PlaybackResult<()> {
        self.ensure_loaded()?;

        let restarted = {
            let mut state = lock(&self.inner.state);
            let allowed = match self.inner.options.autoplay {
                AutoplayPolicy::Allowed => true,
                AutoplayPolicy::MutedOnly => state.muted || state.volume == 0.0,
                AutoplayPolicy::Denied => false,
            };
            if !allowed {
                return Err(PlaybackError::NotAllowed(format!(
                    "autoplay policy {:?}",
                    self.inner.options.autoplay
                )));
            }
            if state.playing {
                return Ok(());
            }
            state.playing = true;
            let at_end = self
                .inner
                .duration()
                .is_some_and(|duration| state.position >= duration);
            if at_end {
                state.position = 0.0;
            }
            at_end
        };

        let mut events = vec![NativeEvent::Play];
        if restarted {
            events.push(NativeEvent::TimeUpdate { current_time: 0.0 });
        }
        events.push(NativeEvent::Playing);
        self.inner.emit(events);
        self.start_ticker();
        Ok(())
    }

    async fn pause(&self) -> PlaybackResult<()> {
        self.ensure_loaded()?;
        let was_playing = std::mem::replace(&mut lock(&self.inner.state).playing, false);
        self.stop_ticker();
        if was_playing {
            self.inner.emit(vec![NativeEvent::Pause]);
        }
        Ok(())
    }

    async fn seek(&self, position: Duration) -> PlaybackResult<()> {
        self.ensure_loaded()?;
        let target = {
            let mut state = lock(&self.inner.state);
            let target = position.as_secs_f64();
            state.position = self
                .inner
                .duration()
                .map_or(target, |duration| target.min(duration));
            state.position
        };

        self.inner.emit(vec![
            NativeEvent::Seeking,
            NativeEvent::Seeked,
            NativeEvent::TimeUpdate {
                current_time: target,
            },
            NativeEvent::Progress {
                buffered_end: self.inner.buffered_end(target),
            },
        ]);
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> PlaybackResult<()> {
        let (volume, muted) = {
            let mut state = lock(&self.inner.state);
            state.volume = volume.clamp(0.0, 1.0);
            (state.volume, state.muted)
        };
        self.inner.emit(vec![NativeEvent::VolumeChange { volume, muted }]);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> PlaybackResult<()> {
        let volume = {
            let mut state = lock(&self.inner.state);
            state.muted = muted;
            state.volume
        };
        self.inner.emit(vec![NativeEvent::VolumeChange { volume, muted }]);
        Ok(())
    }

    async fn set_fullscreen(&self, fullscreen: bool) -> PlaybackResult<()> {
        if !self.inner.options.fullscreen_supported {
            return Err(PlaybackError::FullscreenDenied(
                "fullscreen is not supported".to_string(),
            ));
        }
        lock(&self.inner.state).fullscreen = fullscreen;
        self.inner
            .emit(vec![NativeEvent::FullscreenChange { fullscreen }]);
        Ok(())
    }

    async fn release(&self) -> PlaybackResult<()> {
        self.stop_ticker();
        let mut state = lock(&self.inner.state);
        state.loaded = false;
        state.playing = false;
        state.position = 0.0;
        debug!("Simulated engine released");
        Ok(())
    }
}
