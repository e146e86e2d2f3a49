use async_trait::async_trait;
use futures::StreamExt;
use gstreamer as gst;
use gstreamer::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::traits::{EngineListener, ListenerId, MediaEngine};
use super::types::{EngineSettings, NativeEvent, PreloadPolicy};
use crate::constants::POSITION_POLL_MS;
use crate::models::MediaSource;
use crate::utils::{PlaybackError, PlaybackResult};

struct Inner {
    playbin: Mutex<Option<gst::Element>>,
    listeners: Mutex<HashMap<ListenerId, EngineListener>>,
    next_listener: AtomicU64,
    settings: Mutex<EngineSettings>,
    tasks: Mutex<Option<CancellationToken>>,
    /// Set until the first ASYNC_DONE after a load reports metadata
    prerolling: AtomicBool,
    seeking: AtomicBool,
}

/// Playbin based engine. Bus messages are translated into native events on
/// a tokio task; a second task polls the position while playing.
#[derive(Clone)]
pub struct GStreamerEngine {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn engine_error(context: &str, err: impl std::fmt::Display) -> PlaybackError {
    PlaybackError::Engine(format!("{}: {}", context, err))
}

fn clock_seconds(time: gst::ClockTime) -> f64 {
    time.nseconds() as f64 / 1_000_000_000.0
}

impl GStreamerEngine {
    pub fn new() -> PlaybackResult<Self> {
        gst::init().map_err(|e| engine_error("Failed to initialize GStreamer", e))?;
        info!("GStreamer initialized: {}", gst::version_string());

        Ok(Self {
            inner: Arc::new(Inner {
                playbin: Mutex::new(None),
                listeners: Mutex::new(HashMap::new()),
                next_listener: AtomicU64::new(1),
                settings: Mutex::new(EngineSettings::default()),
                tasks: Mutex::new(None),
                prerolling: AtomicBool::new(false),
                seeking: AtomicBool::new(false),
            }),
        })
    }

    fn playbin(&self) -> PlaybackResult<gst::Element> {
        lock(&self.inner.playbin)
            .clone()
            .ok_or_else(|| PlaybackError::Engine("no source loaded".to_string()))
    }

    fn spawn_tasks(&self, playbin: &gst::Element) -> PlaybackResult<()> {
        let bus = playbin
            .bus()
            .ok_or_else(|| PlaybackError::Engine("playbin has no bus".to_string()))?;

        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.inner.tasks).replace(token.clone()) {
            previous.cancel();
        }

        let inner = self.inner.clone();
        let bus_playbin = playbin.clone();
        let bus_token = token.clone();
        tokio::spawn(async move {
            let mut messages = bus.stream();
            loop {
                tokio::select! {
                    _ = bus_token.cancelled() => break,
                    message = messages.next() => {
                        let Some(message) = message else { break };
                        let events = inner.translate(&bus_playbin, &message);
                        inner.emit(events);
                    }
                }
            }
            trace!("GStreamer bus task stopped");
        });

        let inner = self.inner.clone();
        let poll_playbin = playbin.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(POSITION_POLL_MS));
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let (_, current, _) = poll_playbin.state(gst::ClockTime::ZERO);
                        if current != gst::State::Playing {
                            continue;
                        }
                        if let Some(position) = poll_playbin.query_position::<gst::ClockTime>() {
                            inner.emit(vec![NativeEvent::TimeUpdate {
                                current_time: clock_seconds(position),
                            }]);
                        }
                    }
                }
            }
        });

        Ok(())
    }

    fn stop_tasks(&self) {
        if let Some(token) = lock(&self.inner.tasks).take() {
            token.cancel();
        }
    }
}

impl Inner {
    fn emit(&self, events: Vec<NativeEvent>) {
        if events.is_empty() {
            return;
        }
        let listeners: Vec<EngineListener> = lock(&self.listeners).values().cloned().collect();
        for event in events {
            for listener in &listeners {
                listener(event.clone());
            }
        }
    }

    fn translate(&self, playbin: &gst::Element, message: &gst::Message) -> Vec<NativeEvent> {
        use gst::MessageView;

        let from_playbin = message
            .src()
            .is_some_and(|src| src == playbin.upcast_ref::<gst::Object>());

        match message.view() {
            MessageView::AsyncDone(_) => {
                if self.prerolling.swap(false, Ordering::AcqRel) {
                    let duration = playbin
                        .query_duration::<gst::ClockTime>()
                        .map_or(f64::NAN, clock_seconds);
                    vec![NativeEvent::LoadedMetadata { duration }, NativeEvent::CanPlay]
                } else if self.seeking.swap(false, Ordering::AcqRel) {
                    let mut events = vec![NativeEvent::Seeked];
                    if let Some(position) = playbin.query_position::<gst::ClockTime>() {
                        events.push(NativeEvent::TimeUpdate {
                            current_time: clock_seconds(position),
                        });
                    }
                    events
                } else {
                    Vec::new()
                }
            }
            MessageView::StateChanged(changed) if from_playbin => {
                debug!(
                    "Playbin state changed from {:?} to {:?}",
                    changed.old(),
                    changed.current()
                );
                match (changed.old(), changed.current()) {
                    (_, gst::State::Playing) => vec![NativeEvent::Playing],
                    (gst::State::Playing, gst::State::Paused) => vec![NativeEvent::Pause],
                    _ => Vec::new(),
                }
            }
            MessageView::Buffering(buffering) => {
                let percent = buffering.percent();
                trace!("Buffering: {}%", percent);
                if percent < 100 {
                    vec![NativeEvent::Waiting]
                } else {
                    vec![NativeEvent::CanPlayThrough]
                }
            }
            MessageView::Eos(_) => {
                info!("End of stream");
                vec![NativeEvent::Pause, NativeEvent::Ended]
            }
            MessageView::Error(err) => {
                error!(
                    "Bus error from {:?}: {} ({:?})",
                    err.src().map(|s| s.path_string()),
                    err.error(),
                    err.debug()
                );
                vec![NativeEvent::Error {
                    message: err.error().to_string(),
                }]
            }
            MessageView::Warning(warning) => {
                warn!("Bus warning: {} ({:?})", warning.error(), warning.debug());
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn volume_event(&self, playbin: &gst::Element) -> NativeEvent {
        NativeEvent::VolumeChange {
            volume: playbin.property::<f64>("volume"),
            muted: playbin.property::<bool>("mute"),
        }
    }
}

#[async_trait]
impl MediaEngine for GStreamerEngine {
    fn name(&self) -> &str {
        "gstreamer"
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
        *lock(&self.inner.settings) = settings.clone();
        Ok(())
    }

    async fn load(&self, source: &MediaSource) -> PlaybackResult<()> {
        let url = source.source_ref.to_url()?;
        let settings = lock(&self.inner.settings).clone();
        info!("Loading {} with playbin", url);

        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", url.as_str())
            .build()
            .map_err(|e| engine_error("Failed to create playbin", e))?;

        if !settings.hardware_acceleration {
            disable_hardware_decoders();
        }

        self.spawn_tasks(&playbin)?;
        *lock(&self.inner.playbin) = Some(playbin.clone());
        self.inner.seeking.store(false, Ordering::Release);
        self.inner.emit(vec![NativeEvent::LoadStart]);

        self.inner.prerolling.store(true, Ordering::Release);
        if settings.preload != PreloadPolicy::None {
            playbin
                .set_state(gst::State::Paused)
                .map_err(|e| engine_error("Failed to preroll", e))?;
        }
        Ok(())
    }

    async fn play(&self) -> PlaybackResult<()> {
        let playbin = self.playbin()?;
        self.inner.emit(vec![NativeEvent::Play]);
        playbin
            .set_state(gst::State::Playing)
            .map_err(|e| engine_error("Failed to start playback", e))?;
        Ok(())
    }

    async fn pause(&self) -> PlaybackResult<()> {
        self.playbin()?
            .set_state(gst::State::Paused)
            .map_err(|e| engine_error("Failed to pause", e))?;
        Ok(())
    }

    async fn seek(&self, position: Duration) -> PlaybackResult<()> {
        let playbin = self.playbin()?;
        let target = gst::ClockTime::from_nseconds(position.as_nanos() as u64);
        debug!("Seeking to {}", target.display());

        self.inner.seeking.store(true, Ordering::Release);
        self.inner.emit(vec![NativeEvent::Seeking]);
        playbin
            .seek_simple(gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT, target)
            .map_err(|e| {
                self.inner.seeking.store(false, Ordering::Release);
                engine_error("Seek failed", e)
            })
    }

    async fn set_volume(&self, volume: f64) -> PlaybackResult<()> {
        let playbin = self.playbin()?;
        playbin.set_property("volume", volume.clamp(0.0, 1.0));
        self.inner.emit(vec![self.inner.volume_event(&playbin)]);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> PlaybackResult<()> {
        let playbin = self.playbin()?;
        playbin.set_property("mute", muted);
        self.inner.emit(vec![self.inner.volume_event(&playbin)]);
        Ok(())
    }

    async fn set_fullscreen(&self, _fullscreen: bool) -> PlaybackResult<()> {
        Err(PlaybackError::FullscreenDenied(
            "headless pipeline has no window".to_string(),
        ))
    }

    async fn release(&self) -> PlaybackResult<()> {
        self.stop_tasks();
        if let Some(playbin) = lock(&self.inner.playbin).take() {
            playbin
                .set_state(gst::State::Null)
                .map_err(|e| engine_error("Failed to stop pipeline", e))?;
        }
        debug!("GStreamer engine released");
        Ok(())
    }
}

/// Drop hardware decoders to rank NONE so decodebin never autoplugs them.
fn disable_hardware_decoders() {
    const HARDWARE_PREFIXES: [&str; 5] = ["vaapi", "va", "nv", "v4l2", "d3d11"];

    let registry = gst::Registry::get();
    let factories = registry.features_filtered(|_| true, false);
    for factory in factories
        .iter()
        .filter_map(|f| f.downcast_ref::<gst::ElementFactory>())
    {
        let name = factory.name();
        if name.contains("dec") && HARDWARE_PREFIXES.iter().any(|p| name.starts_with(p)) {
            debug!("Disabling hardware decoder {}", name);
            factory.set_rank(gst::Rank::NONE);
        }
    }
}
