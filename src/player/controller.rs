use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, trace, warn};

use super::binding::{BoundEvent, EngineBinding};
use super::controls_visibility::ActivitySignal;
use super::core::{CoreSettings, Effect, EngineCommand, Notification, PlaybackCore, TimerKind};
use super::keyboard::{Key, KeyBindings, Modifiers};
use super::timer::{TimerFired, TimerSlot};
use super::traits::MediaEngine;
use super::types::{EngineEvent, EngineSettings};
use crate::config::Config;
use crate::models::{MediaSource, PlaybackOptions, PlayerSnapshot};
use crate::utils::{PlaybackError, PlaybackResult};

/// Commands that can be sent to the player controller
#[derive(Debug)]
pub enum PlayerCommand {
    Play,
    Pause,
    TogglePlay,
    ToggleMute,
    /// Set volume (0.0 to 1.0)
    SetVolume { volume: f64 },
    AdjustVolume { delta: f64 },
    SeekToFraction { fraction: f64 },
    BeginSeekGesture,
    EndSeekGesture,
    SkipBySeconds { seconds: f64 },
    ToggleFullscreen,
    Activity { signal: ActivitySignal },
    KeyPressed { key: Key, modifiers: Modifiers },
    /// Tear down the current binding and bind a new source
    SetSource {
        source: MediaSource,
        options: PlaybackOptions,
        respond_to: oneshot::Sender<PlaybackResult<()>>,
    },
    GetSnapshot {
        respond_to: oneshot::Sender<PlayerSnapshot>,
    },
    Detach {
        respond_to: oneshot::Sender<()>,
    },
}

/// Messages produced inside the controller: engine events and timer expiries
#[derive(Debug)]
enum InternalMessage {
    Engine(BoundEvent),
    Timer(TimerFired),
}

impl From<BoundEvent> for InternalMessage {
    fn from(event: BoundEvent) -> Self {
        Self::Engine(event)
    }
}

impl From<TimerFired> for InternalMessage {
    fn from(fired: TimerFired) -> Self {
        Self::Timer(fired)
    }
}

type Callback = Box<dyn FnMut() + Send>;

/// Optional caller hooks fired on confirmed play and on pause.
#[derive(Default)]
pub struct PlaybackCallbacks {
    on_play: Option<Callback>,
    on_pause: Option<Callback>,
}

impl PlaybackCallbacks {
    pub fn on_play(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_play = Some(Box::new(callback));
        self
    }

    pub fn on_pause(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_pause = Some(Box::new(callback));
        self
    }

    fn notify(&mut self, notification: Notification) {
        let callback = match notification {
            Notification::Played => self.on_play.as_mut(),
            Notification::Paused => self.on_pause.as_mut(),
        };
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl fmt::Debug for PlaybackCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCallbacks")
            .field("on_play", &self.on_play.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .finish()
    }
}

/// Controller that owns the engine binding and processes commands
pub struct PlayerController {
    engine: Arc<dyn MediaEngine>,
    core: PlaybackCore,
    binding: Option<EngineBinding>,
    generation: u64,
    engine_settings: EngineSettings,
    key_bindings: KeyBindings,
    callbacks: PlaybackCallbacks,

    auto_hide: TimerSlot,
    play_confirm: TimerSlot,

    receiver: mpsc::UnboundedReceiver<PlayerCommand>,
    internal_tx: mpsc::UnboundedSender<InternalMessage>,
    internal_rx: mpsc::UnboundedReceiver<InternalMessage>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
}

impl PlayerController {
    /// Create a new player controller with the given config
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        source: MediaSource,
        options: PlaybackOptions,
        callbacks: PlaybackCallbacks,
        config: &Config,
    ) -> (PlayerHandle, PlayerController) {
        let core = PlaybackCore::new(source, options, CoreSettings::from(config));
        let (sender, receiver) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(core.snapshot());

        let controller = PlayerController {
            engine,
            core,
            binding: None,
            generation: 0,
            engine_settings: config.engine.clone(),
            key_bindings: KeyBindings::from(config),
            callbacks,
            auto_hide: TimerSlot::new(TimerKind::AutoHide),
            play_confirm: TimerSlot::new(TimerKind::PlayConfirm),
            receiver,
            internal_tx,
            internal_rx,
            snapshot_tx,
        };
        let handle = PlayerHandle { sender, snapshots };

        (handle, controller)
    }

    /// Create a controller and run it on the current tokio runtime
    pub fn spawn(
        engine: Arc<dyn MediaEngine>,
        source: MediaSource,
        options: PlaybackOptions,
        callbacks: PlaybackCallbacks,
        config: &Config,
    ) -> PlayerHandle {
        let (handle, controller) = Self::new(engine, source, options, callbacks, config);
        tokio::spawn(controller.run());
        handle
    }

    /// Run the controller event loop
    pub async fn run(mut self) {
        debug!("PlayerController event loop started");

        self.bind().await;
        self.publish();

        loop {
            tokio::select! {
                biased;

                Some(message) = self.internal_rx.recv() => {
                    self.handle_internal(message).await;
                }
                command = self.receiver.recv() => {
                    let Some(command) = command else {
                        debug!("All player handles dropped");
                        self.teardown().await;
                        break;
                    };
                    if !self.handle_command(command).await {
                        break;
                    }
                }
            }

            self.publish();
        }

        debug!("PlayerController event loop terminated");
    }

    async fn bind(&mut self) {
        self.generation += 1;
        let source = self.core.session().source.clone();
        info!(
            "Binding session {} to {} ({})",
            self.core.session().session_id,
            source.display_name(),
            self.engine.name()
        );

        let binding =
            EngineBinding::attach(self.engine.clone(), self.generation, self.internal_tx.clone());

        let result = match source.source_ref.to_url() {
            Ok(_) => binding.load(&source, &self.engine_settings).await,
            Err(e) => Err(e),
        };
        self.binding = Some(binding);

        match result {
            Ok(()) => self.core.apply_preferences(),
            Err(e) => {
                error!("Failed to load {}: {}", source.display_name(), e);
                self.core.handle_engine_event(EngineEvent::LoadError(e.to_string()));
            }
        }
        self.flush().await;
    }

    /// Cancel timers, then drop the binding, then release the engine.
    async fn unbind(&mut self) {
        self.auto_hide.cancel();
        self.play_confirm.cancel();

        if let Some(binding) = self.binding.take() {
            drop(binding);
            if let Err(e) = self.engine.release().await {
                warn!("Failed to release {} engine: {}", self.engine.name(), e);
            }
        }
    }

    async fn teardown(&mut self) {
        info!("Detaching session {}", self.core.session().session_id);
        self.core.detach();
        self.unbind().await;
        // Anything queued before detaching no longer applies
        let discarded = self.core.take_effects();
        if !discarded.is_empty() {
            trace!("Discarded {} effects on detach", discarded.len());
        }
        self.publish();
    }

    async fn handle_internal(&mut self, message: InternalMessage) {
        match message {
            InternalMessage::Engine(BoundEvent { generation, event }) => {
                let Some(binding) = self.binding.as_mut().filter(|b| b.is_current(generation))
                else {
                    trace!("Dropping {:?} from stale generation {}", event, generation);
                    return;
                };
                for event in binding.normalize(event) {
                    trace!("Engine event {}", event.name());
                    self.core.handle_engine_event(event);
                }
            }
            InternalMessage::Timer(fired) => match fired.kind {
                TimerKind::AutoHide => {
                    if self.auto_hide.accept(fired) {
                        self.core.handle_auto_hide_elapsed();
                    }
                }
                TimerKind::PlayConfirm => {
                    if self.play_confirm.accept(fired) {
                        self.core.handle_play_confirm_timeout();
                    }
                }
            },
        }
        self.flush().await;
    }

    /// Returns false once the controller has detached.
    async fn handle_command(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::Play => self.core.play(),
            PlayerCommand::Pause => self.core.pause(),
            PlayerCommand::TogglePlay => self.core.toggle_play(),
            PlayerCommand::ToggleMute => self.core.toggle_mute(),
            PlayerCommand::SetVolume { volume } => self.core.set_volume(volume),
            PlayerCommand::AdjustVolume { delta } => self.core.adjust_volume(delta),
            PlayerCommand::SeekToFraction { fraction } => self.core.seek_to_fraction(fraction),
            PlayerCommand::BeginSeekGesture => self.core.begin_seek_gesture(),
            PlayerCommand::EndSeekGesture => self.core.end_seek_gesture(),
            PlayerCommand::SkipBySeconds { seconds } => self.core.skip_by_seconds(seconds),
            PlayerCommand::ToggleFullscreen => self.core.toggle_fullscreen(),
            PlayerCommand::Activity { signal } => self.core.handle_activity(signal),
            PlayerCommand::KeyPressed { key, modifiers } => {
                self.core.handle_key(&self.key_bindings, key, modifiers)
            }
            PlayerCommand::SetSource {
                source,
                options,
                respond_to,
            } => {
                let result = self.rebind(source, options).await;
                let _ = respond_to.send(result);
            }
            PlayerCommand::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.core.snapshot());
            }
            PlayerCommand::Detach { respond_to } => {
                self.teardown().await;
                let _ = respond_to.send(());
                return false;
            }
        }
        self.flush().await;
        true
    }

    async fn rebind(&mut self, source: MediaSource, options: PlaybackOptions) -> PlaybackResult<()> {
        source.source_ref.to_url()?;

        self.unbind().await;
        self.core.rebind(source, options);
        // Effects of the old session were for the old binding
        let _ = self.core.take_effects();
        self.bind().await;
        Ok(())
    }

    /// Execute queued effects until the core has nothing more to say.
    async fn flush(&mut self) {
        loop {
            let effects = self.core.take_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                self.execute(effect).await;
            }
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Engine(command) => self.dispatch(command).await,
            Effect::ArmTimer(TimerKind::AutoHide, delay) => {
                self.auto_hide.arm(delay, &self.internal_tx)
            }
            Effect::ArmTimer(TimerKind::PlayConfirm, delay) => {
                self.play_confirm.arm(delay, &self.internal_tx)
            }
            Effect::CancelTimer(TimerKind::AutoHide) => self.auto_hide.cancel(),
            Effect::CancelTimer(TimerKind::PlayConfirm) => self.play_confirm.cancel(),
            Effect::Notify(notification) => {
                debug!("Notifying {:?}", notification);
                self.callbacks.notify(notification);
            }
        }
    }

    async fn dispatch(&mut self, command: EngineCommand) {
        if self.binding.is_none() {
            trace!("No binding, dropping {:?}", command);
            return;
        }

        trace!("Engine call {:?}", command);
        let result = match command {
            EngineCommand::Play => self.engine.play().await,
            EngineCommand::Pause => self.engine.pause().await,
            EngineCommand::Seek(seconds) => {
                let position = Duration::try_from_secs_f64(seconds).unwrap_or_default();
                self.engine.seek(position).await
            }
            EngineCommand::SetVolume(volume) => self.engine.set_volume(volume).await,
            EngineCommand::SetMuted(muted) => self.engine.set_muted(muted).await,
            EngineCommand::SetFullscreen(fullscreen) => {
                self.engine.set_fullscreen(fullscreen).await
            }
        };

        let Err(e) = result else {
            return;
        };

        match command {
            EngineCommand::Play => {
                if !e.is_not_allowed() {
                    warn!("Engine failed to start playback: {}", e);
                }
                self.core.handle_play_rejected();
            }
            EngineCommand::Seek(seconds) => {
                warn!("Engine failed to seek to {:.2}s: {}", seconds, e);
                self.core.handle_seek_failed();
            }
            EngineCommand::SetFullscreen(requested) => {
                warn!(
                    "Fullscreen {} was denied: {}",
                    if requested { "entry" } else { "exit" },
                    e
                );
            }
            command => warn!("Engine call {:?} failed: {}", command, e),
        }
    }

    fn publish(&self) {
        let snapshot = self.core.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }
}

/// Handle to send commands to the player controller
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    sender: mpsc::UnboundedSender<PlayerCommand>,
    snapshots: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    fn send(&self, command: PlayerCommand) {
        if self.sender.send(command).is_err() {
            trace!("Player controller is gone, dropping command");
        }
    }

    pub fn play(&self) {
        self.send(PlayerCommand::Play);
    }

    pub fn pause(&self) {
        self.send(PlayerCommand::Pause);
    }

    pub fn toggle_play(&self) {
        self.send(PlayerCommand::TogglePlay);
    }

    pub fn toggle_mute(&self) {
        self.send(PlayerCommand::ToggleMute);
    }

    /// Set volume (0.0 to 1.0); zero mutes
    pub fn set_volume(&self, volume: f64) {
        self.send(PlayerCommand::SetVolume { volume });
    }

    pub fn adjust_volume(&self, delta: f64) {
        self.send(PlayerCommand::AdjustVolume { delta });
    }

    pub fn seek_to_fraction(&self, fraction: f64) {
        self.send(PlayerCommand::SeekToFraction { fraction });
    }

    pub fn begin_seek_gesture(&self) {
        self.send(PlayerCommand::BeginSeekGesture);
    }

    pub fn end_seek_gesture(&self) {
        self.send(PlayerCommand::EndSeekGesture);
    }

    pub fn skip_by_seconds(&self, seconds: f64) {
        self.send(PlayerCommand::SkipBySeconds { seconds });
    }

    pub fn toggle_fullscreen(&self) {
        self.send(PlayerCommand::ToggleFullscreen);
    }

    pub fn activity(&self, signal: ActivitySignal) {
        self.send(PlayerCommand::Activity { signal });
    }

    pub fn key_pressed(&self, key: Key, modifiers: Modifiers) {
        self.send(PlayerCommand::KeyPressed { key, modifiers });
    }

    /// Snapshot after every command sent before this call was processed
    pub async fn snapshot(&self) -> PlaybackResult<PlayerSnapshot> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PlayerCommand::GetSnapshot { respond_to })
            .map_err(|_| PlaybackError::Disconnected)?;
        response.await.map_err(|_| PlaybackError::Disconnected)
    }

    /// Receiver for every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    pub async fn set_source(
        &self,
        source: MediaSource,
        options: PlaybackOptions,
    ) -> PlaybackResult<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PlayerCommand::SetSource {
                source,
                options,
                respond_to,
            })
            .map_err(|_| PlaybackError::Disconnected)?;
        response.await.map_err(|_| PlaybackError::Disconnected)?
    }

    /// Tear the controller down; resolves once the engine was released
    pub async fn detach(&self) -> PlaybackResult<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PlayerCommand::Detach { respond_to })
            .map_err(|_| PlaybackError::Disconnected)?;
        response.await.map_err(|_| PlaybackError::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
