use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::controls_visibility::ControlState;
use crate::config::Config;
use crate::models::{
    ControlsVisibility, MediaSource, PlaybackOptions, PlaybackSession, PlaybackState,
    PlayerSnapshot, SeekGesture,
};

/// A call the controller must make on the engine. Seek targets are seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetMuted(bool),
    SetFullscreen(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    AutoHide,
    PlayConfirm,
}

/// Caller-visible transitions, delivered through the playback callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Played,
    Paused,
}

/// Side effects produced by the core and executed by the controller task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Engine(EngineCommand),
    ArmTimer(TimerKind, Duration),
    CancelTimer(TimerKind),
    Notify(Notification),
}

/// Play/pause requested before the source was ready. Last writer wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIntent {
    Play,
    Pause,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreSettings {
    pub play_confirm_timeout: Duration,
    pub inactivity_timeout: Duration,
    pub unmute_volume_floor: f64,
    pub initial_volume: f64,
}

impl From<&Config> for CoreSettings {
    fn from(config: &Config) -> Self {
        Self {
            play_confirm_timeout: config.playback.play_confirm_timeout(),
            inactivity_timeout: config.controls.inactivity_timeout(),
            unmute_volume_floor: config.playback.unmute_volume_floor,
            initial_volume: config.playback.initial_volume,
        }
    }
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Synchronous playback state machine.
///
/// The core never performs I/O. Engine calls, timers and callbacks are
/// queued as [`Effect`]s which the owner drains with [`take_effects`] after
/// every input. Its methods are split by concern: engine events live in
/// `state_machine.rs`, caller commands in `transport.rs` and the controls
/// surface in `controls_visibility.rs`.
///
/// [`take_effects`]: PlaybackCore::take_effects
pub struct PlaybackCore {
    pub(super) session: PlaybackSession,
    pub(super) options: PlaybackOptions,
    pub(super) settings: CoreSettings,

    /// Base state; never one of the overlay states
    pub(super) base: PlaybackState,
    pub(super) buffering: bool,
    pub(super) engine_seeking: bool,
    pub(super) gesture: Option<SeekGesture>,

    pub(super) pending_intent: Option<PlaybackIntent>,
    /// Optimistic `playing` waiting for the engine's confirmation
    pub(super) play_pending: bool,
    /// Whether `on_play` fired for the current stretch of playback
    pub(super) announced_playing: bool,

    /// A forwarded seek has not been acknowledged yet
    pub(super) seek_in_flight: bool,
    /// Accept the next time update regardless of direction
    pub(super) resync: bool,
    /// A refused seek may still announce itself; that seek-begin is ignored
    pub(super) ignore_seek_begin: bool,
    /// The engine reported the end of the media; a new play restarts it
    pub(super) at_end: bool,
    pub(super) allow_buffer_regress: bool,
    /// Skip requested before the source was ready, in seconds
    pub(super) deferred_skip: f64,

    pub(super) control_state: ControlState,
    pub(super) last_activity_at: Instant,

    pub(super) detached: bool,
    effects: Vec<Effect>,
}

impl PlaybackCore {
    pub fn new(source: MediaSource, options: PlaybackOptions, settings: CoreSettings) -> Self {
        let session = PlaybackSession::new(source, settings.initial_volume, options.start_muted);
        let mut core = Self {
            session,
            options,
            settings,
            base: PlaybackState::Idle,
            buffering: false,
            engine_seeking: false,
            gesture: None,
            pending_intent: None,
            play_pending: false,
            announced_playing: false,
            seek_in_flight: false,
            resync: false,
            ignore_seek_begin: false,
            at_end: false,
            allow_buffer_regress: false,
            deferred_skip: 0.0,
            control_state: ControlState::Visible { countdown: false },
            last_activity_at: Instant::now(),
            detached: false,
            effects: Vec::new(),
        };
        core.seed_intent();
        core
    }

    /// Start over with a new source, keeping the volume and mute preference.
    pub fn rebind(&mut self, source: MediaSource, options: PlaybackOptions) {
        debug!(
            "Rebinding session {} to {}",
            self.session.session_id,
            source.display_name()
        );

        if self.play_pending {
            self.push(Effect::CancelTimer(TimerKind::PlayConfirm));
        }

        let restore_volume = self.session.restore_volume;
        let is_muted = self.session.is_muted;
        let is_fullscreen = self.session.is_fullscreen;

        self.session = PlaybackSession::new(source, restore_volume, is_muted);
        self.session.is_fullscreen = is_fullscreen;
        self.options = options;
        self.base = PlaybackState::Idle;
        self.buffering = false;
        self.engine_seeking = false;
        self.gesture = None;
        self.pending_intent = None;
        self.play_pending = false;
        self.announced_playing = false;
        self.seek_in_flight = false;
        self.resync = false;
        self.ignore_seek_begin = false;
        self.at_end = false;
        self.allow_buffer_regress = false;
        self.deferred_skip = 0.0;
        self.detached = false;

        self.seed_intent();
        self.on_displayed_state_changed();
    }

    fn seed_intent(&mut self) {
        if self.options.auto_play {
            self.pending_intent = Some(PlaybackIntent::Play);
        }
    }

    /// Push the stored volume and mute preference to a freshly loaded engine
    pub fn apply_preferences(&mut self) {
        if !self.is_active() {
            return;
        }
        self.push(Effect::Engine(EngineCommand::SetVolume(self.session.restore_volume)));
        self.push(Effect::Engine(EngineCommand::SetMuted(self.session.is_muted)));
    }

    /// Stop reacting to anything. Timers are cancelled by the owner.
    pub fn detach(&mut self) {
        self.detached = true;
        self.pending_intent = None;
        self.gesture = None;
        self.play_pending = false;
    }

    pub fn is_active(&self) -> bool {
        !self.detached && self.base != PlaybackState::Errored
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn seek_gesture(&self) -> Option<SeekGesture> {
        self.gesture
    }

    pub fn pending_intent(&self) -> Option<PlaybackIntent> {
        self.pending_intent
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            session: self.session.clone(),
            controls: ControlsVisibility {
                visible: self.controls_visible(),
                hovering: self.control_state == ControlState::Hovering,
                last_activity_at: self.last_activity_at,
            },
            seek_gesture: self.gesture,
        }
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub(super) fn push(&mut self, effect: Effect) {
        trace!("Queued effect {:?}", effect);
        self.effects.push(effect);
    }

    pub(super) fn is_seeking(&self) -> bool {
        self.gesture.is_some() || self.engine_seeking
    }

    fn displayed_state(&self) -> PlaybackState {
        match self.base {
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
                if self.is_seeking() =>
            {
                PlaybackState::Seeking
            }
            PlaybackState::Playing | PlaybackState::Paused if self.buffering => {
                PlaybackState::Buffering
            }
            base => base,
        }
    }

    /// Recompute the displayed state after a mutation and react to changes.
    pub(super) fn sync_state(&mut self) {
        self.sync_volume();

        let displayed = self.displayed_state();
        self.session.underlying_state = self.base;
        if displayed != self.session.state {
            debug!(
                "Session {}: {} -> {} (base {})",
                self.session.session_id, self.session.state, displayed, self.base
            );
            self.session.state = displayed;
            self.on_displayed_state_changed();
        }
    }

    pub(super) fn sync_volume(&mut self) {
        self.session.volume = if self.session.is_muted {
            0.0
        } else {
            self.session.restore_volume
        };
    }

    pub(super) fn set_base(&mut self, state: PlaybackState) {
        if self.base != state {
            trace!("Base state {} -> {}", self.base, state);
            self.base = state;
        }
    }

    /// Optimistically show `playing` and ask the engine to confirm it.
    pub(super) fn start_play(&mut self) {
        self.restart_if_ended();
        self.set_base(PlaybackState::Playing);
        self.play_pending = true;
        self.push(Effect::Engine(EngineCommand::Play));
        self.push(Effect::ArmTimer(
            TimerKind::PlayConfirm,
            self.settings.play_confirm_timeout,
        ));
    }

    /// Playing again after the end rewinds inside the engine without a
    /// seek, so its next position is trusted whatever the direction.
    pub(super) fn restart_if_ended(&mut self) {
        if std::mem::take(&mut self.at_end) {
            debug!("Restarting from the end of the media");
            self.resync = true;
        }
    }

    pub(super) fn confirm_play(&mut self) {
        if self.play_pending {
            self.play_pending = false;
            self.push(Effect::CancelTimer(TimerKind::PlayConfirm));
        }
        if !self.announced_playing {
            self.announced_playing = true;
            self.push(Effect::Notify(Notification::Played));
        }
    }

    /// Undo an unconfirmed play. Never announced, so never notified.
    pub(super) fn rollback_play(&mut self) {
        self.cancel_pending_play();
        self.set_base(PlaybackState::Paused);
    }

    pub(super) fn cancel_pending_play(&mut self) {
        if self.play_pending {
            self.play_pending = false;
            self.push(Effect::CancelTimer(TimerKind::PlayConfirm));
        }
    }

    pub(super) fn enter_paused(&mut self) {
        self.set_base(PlaybackState::Paused);
        if self.announced_playing {
            self.announced_playing = false;
            self.push(Effect::Notify(Notification::Paused));
        }
    }

    /// Forward a seek to `target` seconds and display it immediately.
    pub(super) fn forward_seek(&mut self, target: f64) {
        let target = self.clamp_time(target);
        self.session.current_time = target;
        self.seek_in_flight = true;
        self.resync = false;
        self.ignore_seek_begin = false;
        self.at_end = false;
        self.allow_buffer_regress = true;
        self.push(Effect::Engine(EngineCommand::Seek(target)));
    }

    pub(super) fn clamp_time(&self, seconds: f64) -> f64 {
        match self.session.duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        }
    }

    pub(super) fn is_pre_ready(&self) -> bool {
        matches!(self.base, PlaybackState::Idle | PlaybackState::Loading)
    }
}
