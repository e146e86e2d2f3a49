use tracing::{debug, info, trace, warn};

use super::core::{Effect, EngineCommand, PlaybackCore, PlaybackIntent, TimerKind};
use super::types::EngineEvent;
use crate::models::PlaybackState;

/// Engine event handling
impl PlaybackCore {
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if !self.is_active() {
            trace!("Ignoring {} on inactive session", event.name());
            return;
        }

        match event {
            EngineEvent::LoadStart => self.ensure_loading(),
            EngineEvent::MetadataReady { duration } => {
                self.ensure_loading();
                self.apply_duration(duration);
            }
            EngineEvent::CanPlay => {
                self.ensure_loading();
                if self.base == PlaybackState::Loading {
                    self.enter_ready();
                }
            }
            EngineEvent::PlayBegin => self.handle_play_begin(),
            EngineEvent::PlayEnd => self.handle_play_end(),
            EngineEvent::Ended => {
                if let Some(duration) = self.session.duration {
                    self.session.current_time = duration;
                }
                self.at_end = true;
            }
            EngineEvent::TimeAdvanced(seconds) => self.accept_time(seconds),
            EngineEvent::BufferProgress(fraction) => self.accept_buffer_progress(fraction),
            EngineEvent::BufferStall => {
                if !self.buffering {
                    debug!("Engine stalled at {:.2}s", self.session.current_time);
                    self.buffering = true;
                }
            }
            EngineEvent::BufferResume => self.buffering = false,
            EngineEvent::SeekBegin => {
                if std::mem::take(&mut self.ignore_seek_begin) {
                    trace!("Ignoring seek-begin of a refused seek");
                } else {
                    self.engine_seeking = true;
                }
            }
            EngineEvent::SeekEnd => {
                self.ignore_seek_begin = false;
                self.engine_seeking = false;
                self.seek_in_flight = false;
                self.resync = true;
            }
            EngineEvent::VolumeChanged { volume, muted } => {
                if volume <= 0.0 {
                    // Volume zero is reported as muted; the stored volume stays
                    self.session.is_muted = true;
                } else {
                    self.session.restore_volume = volume;
                    self.session.is_muted = muted;
                }
            }
            EngineEvent::FullscreenChanged(fullscreen) => {
                self.session.is_fullscreen = fullscreen;
            }
            EngineEvent::LoadError(message) => self.enter_errored(message),
        }

        self.sync_state();
    }

    /// The engine did not confirm an optimistic play in time.
    pub fn handle_play_confirm_timeout(&mut self) {
        if !self.is_active() || !self.play_pending {
            trace!("Stale play confirmation timeout");
            return;
        }
        info!(
            "Playback was not confirmed within {:?}, reconciling to paused",
            self.settings.play_confirm_timeout
        );
        self.rollback_play();
        self.push(Effect::Engine(EngineCommand::Pause));
        self.sync_state();
    }

    /// The engine refused to start playback (autoplay policy).
    pub fn handle_play_rejected(&mut self) {
        if !self.is_active() || !self.play_pending {
            return;
        }
        info!("Engine refused playback, reconciling to paused");
        self.rollback_play();
        self.sync_state();
    }

    /// The engine refused a forwarded seek. It stays wherever it was, so
    /// its next reported position is taken as is.
    pub fn handle_seek_failed(&mut self) {
        if !self.is_active() {
            return;
        }
        debug!(
            "Seek to {:.2}s not applied, following the engine position",
            self.session.current_time
        );
        self.ignore_seek_begin = !self.engine_seeking;
        self.seek_in_flight = false;
        self.engine_seeking = false;
        self.resync = true;
        self.sync_state();
    }

    /// Everything before `ready` passes through `loading`.
    fn ensure_loading(&mut self) {
        if self.base == PlaybackState::Idle {
            self.set_base(PlaybackState::Loading);
            self.sync_state();
        }
    }

    fn apply_duration(&mut self, duration: Option<f64>) {
        match (self.session.duration, duration) {
            (None, Some(duration)) => {
                debug!("Duration known: {:.2}s", duration);
                self.session.duration = Some(duration);
                self.session.current_time = self.clamp_time(self.session.current_time);
            }
            (Some(known), Some(reported)) if known != reported => {
                trace!("Ignoring duration change {:.2}s -> {:.2}s", known, reported);
            }
            _ => {}
        }
    }

    fn enter_ready(&mut self) {
        self.set_base(PlaybackState::Ready);
        self.sync_state();

        if self.deferred_skip != 0.0 {
            let delta = std::mem::take(&mut self.deferred_skip);
            if self.session.duration.is_some() {
                debug!("Applying deferred skip of {:+.2}s", delta);
                self.forward_seek(self.session.current_time + delta);
            } else {
                debug!("Dropping deferred skip of {:+.2}s, duration unknown", delta);
            }
        }

        match self.pending_intent.take() {
            Some(PlaybackIntent::Play) => self.start_play(),
            Some(PlaybackIntent::Pause) => {
                self.set_base(PlaybackState::Paused);
                self.push(Effect::Engine(EngineCommand::Pause));
            }
            None => {}
        }
    }

    fn handle_play_begin(&mut self) {
        self.ensure_loading();
        self.restart_if_ended();
        if self.base == PlaybackState::Loading {
            self.enter_ready();
        }

        match self.base {
            PlaybackState::Ready | PlaybackState::Paused => {
                self.set_base(PlaybackState::Playing);
                self.confirm_play();
            }
            PlaybackState::Playing => self.confirm_play(),
            _ => {}
        }
    }

    fn handle_play_end(&mut self) {
        if self.base != PlaybackState::Playing {
            return;
        }
        if self.play_pending {
            info!("Engine ended playback before confirming it, reconciling to paused");
            self.rollback_play();
        } else {
            self.enter_paused();
        }
    }

    fn accept_time(&mut self, seconds: f64) {
        if self.gesture.is_some() || self.seek_in_flight {
            trace!("Time update {:.2}s suppressed during seek", seconds);
            return;
        }

        let seconds = self.clamp_time(seconds);
        if self.resync {
            self.resync = false;
            self.session.current_time = seconds;
        } else if seconds >= self.session.current_time {
            self.session.current_time = seconds;
        } else {
            trace!(
                "Dropping backwards time update {:.2}s < {:.2}s",
                seconds,
                self.session.current_time
            );
        }
    }

    fn accept_buffer_progress(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction >= self.session.buffered_fraction || self.allow_buffer_regress {
            self.session.buffered_fraction = fraction;
            self.allow_buffer_regress = false;
        }
    }

    fn enter_errored(&mut self, message: String) {
        warn!(
            "Session {} failed to play {}: {}",
            self.session.session_id,
            self.session.source.display_name(),
            message
        );

        self.cancel_pending_play();
        self.push(Effect::CancelTimer(TimerKind::AutoHide));
        self.set_base(PlaybackState::Errored);
        self.session.error = Some(message);
        self.buffering = false;
        self.engine_seeking = false;
        self.gesture = None;
        self.pending_intent = None;
        self.seek_in_flight = false;
        self.deferred_skip = 0.0;
        self.announced_playing = false;
    }
}
