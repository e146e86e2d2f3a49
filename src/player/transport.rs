use tracing::{debug, trace};

use super::core::{Effect, EngineCommand, PlaybackCore, PlaybackIntent};
use crate::models::{PlaybackState, SeekGesture};

/// Caller commands. None of them fail; illegal ones are no-ops.
impl PlaybackCore {
    pub fn play(&mut self) {
        if !self.begin_command("play") {
            return;
        }
        match self.base {
            PlaybackState::Idle | PlaybackState::Loading => {
                self.pending_intent = Some(PlaybackIntent::Play);
            }
            PlaybackState::Ready | PlaybackState::Paused => self.start_play(),
            _ => {}
        }
        self.sync_state();
    }

    pub fn pause(&mut self) {
        if !self.begin_command("pause") {
            return;
        }
        match self.base {
            PlaybackState::Idle | PlaybackState::Loading => {
                self.pending_intent = Some(PlaybackIntent::Pause);
            }
            PlaybackState::Ready => {
                self.set_base(PlaybackState::Paused);
                self.push(Effect::Engine(EngineCommand::Pause));
            }
            PlaybackState::Playing => {
                self.cancel_pending_play();
                self.enter_paused();
                self.push(Effect::Engine(EngineCommand::Pause));
            }
            _ => {}
        }
        self.sync_state();
    }

    pub fn toggle_play(&mut self) {
        let wants_play = match self.base {
            PlaybackState::Idle | PlaybackState::Loading => {
                self.pending_intent != Some(PlaybackIntent::Play)
            }
            PlaybackState::Playing => false,
            _ => true,
        };
        if wants_play { self.play() } else { self.pause() }
    }

    /// Flip mute without touching the stored volume.
    pub fn toggle_mute(&mut self) {
        if !self.begin_command("toggle-mute") {
            return;
        }
        if self.session.is_muted {
            if self.session.restore_volume <= 0.0 {
                self.session.restore_volume = self.settings.unmute_volume_floor;
            }
            self.session.is_muted = false;
            self.push(Effect::Engine(EngineCommand::SetVolume(self.session.restore_volume)));
            self.push(Effect::Engine(EngineCommand::SetMuted(false)));
        } else {
            self.session.is_muted = true;
            self.push(Effect::Engine(EngineCommand::SetMuted(true)));
        }
        self.sync_state();
    }

    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() || !self.begin_command("set-volume") {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if volume == 0.0 {
            self.session.is_muted = true;
            self.push(Effect::Engine(EngineCommand::SetVolume(0.0)));
            self.push(Effect::Engine(EngineCommand::SetMuted(true)));
        } else {
            self.session.restore_volume = volume;
            self.session.is_muted = false;
            self.push(Effect::Engine(EngineCommand::SetVolume(volume)));
            self.push(Effect::Engine(EngineCommand::SetMuted(false)));
        }
        self.sync_state();
    }

    /// Relative change from the displayed volume
    pub fn adjust_volume(&mut self, delta: f64) {
        self.set_volume(self.session.volume + delta);
    }

    pub fn seek_to_fraction(&mut self, fraction: f64) {
        if fraction.is_nan() || !self.begin_command("seek") {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);

        if let Some(gesture) = self.gesture.as_mut() {
            gesture.proposed_fraction = fraction;
            self.show_proposed_time();
        } else if self.base == PlaybackState::Idle {
            trace!("Seek before load ignored");
        } else if let Some(duration) = self.session.duration {
            self.forward_seek(fraction * duration);
        } else {
            debug!("Seek to {:.3} ignored, duration unknown", fraction);
        }
        self.sync_state();
    }

    pub fn seek_to_start(&mut self) {
        self.seek_to_fraction(0.0);
    }

    pub fn seek_to_end(&mut self) {
        self.seek_to_fraction(1.0);
    }

    pub fn begin_seek_gesture(&mut self) {
        if !self.begin_command("begin-seek-gesture") || self.gesture.is_some() {
            return;
        }
        if !matches!(
            self.base,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
        ) {
            debug!("Seek gesture ignored in {}", self.base);
            return;
        }
        let proposed_fraction = self.session.progress_fraction().unwrap_or(0.0);
        self.gesture = Some(SeekGesture { proposed_fraction });
        self.sync_state();
    }

    /// Commit the gesture as exactly one engine seek.
    pub fn end_seek_gesture(&mut self) {
        if !self.begin_command("end-seek-gesture") {
            return;
        }
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        if let Some(duration) = self.session.duration {
            self.forward_seek(gesture.proposed_fraction * duration);
        }
        self.sync_state();
    }

    pub fn skip_by_seconds(&mut self, delta: f64) {
        if !delta.is_finite() || !self.begin_command("skip") {
            return;
        }

        if let Some(gesture) = self.gesture.as_mut() {
            if let Some(duration) = self.session.duration {
                let proposed = gesture.proposed_fraction * duration + delta;
                gesture.proposed_fraction = (proposed / duration).clamp(0.0, 1.0);
                self.show_proposed_time();
            }
        } else if self.is_pre_ready() {
            self.deferred_skip += delta;
            trace!("Deferring skip, {:+.2}s pending", self.deferred_skip);
        } else if self.session.duration.is_some() {
            self.forward_seek(self.session.current_time + delta);
        } else {
            debug!("Skip of {:+.2}s ignored, duration unknown", delta);
        }
        self.sync_state();
    }

    /// Ask for the opposite of the current fullscreen state. The flag only
    /// changes when the engine reports the change.
    pub fn toggle_fullscreen(&mut self) {
        if !self.begin_command("toggle-fullscreen") {
            return;
        }
        let requested = !self.session.is_fullscreen;
        self.push(Effect::Engine(EngineCommand::SetFullscreen(requested)));
    }

    /// Every command counts as activity. Returns whether the command applies.
    fn begin_command(&mut self, name: &str) -> bool {
        if !self.is_active() {
            trace!("Ignoring {} on inactive session", name);
            return false;
        }
        trace!("Command {}", name);
        self.reveal_controls();
        true
    }

    fn show_proposed_time(&mut self) {
        if let (Some(gesture), Some(duration)) = (self.gesture, self.session.duration) {
            self.session.current_time = gesture.proposed_fraction * duration;
        }
    }
}
