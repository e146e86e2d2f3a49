use serde::{Deserialize, Serialize};
use tracing::trace;

use super::controls_visibility::ActivitySignal;
use super::core::PlaybackCore;
use crate::config::Config;
use crate::constants::{COARSE_SKIP_STEP_SECONDS, FINE_SKIP_STEP_SECONDS};

/// Keys the controller understands, independent of any toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Space,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    F11,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
    };
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    TogglePlay,
    ToggleFullscreen,
    ToggleMute,
    SkipBy(f64),
    AdjustVolume(f64),
    SeekToStart,
    SeekToEnd,
}

/// Step sizes used when translating keys into commands.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub skip_step: f64,
    pub fine_skip_step: f64,
    pub coarse_skip_step: f64,
    pub volume_step: f64,
}

impl From<&Config> for KeyBindings {
    fn from(config: &Config) -> Self {
        Self {
            skip_step: config.playback.skip_step_seconds,
            fine_skip_step: FINE_SKIP_STEP_SECONDS,
            coarse_skip_step: COARSE_SKIP_STEP_SECONDS,
            volume_step: config.playback.volume_step,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl KeyBindings {
    pub fn action_for(&self, key: Key, modifiers: Modifiers) -> Option<KeyAction> {
        let skip = if modifiers.ctrl {
            self.coarse_skip_step
        } else if modifiers.shift {
            self.fine_skip_step
        } else {
            self.skip_step
        };

        match key {
            Key::Space => Some(KeyAction::TogglePlay),
            Key::F11 | Key::Char('f') => Some(KeyAction::ToggleFullscreen),
            Key::Left => Some(KeyAction::SkipBy(-skip)),
            Key::Right => Some(KeyAction::SkipBy(skip)),
            Key::Char('9') | Key::Down => Some(KeyAction::AdjustVolume(-self.volume_step)),
            Key::Char('0') | Key::Up => Some(KeyAction::AdjustVolume(self.volume_step)),
            Key::Char('m') => Some(KeyAction::ToggleMute),
            Key::Home => Some(KeyAction::SeekToStart),
            Key::End => Some(KeyAction::SeekToEnd),
            _ => None,
        }
    }
}

impl PlaybackCore {
    /// Any key shows the controls, bound or not.
    pub fn handle_key(&mut self, bindings: &KeyBindings, key: Key, modifiers: Modifiers) {
        self.handle_activity(ActivitySignal::KeyPress);

        let Some(action) = bindings.action_for(key, modifiers) else {
            trace!("Unbound key {:?}", key);
            return;
        };

        match action {
            KeyAction::TogglePlay => self.toggle_play(),
            KeyAction::ToggleFullscreen => self.toggle_fullscreen(),
            KeyAction::ToggleMute => self.toggle_mute(),
            KeyAction::SkipBy(delta) => self.skip_by_seconds(delta),
            KeyAction::AdjustVolume(delta) => self.adjust_volume(delta),
            KeyAction::SeekToStart => self.seek_to_start(),
            KeyAction::SeekToEnd => self.seek_to_end(),
        }
    }
}
