use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

use super::MediaSource;

/// Displayed playback state. `Buffering` and `Seeking` are overlays: the
/// state they shadow is kept in [`PlaybackSession::underlying_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Buffering,
    Seeking,
    Errored,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Buffering => "buffering",
            Self::Seeking => "seeking",
            Self::Errored => "errored",
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Buffering | Self::Seeking)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized projection of one engine's playback, rebuilt from events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSession {
    pub session_id: Uuid,
    pub source: MediaSource,
    pub state: PlaybackState,
    pub underlying_state: PlaybackState,
    /// Seconds
    pub current_time: f64,
    /// Seconds; unknown until metadata loads, then fixed
    pub duration: Option<f64>,
    pub buffered_fraction: f64,
    /// Displayed volume, zero while muted
    pub volume: f64,
    /// Volume restored on unmute
    pub restore_volume: f64,
    pub is_muted: bool,
    pub is_fullscreen: bool,
    pub error: Option<String>,
}

impl PlaybackSession {
    pub fn new(source: MediaSource, restore_volume: f64, is_muted: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            source,
            state: PlaybackState::Idle,
            underlying_state: PlaybackState::Idle,
            current_time: 0.0,
            duration: None,
            buffered_fraction: 0.0,
            volume: if is_muted { 0.0 } else { restore_volume },
            restore_volume,
            is_muted,
            is_fullscreen: false,
            error: None,
        }
    }

    /// Fraction of the resource played, when the duration is known
    pub fn progress_fraction(&self) -> Option<f64> {
        self.duration
            .filter(|d| *d > 0.0)
            .map(|d| (self.current_time / d).clamp(0.0, 1.0))
    }

    pub fn remaining(&self) -> Option<f64> {
        self.duration.map(|d| (d - self.current_time).max(0.0))
    }
}

/// Ephemeral visibility of the on-screen control surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsVisibility {
    pub visible: bool,
    pub hovering: bool,
    #[serde(skip)]
    pub last_activity_at: Instant,
}

/// An in-progress drag-to-seek interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekGesture {
    pub proposed_fraction: f64,
}

/// Everything a renderer needs, published after every processed message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub session: PlaybackSession,
    pub controls: ControlsVisibility,
    pub seek_gesture: Option<SeekGesture>,
}
