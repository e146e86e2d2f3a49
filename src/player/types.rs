/// Common types shared by engine backends and the playback core
use serde::{Deserialize, Serialize};

/// How much of the resource the engine fetches before playback is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreloadPolicy {
    None,
    #[default]
    Metadata,
    Auto,
}

/// Credentials the engine attaches to its own resource requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsMode {
    Anonymous,
    #[default]
    SameOrigin,
    Include,
}

impl PreloadPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreloadPolicy::None => "none",
            PreloadPolicy::Metadata => "metadata",
            PreloadPolicy::Auto => "auto",
        }
    }
}

impl CredentialsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialsMode::Anonymous => "anonymous",
            CredentialsMode::SameOrigin => "same-origin",
            CredentialsMode::Include => "include",
        }
    }
}

/// One-time engine configuration applied on every bind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub preload: PreloadPolicy,

    #[serde(default = "default_true")]
    pub inline_playback: bool,

    #[serde(default = "default_true")]
    pub hardware_acceleration: bool,

    #[serde(default)]
    pub credentials: CredentialsMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            preload: PreloadPolicy::default(),
            inline_playback: default_true(),
            hardware_acceleration: default_true(),
            credentials: CredentialsMode::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Raw events in the engine's own vocabulary. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    LoadStart,
    LoadedMetadata { duration: f64 },
    CanPlay,
    CanPlayThrough,
    /// Playback was requested; says nothing about frames advancing
    Play,
    Playing,
    Pause,
    Ended,
    TimeUpdate { current_time: f64 },
    Progress { buffered_end: f64 },
    Waiting,
    Stalled,
    Seeking,
    Seeked,
    VolumeChange { volume: f64, muted: bool },
    FullscreenChange { fullscreen: bool },
    Error { message: String },
}

/// Engine-agnostic events consumed by the playback state machine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    LoadStart,
    MetadataReady { duration: Option<f64> },
    CanPlay,
    PlayBegin,
    PlayEnd,
    /// Playback reached the end of the media
    Ended,
    TimeAdvanced(f64),
    BufferProgress(f64),
    BufferStall,
    BufferResume,
    SeekBegin,
    SeekEnd,
    VolumeChanged { volume: f64, muted: bool },
    FullscreenChanged(bool),
    /// Terminal: the source cannot be played
    LoadError(String),
}

impl EngineEvent {
    /// Short name used in trace logs
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::LoadStart => "load-start",
            EngineEvent::MetadataReady { .. } => "metadata-ready",
            EngineEvent::CanPlay => "can-play",
            EngineEvent::PlayBegin => "play-begin",
            EngineEvent::PlayEnd => "play-end",
            EngineEvent::Ended => "ended",
            EngineEvent::TimeAdvanced(_) => "time-advanced",
            EngineEvent::BufferProgress(_) => "buffer-progress",
            EngineEvent::BufferStall => "buffer-stall",
            EngineEvent::BufferResume => "buffer-resume",
            EngineEvent::SeekBegin => "seek-begin",
            EngineEvent::SeekEnd => "seek-end",
            EngineEvent::VolumeChanged { .. } => "volume-changed",
            EngineEvent::FullscreenChanged(_) => "fullscreen-changed",
            EngineEvent::LoadError(_) => "load-error",
        }
    }
}
