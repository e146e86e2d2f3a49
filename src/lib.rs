//! Headless media playback controller.
//!
//! A [`PlayerController`] binds one [`MediaEngine`] to one [`MediaSource`],
//! normalizes the engine's events into a [`PlaybackSession`], exposes
//! transport commands through a cloneable [`PlayerHandle`] and times the
//! visibility of an on-screen control surface.

pub mod config;
pub mod constants;
pub mod models;
pub mod player;
pub mod utils;

pub use config::Config;
pub use models::{
    ControlsVisibility, MediaSource, PlaybackOptions, PlaybackSession, PlaybackState,
    PlayerSnapshot, PosterRef, SeekGesture, SourceRef,
};
pub use player::{
    ActivitySignal, Key, MediaEngine, Modifiers, PlaybackCallbacks, PlayerController,
    PlayerHandle, SimulatedEngine,
};
pub use utils::{PlaybackError, PlaybackResult};
