pub mod binding;
pub mod controller;
pub mod controls_visibility;
mod core;
#[cfg(feature = "gstreamer")]
pub mod gstreamer_player;
pub mod keyboard;
pub mod simulated;
mod state_machine;
pub mod timer;
mod transport;
pub mod traits;
pub mod types;

pub use binding::{BoundEvent, EngineBinding, EventNormalizer};
pub use controller::{PlaybackCallbacks, PlayerCommand, PlayerController, PlayerHandle};
pub use controls_visibility::{ActivitySignal, ControlState};
pub use core::{
    CoreSettings, Effect, EngineCommand, Notification, PlaybackCore, PlaybackIntent, TimerKind,
};
#[cfg(feature = "gstreamer")]
pub use gstreamer_player::GStreamerEngine;
pub use keyboard::{Key, KeyAction, KeyBindings, Modifiers};
pub use simulated::{AutoplayPolicy, SimulatedEngine, SimulatedEngineOptions};
pub use timer::{TimerFired, TimerSlot};
pub use traits::{EngineListener, ListenerId, MediaEngine};
pub use types::{CredentialsMode, EngineEvent, EngineSettings, NativeEvent, PreloadPolicy};
