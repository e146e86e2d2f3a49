use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::types::{EngineSettings, NativeEvent};
use crate::models::MediaSource;
use crate::utils::PlaybackResult;

/// Callback an engine invokes for every native event it produces.
pub type EngineListener = Arc<dyn Fn(NativeEvent) + Send + Sync>;

/// Token returned by [`MediaEngine::subscribe`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// A native media playback primitive.
///
/// Every command is fire-and-forget: returning `Ok` only means the engine
/// accepted the request. Actual progress is reported through the
/// subscribed listeners, which may be invoked from any thread, including
/// synchronously from inside a command.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    fn name(&self) -> &str;
    fn subscribe(&self, listener: EngineListener) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
    async fn configure(&self, settings: &EngineSettings) -> PlaybackResult<()>;
    async fn load(&self, source: &MediaSource) -> PlaybackResult<()>;
    async fn play(&self) -> PlaybackResult<()>;
    async fn pause(&self) -> PlaybackResult<()>;
    async fn seek(&self, position: Duration) -> PlaybackResult<()>;
    async fn set_volume(&self, volume: f64) -> PlaybackResult<()>;
    async fn set_muted(&self, muted: bool) -> PlaybackResult<()>;
    async fn set_fullscreen(&self, fullscreen: bool) -> PlaybackResult<()>;
    /// Drop the loaded resource; the engine may be loaded again afterwards
    async fn release(&self) -> PlaybackResult<()>;
}
