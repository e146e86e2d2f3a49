pub mod mocks;

use reel_playback::{
    config::Config,
    models::{MediaSource, PlaybackOptions, PlayerSnapshot},
    player::{PlaybackCallbacks, PlayerController, PlayerHandle},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mocks::MockEngine;

pub const CLIP_URL: &str = "https://media.example.com/clip.mp4";

/// Counts of on_play / on_pause invocations
#[derive(Clone, Default)]
pub struct CallbackCounts {
    played: Arc<AtomicUsize>,
    paused: Arc<AtomicUsize>,
}

impl CallbackCounts {
    pub fn played(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }

    pub fn paused(&self) -> usize {
        self.paused.load(Ordering::SeqCst)
    }

    fn callbacks(&self) -> PlaybackCallbacks {
        let played = self.played.clone();
        let paused = self.paused.clone();
        PlaybackCallbacks::default()
            .on_play(move || {
                played.fetch_add(1, Ordering::SeqCst);
            })
            .on_pause(move || {
                paused.fetch_add(1, Ordering::SeqCst);
            })
    }
}

pub fn test_config() -> Config {
    Config::default()
}

pub fn clip() -> MediaSource {
    MediaSource::new(CLIP_URL).with_title("Test clip")
}

pub fn spawn_player(
    engine: Arc<MockEngine>,
    options: PlaybackOptions,
) -> (PlayerHandle, CallbackCounts) {
    let counts = CallbackCounts::default();
    let handle = PlayerController::spawn(engine, clip(), options, counts.callbacks(), &test_config());
    (handle, counts)
}

/// Snapshot after everything sent so far was processed
pub async fn settle(handle: &PlayerHandle) -> PlayerSnapshot {
    handle.snapshot().await.expect("controller should be running")
}

pub fn inactivity_timeout() -> Duration {
    test_config().controls.inactivity_timeout()
}

pub fn play_confirm_timeout() -> Duration {
    test_config().playback.play_confirm_timeout()
}
