use std::time::Duration;

use crate::common::mocks::MockEngine;
use crate::common::{inactivity_timeout, settle, spawn_player};
use reel_playback::models::{PlaybackOptions, PlaybackState};
use reel_playback::player::{ActivitySignal, Key, Modifiers, NativeEvent, PlayerHandle};

const TICK: Duration = Duration::from_millis(1);

async fn playing_handle() -> PlayerHandle {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine, PlaybackOptions::default());
    handle.play();
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Playing);
    handle
}

#[tokio::test(start_paused = true)]
async fn test_controls_hide_exactly_after_inactivity() {
    let handle = playing_handle().await;

    tokio::time::sleep(inactivity_timeout() - TICK).await;
    assert!(settle(&handle).await.controls.visible);

    tokio::time::sleep(TICK * 2).await;
    assert!(!settle(&handle).await.controls.visible);
}

#[tokio::test(start_paused = true)]
async fn test_controls_stay_visible_when_not_playing() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine, PlaybackOptions::default());
    settle(&handle).await;

    tokio::time::sleep(inactivity_timeout() * 5).await;
    assert!(settle(&handle).await.controls.visible);

    handle.play();
    handle.pause();
    tokio::time::sleep(inactivity_timeout() * 5).await;
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Paused);
    assert!(snapshot.controls.visible);
}

#[tokio::test(start_paused = true)]
async fn test_pausing_reveals_hidden_controls() {
    let handle = playing_handle().await;

    tokio::time::sleep(inactivity_timeout() + TICK).await;
    assert!(!settle(&handle).await.controls.visible);

    handle.pause();
    assert!(settle(&handle).await.controls.visible);
}

#[tokio::test(start_paused = true)]
async fn test_activity_restarts_countdown() {
    let handle = playing_handle().await;
    let half = inactivity_timeout() / 2;

    tokio::time::sleep(half).await;
    handle.activity(ActivitySignal::PointerMove);
    settle(&handle).await;

    tokio::time::sleep(inactivity_timeout() - TICK).await;
    assert!(settle(&handle).await.controls.visible);

    tokio::time::sleep(TICK * 2).await;
    assert!(!settle(&handle).await.controls.visible);
}

#[tokio::test(start_paused = true)]
async fn test_hovering_pins_controls() {
    let handle = playing_handle().await;

    handle.activity(ActivitySignal::PointerEnter);
    tokio::time::sleep(inactivity_timeout() * 3).await;
    let snapshot = settle(&handle).await;
    assert!(snapshot.controls.visible);
    assert!(snapshot.controls.hovering);

    handle.activity(ActivitySignal::PointerLeave);
    settle(&handle).await;
    tokio::time::sleep(inactivity_timeout() + TICK).await;
    let snapshot = settle(&handle).await;
    assert!(!snapshot.controls.visible);
    assert!(!snapshot.controls.hovering);
}

#[tokio::test(start_paused = true)]
async fn test_any_key_reveals_controls() {
    let handle = playing_handle().await;

    tokio::time::sleep(inactivity_timeout() + TICK).await;
    assert!(!settle(&handle).await.controls.visible);

    handle.key_pressed(Key::Char('x'), Modifiers::NONE);
    let snapshot = settle(&handle).await;
    assert!(snapshot.controls.visible);
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_engine_events_do_not_count_as_activity() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());
    handle.play();
    settle(&handle).await;

    for second in 1..=5 {
        engine.emit(NativeEvent::TimeUpdate {
            current_time: second as f64,
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert!(!settle(&handle).await.controls.visible);
}
