use std::sync::Arc;
use std::time::Duration;

use crate::common::mocks::{EngineCall, MockBehavior, MockEngine};
use crate::common::{CallbackCounts, clip, settle, spawn_player, test_config};
use reel_playback::models::{PlaybackOptions, PlaybackState};
use reel_playback::player::{
    Key, Modifiers, NativeEvent, PlaybackCallbacks, PlayerController, PlayerHandle,
    SimulatedEngine, SimulatedEngineOptions,
};

async fn playing(engine: &Arc<MockEngine>) -> (PlayerHandle, CallbackCounts) {
    let (handle, counts) = spawn_player(engine.clone(), PlaybackOptions::default());
    handle.play();
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Playing);
    (handle, counts)
}

#[tokio::test(start_paused = true)]
async fn test_volume_zero_mutes_and_positive_unmutes() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());

    handle.set_volume(0.6);
    handle.set_volume(0.0);
    let snapshot = settle(&handle).await;
    assert!(snapshot.session.is_muted);
    assert_eq!(snapshot.session.volume, 0.0);
    assert_eq!(snapshot.session.restore_volume, 0.6);

    handle.set_volume(0.3);
    let snapshot = settle(&handle).await;
    assert!(!snapshot.session.is_muted);
    assert_eq!(snapshot.session.volume, 0.3);

    handle.set_volume(7.0);
    assert_eq!(settle(&handle).await.session.volume, 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_mute_twice_restores_volume() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());

    handle.set_volume(0.42);
    handle.toggle_mute();
    let snapshot = settle(&handle).await;
    assert!(snapshot.session.is_muted);
    assert_eq!(snapshot.session.volume, 0.0);

    handle.toggle_mute();
    let snapshot = settle(&handle).await;
    assert!(!snapshot.session.is_muted);
    assert_eq!(snapshot.session.volume, 0.42);
}

#[tokio::test(start_paused = true)]
async fn test_unmute_after_zero_volume_uses_floor() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(
        engine.clone(),
        PlaybackOptions::default().start_muted(true),
    );

    handle.set_volume(0.0);
    handle.toggle_mute();
    let snapshot = settle(&handle).await;
    assert!(!snapshot.session.is_muted);
    assert!(snapshot.session.volume > 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_seek_fraction_is_clamped() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());

    handle.seek_to_fraction(1.5);
    assert_eq!(settle(&handle).await.session.current_time, 120.0);

    handle.seek_to_fraction(-1.0);
    assert_eq!(settle(&handle).await.session.current_time, 0.0);

    assert_eq!(engine.seeks(), vec![Duration::from_secs(120), Duration::ZERO]);
}

#[tokio::test(start_paused = true)]
async fn test_seek_before_duration_is_known_is_ignored() {
    let engine = MockEngine::new(MockBehavior {
        responsive: true,
        ..Default::default()
    });
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());
    settle(&handle).await;

    engine.emit(NativeEvent::LoadStart);
    engine.emit(NativeEvent::LoadedMetadata { duration: f64::NAN });
    engine.emit(NativeEvent::CanPlay);
    handle.seek_to_fraction(0.5);
    handle.skip_by_seconds(10.0);

    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Ready);
    assert_eq!(snapshot.session.current_time, 0.0);
    assert!(engine.seeks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drag_suppresses_time_updates_and_seeks_once() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = playing(&engine).await;

    engine.emit(NativeEvent::TimeUpdate { current_time: 10.0 });
    handle.begin_seek_gesture();
    handle.seek_to_fraction(0.25);
    handle.seek_to_fraction(0.5);
    settle(&handle).await;
    engine.emit(NativeEvent::TimeUpdate { current_time: 11.0 });
    engine.emit(NativeEvent::TimeUpdate { current_time: 12.0 });

    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Seeking);
    assert_eq!(snapshot.session.current_time, 60.0);
    assert_eq!(snapshot.seek_gesture.map(|g| g.proposed_fraction), Some(0.5));
    assert!(engine.seeks().is_empty());

    handle.end_seek_gesture();
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
    assert_eq!(snapshot.session.current_time, 60.0);
    assert!(snapshot.seek_gesture.is_none());
    assert_eq!(engine.seeks(), vec![Duration::from_secs(60)]);

    engine.emit(NativeEvent::TimeUpdate { current_time: 61.0 });
    assert_eq!(settle(&handle).await.session.current_time, 61.0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_is_clamped_to_media() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());

    handle.skip_by_seconds(30.0);
    assert_eq!(settle(&handle).await.session.current_time, 30.0);

    handle.skip_by_seconds(-45.0);
    assert_eq!(settle(&handle).await.session.current_time, 0.0);

    handle.skip_by_seconds(500.0);
    assert_eq!(settle(&handle).await.session.current_time, 120.0);
}

#[tokio::test(start_paused = true)]
async fn test_fullscreen_follows_engine_reports() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());

    handle.toggle_fullscreen();
    assert!(settle(&handle).await.session.is_fullscreen);

    handle.toggle_fullscreen();
    assert!(!settle(&handle).await.session.is_fullscreen);
    assert_eq!(engine.count(&EngineCall::SetFullscreen(true)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_denied_fullscreen_leaves_state_unchanged() {
    let engine = MockEngine::new(MockBehavior {
        auto_ready: Some(120.0),
        responsive: true,
        deny_fullscreen: true,
        ..Default::default()
    });
    let (handle, _counts) = playing(&engine).await;

    handle.toggle_fullscreen();
    let snapshot = settle(&handle).await;
    assert!(!snapshot.session.is_fullscreen);
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
    assert!(snapshot.session.error.is_none());
    assert_eq!(engine.count(&EngineCall::SetFullscreen(true)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_stall_commute() {
    let first = MockEngine::ready(120.0);
    let (pause_first, pause_first_counts) = playing(&first).await;
    pause_first.pause();
    settle(&pause_first).await;
    first.emit(NativeEvent::Waiting);

    let second = MockEngine::ready(120.0);
    let (stall_first, stall_first_counts) = playing(&second).await;
    second.emit(NativeEvent::Waiting);
    stall_first.pause();

    let a = settle(&pause_first).await.session;
    let b = settle(&stall_first).await.session;
    assert_eq!(a.state, PlaybackState::Buffering);
    assert_eq!(a.state, b.state);
    assert_eq!(a.underlying_state, PlaybackState::Paused);
    assert_eq!(a.underlying_state, b.underlying_state);
    assert_eq!(pause_first_counts.paused(), 1);
    assert_eq!(stall_first_counts.paused(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_buffering_does_not_notify_pause() {
    let engine = MockEngine::ready(120.0);
    let (handle, counts) = playing(&engine).await;

    engine.emit(NativeEvent::Waiting);
    engine.emit(NativeEvent::Stalled);
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Buffering);
    assert_eq!(snapshot.session.underlying_state, PlaybackState::Playing);

    engine.emit(NativeEvent::CanPlayThrough);
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Playing);
    assert_eq!(counts.played(), 1);
    assert_eq!(counts.paused(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_end_of_media_pauses_and_notifies() {
    let engine = MockEngine::ready(120.0);
    let (handle, counts) = playing(&engine).await;

    engine.emit(NativeEvent::TimeUpdate { current_time: 120.0 });
    engine.emit(NativeEvent::Pause);
    engine.emit(NativeEvent::Ended);
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Paused);
    assert_eq!(snapshot.session.current_time, 120.0);
    assert_eq!(counts.paused(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_keyboard_drives_transport() {
    let engine = MockEngine::ready(120.0);
    let (handle, _counts) = spawn_player(engine.clone(), PlaybackOptions::default());

    handle.key_pressed(Key::Space, Modifiers::NONE);
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Playing);

    handle.key_pressed(Key::Right, Modifiers::NONE);
    handle.key_pressed(Key::Right, Modifiers::CTRL);
    handle.key_pressed(Key::Left, Modifiers::SHIFT);
    assert_eq!(settle(&handle).await.session.current_time, 14.0);

    handle.key_pressed(Key::Char('9'), Modifiers::NONE);
    let volume = settle(&handle).await.session.volume;
    assert!((volume - 0.9).abs() < 1e-9);

    handle.key_pressed(Key::Char('m'), Modifiers::NONE);
    assert!(settle(&handle).await.session.is_muted);

    handle.key_pressed(Key::End, Modifiers::NONE);
    assert_eq!(settle(&handle).await.session.current_time, 120.0);

    handle.key_pressed(Key::Space, Modifiers::NONE);
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_refused_seek_hands_time_back_to_engine() {
    let engine = MockEngine::new(MockBehavior {
        auto_ready: Some(100.0),
        responsive: true,
        fail_seek: true,
        ..Default::default()
    });
    let (handle, _counts) = playing(&engine).await;

    handle.seek_to_fraction(0.5);
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
    assert_eq!(engine.seeks(), vec![Duration::from_secs(50)]);

    engine.emit(NativeEvent::TimeUpdate { current_time: 1.0 });
    engine.emit(NativeEvent::TimeUpdate { current_time: 2.0 });
    tokio::time::sleep(Duration::from_secs(30)).await;

    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
    assert_eq!(snapshot.session.current_time, 2.0);

    handle.pause();
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_play_after_end_restarts_from_zero() {
    let engine = MockEngine::ready(120.0);
    let (handle, counts) = playing(&engine).await;

    engine.emit(NativeEvent::TimeUpdate { current_time: 119.9 });
    engine.emit(NativeEvent::Pause);
    engine.emit(NativeEvent::Ended);
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Paused);
    assert_eq!(snapshot.session.current_time, 120.0);

    handle.play();
    settle(&handle).await;
    engine.emit(NativeEvent::TimeUpdate { current_time: 0.0 });
    engine.emit(NativeEvent::TimeUpdate { current_time: 0.5 });

    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
    assert_eq!(snapshot.session.current_time, 0.5);
    assert_eq!(counts.played(), 2);
    assert_eq!(counts.paused(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_simulated_replay_follows_engine_clock() {
    let engine = SimulatedEngine::new(SimulatedEngineOptions {
        duration: 5.0,
        ..Default::default()
    });
    let handle = PlayerController::spawn(
        Arc::new(engine.clone()),
        clip(),
        PlaybackOptions::default(),
        PlaybackCallbacks::default(),
        &test_config(),
    );

    handle.play();
    assert_eq!(settle(&handle).await.session.state, PlaybackState::Playing);

    tokio::time::sleep(Duration::from_secs(8)).await;
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Paused);
    assert_eq!(snapshot.session.current_time, 5.0);

    handle.play();
    tokio::time::sleep(Duration::from_secs(2)).await;
    let snapshot = settle(&handle).await;
    assert_eq!(snapshot.session.state, PlaybackState::Playing);
    assert!(snapshot.session.current_time > 1.0);
    assert!(snapshot.session.current_time <= engine.position());
    assert!(snapshot.session.current_time < 5.0);
}
