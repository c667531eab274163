//! Idle-disconnect behaviour, driven on a paused clock.

use pretty_assertions::assert_eq;
use rusty_dj::commands::music::utils::{guild_session::PlayerState, queue_manager::QueueItem};
use std::sync::Arc;
use std::time::Duration;

use crate::common::Harness;
use crate::common::fixtures::{IDLE_TIMEOUT, settings, voice_channel};
use crate::common::mocks::{FakeResolver, TransportEvent};

/// Play one track to completion so the session is idle but still connected.
async fn idle_harness() -> Harness {
    let mut harness = Harness::new(Arc::new(FakeResolver::new()), settings(false));
    harness
        .session
        .enqueue(QueueItem::new("A"), harness.origin.clone())
        .await
        .unwrap();
    assert_eq!(harness.next_played().await, "A");
    harness.transport.finish_track();
    harness.wait_for_state(PlayerState::Idle).await;
    harness
}

/// Tests that an idle session leaves voice exactly once after the timeout.
#[tokio::test(start_paused = true)]
async fn test_idle_timeout_disconnects_once() {
    // Arrange
    let mut harness = idle_harness().await;

    // Act
    tokio::time::sleep(IDLE_TIMEOUT + Duration::from_secs(1)).await;

    // Assert
    assert_eq!(harness.next_event().await, TransportEvent::Disconnected);
    let snapshot = harness.session.snapshot().await.unwrap();
    assert!(!snapshot.connected);
    assert!(!snapshot.idle_timer_active);
    assert_eq!(snapshot.state, PlayerState::Idle);

    assert_eq!(harness.next_notice().await, "🎵 Now Playing");
    assert_eq!(harness.next_notice().await, "📭 Queue Finished");
    assert_eq!(harness.next_notice().await, "👋 Left Voice Channel");

    tokio::time::sleep(IDLE_TIMEOUT * 2).await;
    harness.assert_no_event();
}

#[tokio::test(start_paused = true)]
async fn test_no_disconnect_before_timeout() {
    let mut harness = idle_harness().await;

    tokio::time::sleep(IDLE_TIMEOUT - Duration::from_secs(1)).await;

    harness.assert_no_event();
    assert!(harness.session.snapshot().await.unwrap().connected);
}

/// Tests that new work cancels the pending disconnect, and that the timer is
/// armed again from scratch once the session drains a second time.
#[tokio::test(start_paused = true)]
async fn test_enqueue_cancels_idle_timer() {
    let mut harness = idle_harness().await;
    tokio::time::sleep(IDLE_TIMEOUT / 2).await;

    harness
        .session
        .enqueue(QueueItem::new("B"), harness.origin.clone())
        .await
        .unwrap();
    assert!(!harness.session.snapshot().await.unwrap().idle_timer_active);
    assert_eq!(harness.next_played().await, "B");

    // A long track outlives the old deadline without being cut off.
    tokio::time::sleep(IDLE_TIMEOUT * 2).await;
    harness.assert_no_event();
    assert_eq!(harness.session.state(), PlayerState::Playing);

    harness.transport.finish_track();
    harness.wait_for_state(PlayerState::Idle).await;
    tokio::time::sleep(IDLE_TIMEOUT + Duration::from_secs(1)).await;
    assert_eq!(harness.next_event().await, TransportEvent::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_paused_session_stays_connected() {
    let mut harness = Harness::new(Arc::new(FakeResolver::new()), settings(false));
    harness
        .session
        .enqueue(QueueItem::new("A"), harness.origin.clone())
        .await
        .unwrap();
    harness.next_played().await;
    harness.session.pause().await.unwrap();
    assert_eq!(harness.next_event().await, TransportEvent::Paused);

    tokio::time::sleep(IDLE_TIMEOUT * 2).await;

    harness.assert_no_event();
    let snapshot = harness.session.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Paused);
    assert!(snapshot.connected);
    assert!(!snapshot.idle_timer_active);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_idle_timer() {
    let mut harness = idle_harness().await;

    harness.session.stop().await.unwrap();
    assert_eq!(harness.next_event().await, TransportEvent::Stopped);
    assert_eq!(harness.next_event().await, TransportEvent::Disconnected);

    tokio::time::sleep(IDLE_TIMEOUT * 2).await;
    harness.assert_no_event();
    assert!(!harness.session.snapshot().await.unwrap().idle_timer_active);
}

/// Tests that a session that left voice rejoins when new work arrives.
#[tokio::test(start_paused = true)]
async fn test_reconnects_after_idle_disconnect() {
    let mut harness = idle_harness().await;
    tokio::time::sleep(IDLE_TIMEOUT + Duration::from_secs(1)).await;
    assert_eq!(harness.next_event().await, TransportEvent::Disconnected);

    let outcome = harness
        .session
        .enqueue(QueueItem::new("B"), harness.origin.clone())
        .await
        .unwrap();

    assert!(outcome.started);
    assert_eq!(
        harness.next_event().await,
        TransportEvent::Connected(voice_channel())
    );
    assert_eq!(harness.next_event().await, TransportEvent::Played("B".into()));
}
