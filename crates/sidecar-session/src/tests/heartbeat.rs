use crate::tests::{Harness, attempt_lines, settle};
use crate::SessionStatus;

use std::time::Duration;

const TICK: Duration = Duration::from_secs(30);

async fn advance(ticks: u32) {
    tokio::time::sleep(TICK * ticks).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn given_started_session_when_interval_elapses_then_heartbeat_tool_called() {
    // Given
    let harness = Harness::started().await;
    assert!(harness.session.has_heartbeat());

    // When
    advance(1).await;

    // Then
    assert_eq!(harness.client.heartbeats(), 1);

    advance(2).await;
    assert_eq!(harness.client.heartbeats(), 3);
}

#[tokio::test(start_paused = true)]
async fn given_running_heartbeat_when_started_again_then_replaced_not_duplicated() {
    // Given
    let harness = Harness::started().await;

    // When
    harness.session.start_heartbeat();
    harness.session.start_heartbeat();
    advance(1).await;

    // Then
    assert_eq!(harness.client.heartbeats(), 1);
}

#[tokio::test(start_paused = true)]
async fn given_running_heartbeat_when_stopped_then_no_more_beats() {
    // Given
    let harness = Harness::started().await;

    // When
    harness.session.stop_heartbeat();
    harness.session.stop_heartbeat();
    advance(3).await;

    // Then
    assert_eq!(harness.client.heartbeats(), 0);
    assert!(!harness.session.has_heartbeat());
}

#[tokio::test(start_paused = true)]
async fn given_heartbeat_fails_on_connection_when_ticking_then_session_reconnects() {
    // Given
    let harness = Harness::started().await;
    harness.client.set_heartbeat_error(Some("Connection reset by peer"));

    // When
    advance(1).await;
    harness.client.set_heartbeat_error(None);

    // Then
    assert!(harness.log.contains("Heartbeat failed: Connection reset by peer"));
    assert_eq!(attempt_lines(&harness.log), 1);
    assert!(harness.log.contains("Reconnected on attempt 1"));
    assert_eq!(harness.session.status(), SessionStatus::Active);
    assert!(harness.session.has_heartbeat());
    assert_eq!(harness.session.reconnect_state().attempts, 0);

    // The restarted heartbeat keeps beating.
    let beats = harness.client.heartbeats();
    advance(1).await;
    assert_eq!(harness.client.heartbeats(), beats + 1);
    assert_eq!(harness.log.count_containing("Connection lost"), 1);
}

#[tokio::test(start_paused = true)]
async fn given_heartbeat_fails_logically_when_ticking_then_session_still_reconnects() {
    // Given
    let harness = Harness::started().await;
    harness.client.set_heartbeat_error(Some("Task execution failed"));

    // When
    advance(1).await;
    harness.client.set_heartbeat_error(None);

    // Then
    assert_eq!(attempt_lines(&harness.log), 1);
    assert!(harness.session.has_heartbeat());
}

#[tokio::test(start_paused = true)]
async fn given_reconnect_running_when_time_passes_then_no_heartbeat_overlaps() {
    // Given
    let harness = Harness::started().await;
    harness.client.refuse_all_connects(true);
    harness.client.set_heartbeat_error(Some("ETIMEDOUT"));
    advance(1).await;
    harness.client.set_heartbeat_error(None);
    let beats = harness.client.heartbeats();

    // When
    advance(4).await;

    // Then
    assert_eq!(harness.client.heartbeats(), beats);
    assert!(!harness.session.has_heartbeat());
    assert_eq!(harness.session.status(), SessionStatus::Failed);
    assert_eq!(harness.store.checkpoints().len(), 1);
}
