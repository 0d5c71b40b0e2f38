use crate::{ActiveRequestRegistry, RequestId};

use tokio_util::sync::CancellationToken;

#[test]
fn given_registered_request_when_guard_drops_then_entry_removed() {
    // Given
    let registry = ActiveRequestRegistry::new();
    let parent = CancellationToken::new();
    let id = RequestId::new();

    // When
    let guard = registry.register(id, "plan", &parent).unwrap();

    // Then
    assert_eq!(registry.ids(), vec![id]);
    assert_eq!(registry.get(id).map(|r| r.tool), Some("plan".to_string()));

    drop(guard);
    assert!(registry.is_empty());
}

#[test]
fn given_registered_request_when_cancelled_then_token_fires_once() {
    // Given
    let registry = ActiveRequestRegistry::new();
    let parent = CancellationToken::new();
    let id = RequestId::new();
    let guard = registry.register(id, "plan", &parent).unwrap();

    // When
    let first = registry.cancel(id);
    let second = registry.cancel(id);

    // Then
    assert!(first);
    assert!(!second);
    assert!(guard.token().is_cancelled());
    assert!(!parent.is_cancelled());
    assert!(registry.is_empty());
}

#[test]
fn given_several_requests_when_cancel_all_then_all_aborted() {
    // Given
    let registry = ActiveRequestRegistry::new();
    let parent = CancellationToken::new();
    let a = registry.register(RequestId::new(), "plan", &parent).unwrap();
    let b = registry.register(RequestId::new(), "reflect", &parent).unwrap();

    // When
    let aborted = registry.cancel_all();

    // Then
    assert_eq!(aborted, 2);
    assert!(a.token().is_cancelled());
    assert!(b.token().is_cancelled());
    assert_eq!(registry.len(), 0);
}

#[test]
fn given_parent_cancelled_when_request_registered_then_child_token_cancelled() {
    // Given
    let registry = ActiveRequestRegistry::new();
    let parent = CancellationToken::new();
    let guard = registry.register(RequestId::new(), "plan", &parent).unwrap();

    // When
    parent.cancel();

    // Then
    assert!(guard.token().is_cancelled());
}

#[test]
fn given_id_in_flight_when_registered_again_then_rejected_and_original_kept() {
    // Given
    let registry = ActiveRequestRegistry::new();
    let parent = CancellationToken::new();
    let id = RequestId::new();
    let first = registry.register(id, "plan", &parent).unwrap();

    // When
    let second = registry.register(id, "reflect", &parent);

    // Then
    assert!(second.is_none());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(id).map(|r| r.tool), Some("plan".to_string()));

    drop(first);
    assert!(registry.is_empty());
}

#[test]
fn given_cancelled_id_reused_when_stale_guard_drops_then_new_entry_survives() {
    // Given
    let registry = ActiveRequestRegistry::new();
    let parent = CancellationToken::new();
    let id = RequestId::new();
    let stale = registry.register(id, "plan", &parent).unwrap();
    assert!(registry.cancel(id));
    let fresh = registry.register(id, "reflect", &parent).unwrap();

    // When
    drop(stale);

    // Then
    assert_eq!(registry.get(id).map(|r| r.tool), Some("reflect".to_string()));
    assert!(!fresh.token().is_cancelled());

    drop(fresh);
    assert!(registry.is_empty());
}
