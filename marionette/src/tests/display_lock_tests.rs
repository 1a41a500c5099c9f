//! Tests for display lock ownership semantics

use crate::{AutomationError, DisplayLock};

#[test]
fn reacquire_by_the_same_owner_is_idempotent() {
    let lock = DisplayLock::new();
    lock.acquire("session-a").unwrap();
    lock.acquire("session-a").unwrap();
    assert!(lock.acquired_by("session-a"));
    assert_eq!(lock.owner().as_deref(), Some("session-a"));
}

#[test]
fn acquire_while_held_by_another_owner_fails_with_screen_busy() {
    let lock = DisplayLock::new();
    lock.acquire("session-a").unwrap();

    match lock.acquire("session-b") {
        Err(AutomationError::ScreenBusy {
            held_by,
            requested_by,
        }) => {
            assert_eq!(held_by, "session-a");
            assert_eq!(requested_by, "session-b");
        }
        other => panic!("expected ScreenBusy, got {other:?}"),
    }
    // The failed attempt must not disturb ownership.
    assert!(lock.acquired_by("session-a"));
}

#[test]
fn release_by_a_non_owner_is_a_no_op() {
    let lock = DisplayLock::new();
    lock.acquire("session-a").unwrap();
    lock.release("session-b");
    assert!(lock.acquired_by("session-a"));

    lock.release("session-a");
    assert!(lock.owner().is_none());
    // Releasing an unheld lock is also fine.
    lock.release("session-a");
}

#[test]
fn ownership_transfers_after_release() {
    let lock = DisplayLock::new();
    lock.acquire("session-a").unwrap();
    lock.release("session-a");
    lock.acquire("session-b").unwrap();
    assert!(lock.acquired_by("session-b"));
    assert!(!lock.acquired_by("session-a"));
}

#[test]
fn global_lock_is_one_shared_instance() {
    let first = DisplayLock::global();
    let second = DisplayLock::global();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}
