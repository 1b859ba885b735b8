//! Mutual-exclusion properties of the resource-family lock registry

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nimbus_core::{CoreError, LockRegistry};

/// Two concurrent submit+poll sequences on the same family must never
/// interleave their critical sections.
#[tokio::test]
async fn same_family_sequences_do_not_interleave() {
    let registry = Arc::new(LockRegistry::new());
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..4 {
        let registry = Arc::clone(&registry);
        let events = Arc::clone(&events);
        handles.push(tokio::spawn(async move {
            let _guard = registry.acquire("network/peerings").await;
            events.lock().unwrap().push(format!("start-{i}"));
            // Simulated submit+poll work while the lock is held.
            tokio::time::sleep(Duration::from_millis(20)).await;
            events.lock().unwrap().push(format!("end-{i}"));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        let start = pair[0].strip_prefix("start-").expect("start first");
        let end = pair[1].strip_prefix("end-").expect("end second");
        assert_eq!(start, end, "critical sections interleaved: {events:?}");
    }
}

#[tokio::test]
async fn different_families_proceed_independently() {
    let registry = Arc::new(LockRegistry::new());
    let _peerings = registry.acquire("network/peerings").await;

    // Acquiring another family must not block behind the held one.
    let other = tokio::time::timeout(
        Duration::from_millis(200),
        registry.acquire("events/subscriptions"),
    )
    .await;
    assert!(other.is_ok(), "unrelated family was blocked");
}

/// The lock is released exactly once per sequence regardless of outcome:
/// an erroring sequence must not leave the family locked.
#[tokio::test]
async fn lock_released_on_error_paths() {
    let registry = Arc::new(LockRegistry::new());

    async fn failing_sequence(registry: &LockRegistry) -> Result<(), CoreError> {
        let _guard = registry.acquire("network/peerings").await;
        Err(CoreError::OperationFailed {
            message: "remote rejected the peering".to_string(),
        })
    }

    assert!(failing_sequence(&registry).await.is_err());

    // If the failed sequence leaked its guard this would never resolve.
    let reacquired = tokio::time::timeout(
        Duration::from_millis(200),
        registry.acquire("network/peerings"),
    )
    .await;
    assert!(reacquired.is_ok(), "lock was not released on the error path");
}

#[tokio::test]
async fn waiting_acquirer_proceeds_after_release() {
    let registry = Arc::new(LockRegistry::new());

    let guard = registry.acquire("network/peerings").await;
    let registry2 = Arc::clone(&registry);
    let waiter = tokio::spawn(async move {
        let _guard = registry2.acquire("network/peerings").await;
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_millis(200), waiter)
        .await
        .expect("waiter should proceed once the lock is dropped")
        .unwrap();
}
