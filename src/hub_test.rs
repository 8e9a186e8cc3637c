//! End-to-end tests for the dispatch hub

use super::*;
use crate::entry::Level;
use crate::selector::Selector;

/// Helper to create a numbered test entry
fn make_entry(seq: i64) -> Entry {
    Entry::new(Level::Info, format!("entry {seq}")).with_field("seq", seq)
}

fn seq_of(entry: &Entry) -> i64 {
    entry.field("seq").and_then(|v| v.as_i64()).unwrap()
}

/// Wait until the loop has processed everything submitted so far.
///
/// The mailbox is a single FIFO consumed in order, so a register/
/// unregister round trip acknowledges all prior commands.
async fn settle(hub: &Hub) {
    let (tx, _rx) = mpsc::channel(1);
    let id = hub.register_outlet(tx).await.unwrap();
    hub.unregister_id(id).await.unwrap();
}

fn drain_all(selector: &Selector) -> Vec<i64> {
    let mut seqs = Vec::new();
    while let Some(entry) = selector.drain() {
        seqs.push(seq_of(&entry));
    }
    seqs
}

// ============================================================================
// Replay on registration
// ============================================================================

#[tokio::test]
async fn test_late_joiner_receives_most_recent_window() {
    let hub = Hub::new();

    // More entries than the history window holds
    for seq in 1..=70 {
        hub.submit(make_entry(seq)).await.unwrap();
    }

    let selector = Selector::connect("", &hub).await.unwrap();
    let seqs = drain_all(&selector);

    let expected: Vec<i64> = (7..=70).collect();
    assert_eq!(seqs, expected);

    hub.stop().await;
}

#[tokio::test]
async fn test_replay_order_before_window_fills() {
    let hub = Hub::new();

    for seq in 1..=5 {
        hub.submit(make_entry(seq)).await.unwrap();
    }

    let selector = Selector::connect("", &hub).await.unwrap();
    assert_eq!(drain_all(&selector), vec![1, 2, 3, 4, 5]);

    hub.stop().await;
}

// ============================================================================
// Live delivery
// ============================================================================

#[tokio::test]
async fn test_empty_expression_receives_every_entry() {
    let hub = Hub::new();
    let selector = Selector::connect("", &hub).await.unwrap();

    hub.submit(make_entry(1)).await.unwrap();
    settle(&hub).await;

    let entry = selector.drain().expect("entry should be delivered");
    assert_eq!(seq_of(&entry), 1);
    assert!(selector.drain().is_none());

    hub.stop().await;
}

#[tokio::test]
async fn test_filter_discards_non_matching() {
    let hub = Hub::new();
    let selector = Selector::connect("Field('seq') > 2", &hub).await.unwrap();

    for seq in 1..=4 {
        hub.submit(make_entry(seq)).await.unwrap();
    }
    settle(&hub).await;

    // Non-matching entries are consumed and discarded
    assert_eq!(drain_all(&selector), vec![3, 4]);

    hub.stop().await;
}

// ============================================================================
// Slow-consumer shedding
// ============================================================================

#[tokio::test]
async fn test_slow_selector_does_not_stall_others() {
    let hub = Hub::new();
    let frozen = Selector::connect("", &hub).await.unwrap();
    let live = Selector::connect("", &hub).await.unwrap();

    // Fill the frozen selector's queue exactly
    for seq in 1..=64 {
        hub.submit(make_entry(seq)).await.unwrap();
    }
    settle(&hub).await;

    // The live selector keeps up
    let expected: Vec<i64> = (1..=64).collect();
    assert_eq!(drain_all(&live), expected);

    // One more entry: dropped for the frozen selector, delivered to the live one
    hub.submit(make_entry(65)).await.unwrap();
    settle(&hub).await;

    assert_eq!(drain_all(&live), vec![65]);

    let frozen_seqs = drain_all(&frozen);
    assert_eq!(frozen_seqs, expected, "frozen selector kept only its first 64");

    hub.stop().await;
}

// ============================================================================
// Unregistration
// ============================================================================

#[tokio::test]
async fn test_unregister_mid_stream() {
    let hub = Hub::new();
    let first = Selector::connect("", &hub).await.unwrap();
    let second = Selector::connect("", &hub).await.unwrap();
    let third = Selector::connect("", &hub).await.unwrap();
    assert_eq!(hub.subscriber_count(), 3);

    hub.submit(make_entry(1)).await.unwrap();
    settle(&hub).await;

    hub.unregister(&second).await.unwrap();
    assert_eq!(hub.subscriber_count(), 2);

    hub.submit(make_entry(2)).await.unwrap();
    settle(&hub).await;

    assert_eq!(drain_all(&first), vec![1, 2]);
    assert_eq!(drain_all(&third), vec![1, 2]);

    // Entries queued before unregistration remain drainable; nothing after
    assert_eq!(drain_all(&second), vec![1]);

    hub.stop().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_stop_unregisters_everything_and_joins_worker() {
    let hub = Hub::new();
    let first = Selector::connect("", &hub).await.unwrap();
    let _second = Selector::connect("", &hub).await.unwrap();
    assert_eq!(hub.subscriber_count(), 2);

    hub.submit(make_entry(1)).await.unwrap();
    settle(&hub).await;

    // stop() returns only after the worker task has fully exited
    hub.stop().await;
    assert_eq!(hub.subscriber_count(), 0);

    // Entries queued before shutdown are still drainable
    assert_eq!(drain_all(&first), vec![1]);

    // The hub accepts nothing further
    assert!(matches!(
        hub.submit(make_entry(2)).await,
        Err(HubError::Stopped)
    ));

    // Repeated stop is harmless
    hub.stop().await;
}

#[tokio::test]
async fn test_connect_after_stop_fails() {
    let hub = Hub::new();
    hub.stop().await;

    assert!(matches!(
        Selector::connect("", &hub).await,
        Err(HubError::Stopped)
    ));
}

// ============================================================================
// Registration validation
// ============================================================================

#[tokio::test]
async fn test_malformed_expression_leaves_no_registration() {
    let hub = Hub::new();

    let result = Selector::connect("Prefix(", &hub).await;
    assert!(matches!(result, Err(HubError::Parse(_))));
    assert_eq!(hub.subscriber_count(), 0);

    hub.stop().await;
}

// ============================================================================
// Bookkeeping
// ============================================================================

#[tokio::test]
async fn test_epoch_is_injected_into_selectors() {
    let hub = Hub::new();
    let first = Selector::connect("", &hub).await.unwrap();
    let second = Selector::connect("", &hub).await.unwrap();

    assert_eq!(first.epoch(), hub.epoch());
    assert_eq!(first.epoch(), second.epoch());

    hub.stop().await;
}

#[tokio::test]
async fn test_published_counter() {
    let hub = Hub::new();

    for seq in 1..=3 {
        hub.submit(make_entry(seq)).await.unwrap();
    }
    settle(&hub).await;

    assert_eq!(hub.entries_published(), 3);

    hub.stop().await;
}
