// region:    --- Imports
use auction_engine::error::EngineError;
use auction_engine::handoff::WinnerHandoff;
use auction_engine::store::{Auction, DynStore, MemoryStore};
use chrono::{Duration, Utc};
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Setup

/// Store with one finalized auction. Returns `(store, handoff, auction_id)`;
/// when `bidder` is set the auction finished with that winner at 150.
async fn finalized_auction(bidder: Option<&str>) -> (DynStore, WinnerHandoff, i64) {
    let store: DynStore = Arc::new(MemoryStore::new());
    let now = Utc::now();
    let auction = store
        .insert_auction(Auction {
            id: 0,
            item_id: 42,
            starting_price: 100,
            current_price: if bidder.is_some() { 150 } else { 100 },
            start_time: now - Duration::seconds(120),
            deadline: now - Duration::seconds(1),
            terminal: false,
            highest_bidder: bidder.map(String::from),
            winner_id: None,
        })
        .await
        .unwrap();
    store.try_finalize(auction.id, now).await.unwrap();

    let handoff = WinnerHandoff::new(Arc::clone(&store));
    (store, handoff, auction.id)
}

// endregion: --- Setup

// region:    --- Authorization

#[tokio::test]
async fn only_the_winner_sees_the_win() {
    let (_store, handoff, auction_id) = finalized_auction(Some("alice")).await;

    let win = handoff.get_win(auction_id, "alice").await.unwrap();
    assert_eq!(win.amount, 150);
    assert!(!win.paid);

    // Anyone else gets NotFound, indistinguishable from "no winner".
    assert!(matches!(
        handoff.get_win(auction_id, "bob").await,
        Err(EngineError::NotFound)
    ));
    assert!(matches!(
        handoff.get_win(9999, "alice").await,
        Err(EngineError::NotFound)
    ));
}

#[tokio::test]
async fn no_winner_means_not_found_for_everyone() {
    let (_store, handoff, auction_id) = finalized_auction(None).await;
    assert!(matches!(
        handoff.get_win(auction_id, "alice").await,
        Err(EngineError::NotFound)
    ));
}

// endregion: --- Authorization

// region:    --- Payment

#[tokio::test]
async fn mark_paid_is_idempotent() {
    let (store, handoff, auction_id) = finalized_auction(Some("alice")).await;

    let paid = handoff.mark_paid(auction_id, "alice").await.unwrap();
    assert!(paid.paid);
    assert!(paid.paid_at.is_some());

    // Second call rejects instead of re-processing; the row is untouched.
    assert!(matches!(
        handoff.mark_paid(auction_id, "alice").await,
        Err(EngineError::AlreadyPaid)
    ));
    let stored = store.get_winner(auction_id).await.unwrap().unwrap();
    assert_eq!(stored.paid_at, paid.paid_at);
}

#[tokio::test]
async fn non_winner_cannot_pay() {
    let (_store, handoff, auction_id) = finalized_auction(Some("alice")).await;

    assert!(matches!(
        handoff.mark_paid(auction_id, "bob").await,
        Err(EngineError::NotFound)
    ));
    // Repeatedly, regardless of payment state.
    handoff.mark_paid(auction_id, "alice").await.unwrap();
    assert!(matches!(
        handoff.mark_paid(auction_id, "bob").await,
        Err(EngineError::NotFound)
    ));
}

// endregion: --- Payment

// region:    --- Checkout handoff

#[tokio::test]
async fn cart_line_prices_the_win() {
    let (_store, handoff, auction_id) = finalized_auction(Some("alice")).await;

    let line = handoff
        .convert_to_cart_line(auction_id, "alice")
        .await
        .unwrap();
    assert_eq!(line.item_id, 42);
    assert_eq!(line.price, 150);
    assert_eq!(line.quantity, 1);

    assert!(matches!(
        handoff.convert_to_cart_line(auction_id, "bob").await,
        Err(EngineError::NotFound)
    ));
}

#[tokio::test]
async fn cart_line_refuses_paid_wins() {
    let (_store, handoff, auction_id) = finalized_auction(Some("alice")).await;

    handoff.mark_paid(auction_id, "alice").await.unwrap();
    assert!(matches!(
        handoff.convert_to_cart_line(auction_id, "alice").await,
        Err(EngineError::AlreadyPaid)
    ));
}

#[tokio::test]
async fn attach_order_links_the_first_id_only() {
    let (store, handoff, auction_id) = finalized_auction(Some("alice")).await;

    let linked = handoff.attach_order(auction_id, "alice", 555).await.unwrap();
    assert_eq!(linked.order_id, Some(555));

    // Linking again is absorbed; the first order id sticks.
    let linked = handoff.attach_order(auction_id, "alice", 777).await.unwrap();
    assert_eq!(linked.order_id, Some(555));

    assert!(matches!(
        handoff.attach_order(auction_id, "bob", 888).await,
        Err(EngineError::NotFound)
    ));
    let stored = store.get_winner(auction_id).await.unwrap().unwrap();
    assert_eq!(stored.order_id, Some(555));
}

// endregion: --- Checkout handoff
