// region:    --- Imports
use super::{Auction, AuctionStore, Bid, Winner};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- Memory Store

/// In-memory store for tests and local development, not production.
///
/// Every conditional primitive runs under the single write lock, so the
/// check-and-write is linearizable the same way the Postgres conditional
/// UPDATE is.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    auctions: HashMap<i64, Auction>,
    bids: Vec<Bid>,
    winners: HashMap<i64, Winner>,
    next_auction_id: i64,
    next_bid_id: i64,
    next_winner_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn insert_auction(&self, mut auction: Auction) -> Result<Auction, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_auction_id += 1;
        auction.id = inner.next_auction_id;
        inner.auctions.insert(auction.id, auction.clone());
        Ok(auction)
    }

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.auctions.get(&auction_id).cloned())
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.read().await;
        let mut active: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| a.is_open(now))
            .cloned()
            .collect();
        active.sort_by_key(|a| a.deadline);
        Ok(active)
    }

    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, StoreError> {
        let inner = self.inner.read().await;
        let mut bids: Vec<Bid> = inner
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(bids)
    }

    async fn try_place_bid(
        &self,
        auction_id: i64,
        bidder_identity: &str,
        amount: i64,
        extend_to: Option<DateTime<Utc>>,
    ) -> Result<Option<Auction>, StoreError> {
        let mut inner = self.inner.write().await;
        // Clock read under the write lock: the deadline holds at the write
        // instant even if the caller stalled on the way here.
        let now = Utc::now();

        let accepted = {
            let Some(auction) = inner.auctions.get_mut(&auction_id) else {
                return Ok(None);
            };
            if auction.terminal || now >= auction.deadline || amount <= auction.current_price {
                return Ok(None);
            }

            auction.current_price = amount;
            auction.highest_bidder = Some(bidder_identity.to_string());
            if let Some(extended) = extend_to {
                // Monotonic: a stale extension never pulls the deadline back.
                auction.deadline = auction.deadline.max(extended);
            }
            auction.clone()
        };

        inner.next_bid_id += 1;
        let bid = Bid {
            id: inner.next_bid_id,
            auction_id,
            bidder_identity: bidder_identity.to_string(),
            amount,
            created_at: now,
        };
        inner.bids.push(bid);

        Ok(Some(accepted))
    }

    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<i64>, StoreError> {
        let inner = self.inner.read().await;
        let mut expired: Vec<(DateTime<Utc>, i64)> = inner
            .auctions
            .values()
            .filter(|a| a.is_expired(now))
            .map(|a| (a.deadline, a.id))
            .collect();
        expired.sort();
        Ok(expired.into_iter().map(|(_, id)| id).collect())
    }

    async fn try_finalize(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<(Auction, Option<Winner>)>, StoreError> {
        let mut inner = self.inner.write().await;

        let mut closed = {
            let Some(auction) = inner.auctions.get_mut(&auction_id) else {
                return Ok(None);
            };
            if auction.terminal {
                return Ok(None);
            }
            auction.terminal = true;
            auction.clone()
        };

        let winner = match closed.highest_bidder.clone() {
            Some(bidder) if !inner.winners.contains_key(&auction_id) => {
                inner.next_winner_id += 1;
                let winner = Winner {
                    id: inner.next_winner_id,
                    auction_id,
                    bidder_identity: bidder,
                    amount: closed.current_price,
                    won_at: now,
                    paid: false,
                    paid_at: None,
                    order_id: None,
                };
                inner.winners.insert(auction_id, winner.clone());
                Some(winner)
            }
            _ => None,
        };

        if let Some(winner) = &winner {
            if let Some(auction) = inner.auctions.get_mut(&auction_id) {
                auction.winner_id = Some(winner.id);
            }
            closed.winner_id = Some(winner.id);
        }

        Ok(Some((closed, winner)))
    }

    async fn get_winner(&self, auction_id: i64) -> Result<Option<Winner>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.winners.get(&auction_id).cloned())
    }

    async fn try_mark_paid(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Winner>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.winners.get_mut(&auction_id) {
            Some(winner) if !winner.paid => {
                winner.paid = true;
                winner.paid_at = Some(now);
                Ok(Some(winner.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn attach_order(
        &self,
        auction_id: i64,
        order_id: i64,
    ) -> Result<Option<Winner>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.winners.get_mut(&auction_id) {
            Some(winner) => {
                if winner.order_id.is_none() {
                    winner.order_id = Some(order_id);
                }
                Ok(Some(winner.clone()))
            }
            None => Ok(None),
        }
    }
}

// endregion: --- Memory Store
