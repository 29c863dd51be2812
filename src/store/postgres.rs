// region:    --- Imports
use super::{queries, Auction, AuctionStore, Bid, Winner};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Postgres Store

/// Production store. The conditional `UPDATE ... RETURNING` statements in
/// `queries` are the synchronization points; they work across multiple
/// engine processes sharing one database.
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Apply the schema files under sql/.
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema_sql = include_str!("../../sql/01-create-schema.sql");
        for statement in schema_sql.split(';') {
            let statement = statement.trim();
            if !statement.is_empty() {
                sqlx::query(statement).execute(&*self.pool).await?;
            }
        }
        info!("{:<12} --> schema applied", "PgStore");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AuctionStore for PgStore {
    async fn insert_auction(&self, auction: Auction) -> Result<Auction, StoreError> {
        let created = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(auction.item_id)
            .bind(auction.starting_price)
            .bind(auction.current_price)
            .bind(auction.start_time)
            .bind(auction.deadline)
            .fetch_one(&*self.pool)
            .await?;
        Ok(created)
    }

    async fn get_auction(&self, auction_id: i64) -> Result<Option<Auction>, StoreError> {
        let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(auction)
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let auctions = sqlx::query_as::<_, Auction>(queries::LIST_ACTIVE)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        Ok(auctions)
    }

    async fn list_bids(&self, auction_id: i64) -> Result<Vec<Bid>, StoreError> {
        let bids = sqlx::query_as::<_, Bid>(queries::LIST_BIDS)
            .bind(auction_id)
            .fetch_all(&*self.pool)
            .await?;
        Ok(bids)
    }

    async fn try_place_bid(
        &self,
        auction_id: i64,
        bidder_identity: &str,
        amount: i64,
        extend_to: Option<DateTime<Utc>>,
    ) -> Result<Option<Auction>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Conditional raise; no row back means the condition failed under us.
        // Deadline and created_at come from now() inside the statement.
        let updated = sqlx::query_as::<_, Auction>(queries::RAISE_BID)
            .bind(auction_id)
            .bind(amount)
            .bind(bidder_identity)
            .bind(extend_to)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(queries::APPEND_BID)
            .bind(auction_id)
            .bind(bidder_identity)
            .bind(amount)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(queries::EXPIRED_AUCTIONS)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        Ok(ids)
    }

    async fn try_finalize(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<(Auction, Option<Winner>)>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, Auction>(queries::CLOSE_AUCTION)
            .bind(auction_id)
            .fetch_optional(&mut *tx)
            .await?;

        // Already terminal (or gone): somebody else finalized first.
        let Some(mut closed) = closed else {
            tx.rollback().await?;
            return Ok(None);
        };

        let winner = match closed.highest_bidder.as_deref() {
            Some(bidder) => {
                sqlx::query_as::<_, Winner>(queries::INSERT_WINNER)
                    .bind(auction_id)
                    .bind(bidder)
                    .bind(closed.current_price)
                    .bind(now)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            // Zero bids: the auction closes with no winner.
            None => None,
        };

        if let Some(winner) = &winner {
            sqlx::query(queries::LINK_WINNER)
                .bind(auction_id)
                .bind(winner.id)
                .execute(&mut *tx)
                .await?;
            closed.winner_id = Some(winner.id);
        }

        tx.commit().await?;
        Ok(Some((closed, winner)))
    }

    async fn get_winner(&self, auction_id: i64) -> Result<Option<Winner>, StoreError> {
        let winner = sqlx::query_as::<_, Winner>(queries::GET_WINNER)
            .bind(auction_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(winner)
    }

    async fn try_mark_paid(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Winner>, StoreError> {
        let winner = sqlx::query_as::<_, Winner>(queries::MARK_PAID)
            .bind(auction_id)
            .bind(now)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(winner)
    }

    async fn attach_order(
        &self,
        auction_id: i64,
        order_id: i64,
    ) -> Result<Option<Winner>, StoreError> {
        let linked = sqlx::query_as::<_, Winner>(queries::ATTACH_ORDER)
            .bind(auction_id)
            .bind(order_id)
            .fetch_optional(&*self.pool)
            .await?;
        match linked {
            Some(winner) => Ok(Some(winner)),
            // No-op when an order is already linked; hand back the row as is.
            None => self.get_winner(auction_id).await,
        }
    }
}

// endregion: --- Postgres Store
