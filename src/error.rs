// region:    --- Imports
use chrono::{DateTime, Utc};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Engine Error

/// Outcomes of engine operations that callers must branch on.
///
/// `Closed`, `TooLow` and `AlreadyPaid` are expected business rejections,
/// not failures; `Storage` is the only genuinely exceptional variant.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("auction not found")]
    NotFound,

    /// The auction is terminal or past its deadline. Carries the standing
    /// price so the caller can render the final state.
    #[error("auction is closed (current price {current_price})")]
    Closed { current_price: i64 },

    /// The bid did not beat the standing price. Carries the price the bidder
    /// has to beat for an immediate re-bid.
    #[error("bid too low (current price {current_price})")]
    TooLow { current_price: i64 },

    /// `finalize` was invoked before the deadline. A logic error on the
    /// caller's side, never triggered by the sweeper.
    #[error("auction has not expired yet (deadline {deadline})")]
    NotYetExpired { deadline: DateTime<Utc> },

    #[error("win already paid")]
    AlreadyPaid,

    #[error("bid amount must be positive")]
    InvalidAmount,

    #[error("starting price must not be negative")]
    InvalidStartingPrice,

    #[error("auction duration must be positive")]
    InvalidDuration,

    #[error("bidder identity must not be empty")]
    MissingIdentity,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

// endregion: --- Engine Error

// region:    --- Store Error

/// Infrastructure-level failure from an `AuctionStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// endregion: --- Store Error
