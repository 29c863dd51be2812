/// Thin HTTP adapters over the engine. Routing and transport live here;
/// every rule worth testing lives in the component modules.
// region:    --- Imports
use crate::bidding::{BidLedger, PlaceBidCommand};
use crate::broadcast::BroadcastHub;
use crate::error::EngineError;
use crate::handoff::WinnerHandoff;
use crate::lifecycle::{CreateAuctionCommand, LifecycleManager};
use crate::store::DynStore;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- App State

pub struct AppState {
    pub ledger: BidLedger,
    pub lifecycle: Arc<LifecycleManager>,
    pub handoff: WinnerHandoff,
    pub hub: Arc<BroadcastHub>,
    pub store: DynStore,
}

// endregion: --- App State

// region:    --- Identity

/// The identity provider (external) authenticates the caller and forwards
/// the identity in this header; the engine trusts it as-is.
const IDENTITY_HEADER: &str = "x-identity";

fn identity(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| error_response(EngineError::MissingIdentity))
}

// endregion: --- Identity

// region:    --- Error Mapping

/// One place that turns engine results into wire responses, so rejection
/// bodies always carry the `code` (and price) callers branch on.
fn error_response(err: EngineError) -> Response {
    let (status, body) = match err {
        EngineError::NotFound => (
            StatusCode::NOT_FOUND,
            serde_json::json!({"error": "not found", "code": "NOT_FOUND"}),
        ),
        EngineError::Closed { current_price } => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "auction is closed",
                "code": "CLOSED",
                "current_price": current_price
            }),
        ),
        EngineError::TooLow { current_price } => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "bid must beat the current price",
                "code": "TOO_LOW",
                "current_price": current_price
            }),
        ),
        EngineError::NotYetExpired { deadline } => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "auction has not expired yet",
                "code": "NOT_EXPIRED",
                "deadline": deadline
            }),
        ),
        EngineError::AlreadyPaid => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({"error": "win already paid", "code": "ALREADY_PAID"}),
        ),
        EngineError::InvalidAmount => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({"error": "amount must be positive", "code": "INVALID_AMOUNT"}),
        ),
        EngineError::InvalidStartingPrice => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "starting price must not be negative",
                "code": "INVALID_STARTING_PRICE"
            }),
        ),
        EngineError::InvalidDuration => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({"error": "duration must be positive", "code": "INVALID_DURATION"}),
        ),
        EngineError::MissingIdentity => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({"error": "identity required", "code": "MISSING_IDENTITY"}),
        ),
        EngineError::Storage(e) => {
            error!("{:<12} --> storage error: {}", "Handler", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": "internal error", "code": "INTERNAL"}),
            )
        }
    };
    (status, Json(body)).into_response()
}

// endregion: --- Error Mapping

// region:    --- Auction Handlers

pub async fn handle_create_auction(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<CreateAuctionCommand>,
) -> Response {
    info!("{:<12} --> create auction: {:?}", "Handler", cmd);
    match state.lifecycle.create_auction(cmd).await {
        Ok(auction) => (StatusCode::CREATED, Json(auction)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_list_auctions(State(state): State<Arc<AppState>>) -> Response {
    match state.lifecycle.list_active().await {
        Ok(auctions) => Json(auctions).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_get_auction(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
) -> Response {
    match state.lifecycle.get_auction(auction_id).await {
        Ok(auction) => Json(auction).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_get_bids(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
) -> Response {
    match state.store.list_bids(auction_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => error_response(EngineError::Storage(e)),
    }
}

// endregion: --- Auction Handlers

// region:    --- Bid Handler

pub async fn handle_place_bid(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<PlaceBidCommand>,
) -> Response {
    let bidder = match identity(&headers) {
        Ok(bidder) => bidder,
        Err(resp) => return resp,
    };
    info!(
        "{:<12} --> bid on auction {}: {} by {}",
        "Handler", auction_id, cmd.amount, bidder
    );

    match state.ledger.place_bid(auction_id, cmd.amount, &bidder).await {
        Ok(auction) => Json(serde_json::json!({
            "message": "bid accepted",
            "current_price": auction.current_price,
            "deadline": auction.deadline
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Bid Handler

// region:    --- Live Handler

/// SSE stream of one auction's live events. No backlog: the client fetches
/// the auction state on join and then follows this stream.
pub async fn handle_watch_auction(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
) -> Response {
    if let Err(e) = state.lifecycle.get_auction(auction_id).await {
        return error_response(e);
    }

    let receiver = state.hub.subscribe(auction_id);
    let stream = BroadcastStream::new(receiver).filter_map(|event| match event {
        Ok(event) => SseEvent::default()
            .json_data(&event)
            .ok()
            .map(Ok::<_, Infallible>),
        // A lagged viewer skips what it missed; no replay.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

// endregion: --- Live Handler

// region:    --- Winner Handlers

#[derive(Debug, Deserialize)]
pub struct AttachOrderCommand {
    pub order_id: i64,
}

pub async fn handle_get_win(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let requester = match identity(&headers) {
        Ok(requester) => requester,
        Err(resp) => return resp,
    };
    match state.handoff.get_win(auction_id, &requester).await {
        Ok(winner) => Json(winner).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_mark_paid(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let requester = match identity(&headers) {
        Ok(requester) => requester,
        Err(resp) => return resp,
    };
    match state.handoff.mark_paid(auction_id, &requester).await {
        Ok(winner) => Json(winner).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_cart_line(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let requester = match identity(&headers) {
        Ok(requester) => requester,
        Err(resp) => return resp,
    };
    match state
        .handoff
        .convert_to_cart_line(auction_id, &requester)
        .await
    {
        Ok(line) => Json(line).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_attach_order(
    State(state): State<Arc<AppState>>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
    Json(cmd): Json<AttachOrderCommand>,
) -> Response {
    let requester = match identity(&headers) {
        Ok(requester) => requester,
        Err(resp) => return resp,
    };
    match state
        .handoff
        .attach_order(auction_id, &requester, cmd.order_id)
        .await
    {
        Ok(winner) => Json(winner).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Winner Handlers
