// region:    --- Imports
use auction_engine::bidding::{BidLedger, BidPolicy};
use auction_engine::broadcast::BroadcastHub;
use auction_engine::config::Config;
use auction_engine::handlers::{self, AppState};
use auction_engine::handoff::WinnerHandoff;
use auction_engine::lifecycle::LifecycleManager;
use auction_engine::store::{DynStore, PgStore};
use auction_engine::sweeper::ExpirySweeper;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // Store
    let pg_store = PgStore::connect(&config.database_url).await?;
    pg_store.initialize_schema().await?;
    let store: DynStore = Arc::new(pg_store);
    info!("{:<12} --> database ready", "Main");

    // Engine components
    let hub = Arc::new(BroadcastHub::new(config.broadcast_capacity));
    let lifecycle = Arc::new(LifecycleManager::new(
        Arc::clone(&store),
        Arc::clone(&hub),
    ));
    let ledger = BidLedger::new(
        Arc::clone(&store),
        Arc::clone(&hub),
        BidPolicy {
            anti_snipe_window: config.anti_snipe_window,
        },
    );
    let handoff = WinnerHandoff::new(Arc::clone(&store));

    // Expiry sweeper with cooperative shutdown
    let (stop_tx, stop_rx) = watch::channel(false);
    let sweeper = ExpirySweeper::new(
        Arc::clone(&store),
        Arc::clone(&lifecycle),
        config.sweep_interval,
        config.sweep_grace,
    );
    let sweeper_handle = sweeper.start(stop_rx);
    info!("{:<12} --> sweeper started", "Main");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = Arc::new(AppState {
        ledger,
        lifecycle,
        handoff,
        hub,
        store,
    });

    let routes_all = Router::new()
        .route(
            "/auctions",
            post(handlers::handle_create_auction).get(handlers::handle_list_auctions),
        )
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/bids", get(handlers::handle_get_bids))
        .route("/auctions/:id/bid", post(handlers::handle_place_bid))
        .route("/auctions/:id/live", get(handlers::handle_watch_auction))
        .route("/auctions/:id/win", get(handlers::handle_get_win))
        .route("/auctions/:id/pay", post(handlers::handle_mark_paid))
        .route("/auctions/:id/cart-line", get(handlers::handle_cart_line))
        .route("/auctions/:id/order", post(handlers::handle_attach_order))
        .layer(cors)
        .with_state(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    // Stop the sweeper without waiting out a full interval.
    let _ = stop_tx.send(true);
    let _ = sweeper_handle.await;
    info!("{:<12} --> shut down cleanly", "Main");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("{:<12} --> failed to listen for ctrl-c: {}", "Main", e);
    }
}
// endregion: --- Main
