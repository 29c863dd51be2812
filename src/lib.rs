pub mod bidding;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod handoff;
pub mod lifecycle;
pub mod notify;
pub mod store;
pub mod sweeper;
