//! # orderbook-feed
//!
//! A live order-book viewer core for sequence-numbered WebSocket delta feeds.
//!
//! ## Features
//!
//! - **Delta Reconciliation** - Local bid/ask books kept in sync with `seqNum` / `prevSeqNum` checks
//! - **Gap Recovery** - Out-of-order deltas are dropped and the channel resubscribed
//! - **Ladder Projection** - Top-N rows per side with cumulative totals and depth-bar scales
//! - **Flash Highlights** - New-level and size-change flashes that clear after a fixed window
//! - **Trade Direction** - Last trade price with up/down/same tick direction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use orderbook_feed::{Config, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), orderbook_feed::Error> {
//!     let session = Session::new(Config::new("BTCPFC"))?;
//!     let handle = session.handle();
//!     tokio::spawn(session.run(std::future::pending()));
//!
//!     let mut changes = handle.subscribe();
//!     while changes.changed().await.is_ok() {
//!         let view = handle.view();
//!         if let Some(best) = view.bids.first() {
//!             println!("best bid {} x {}", best.price, best.size);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Price Representation
//!
//! Prices and sizes arrive as decimal text (`"27000.5"`) and are held as
//! [`rust_decimal::Decimal`], so `"100"` and `"100.00"` key the same level
//! and cumulative totals are exact.
//!
//! ## Architecture
//!
//! This crate is organized into several modules:
//!
//! - [`client`] - WebSocket connection and reconnect policy
//! - [`types`] - Value types and wire frames
//! - [`orderbook`] - Book state, sequence guard, ladder projection, flash tracking
//! - [`trade`] - Last trade price and tick direction
//! - [`feed`] - Single-writer state and the shared view handle
//! - [`session`] - Event loop tying the connections to the state
//! - [`config`] - Endpoints, symbol and display settings
//! - [`error`] - Error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod orderbook;
pub mod session;
pub mod trade;
pub mod types;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;
pub use feed::{BookEvent, BookView, FeedHandle, FeedState};
pub use session::Session;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
