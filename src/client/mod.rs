//! Transport to the market-data feed.
//!
//! - [`websocket`] - owned WebSocket connection and reconnect backoff

pub mod websocket;

pub use websocket::{FeedConnection, ReconnectConfig};
