//! Configuration for the feed client.
//!
//! This module provides the [`Config`] struct: which market to follow, where
//! the order-book and trade feeds live, and how the book is displayed.

use std::time::Duration;

use url::Url;

use crate::client::websocket::ReconnectConfig;
use crate::error::Error;
use crate::orderbook::{DEFAULT_DEPTH, DEFAULT_FLASH_WINDOW};

/// Default order-book feed (BTSE futures OSS)
pub const DEFAULT_ORDERBOOK_URL: &str = "wss://ws.btse.com/ws/oss/futures";

/// Default trade feed (BTSE futures)
pub const DEFAULT_TRADE_URL: &str = "wss://ws.btse.com/ws/futures";

/// Default market symbol
pub const DEFAULT_SYMBOL: &str = "BTCPFC";

/// Configuration for the feed client
///
/// # Example
///
/// ```rust
/// use orderbook_feed::Config;
/// use std::time::Duration;
///
/// let config = Config::new("ETHPFC")
///     .with_depth(10)
///     .with_flash_window(Duration::from_millis(300));
///
/// assert_eq!(config.orderbook_channel(), "update:ETHPFC_0");
/// assert_eq!(config.trade_channel(), "tradeHistoryApi:ETHPFC");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Market symbol
    symbol: String,

    /// Price grouping level of the order-book channel (0 = raw prices)
    grouping: u32,

    /// Order-book WebSocket URL
    orderbook_url: String,

    /// Trade WebSocket URL
    trade_url: String,

    /// Rows shown per side
    depth: usize,

    /// How long a flash stays visible
    flash_window: Duration,

    /// Connect handshake timeout
    connect_timeout: Duration,

    /// Reconnection behavior
    reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL)
    }
}

impl Config {
    /// Create a configuration for `symbol` with the default endpoints
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            grouping: 0,
            orderbook_url: DEFAULT_ORDERBOOK_URL.to_string(),
            trade_url: DEFAULT_TRADE_URL.to_string(),
            depth: DEFAULT_DEPTH,
            flash_window: DEFAULT_FLASH_WINDOW,
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Set the price grouping level
    #[must_use]
    pub fn with_grouping(mut self, grouping: u32) -> Self {
        self.grouping = grouping;
        self
    }

    /// Set the order-book WebSocket URL
    #[must_use]
    pub fn with_orderbook_url(mut self, url: impl Into<String>) -> Self {
        self.orderbook_url = url.into();
        self
    }

    /// Set the trade WebSocket URL
    #[must_use]
    pub fn with_trade_url(mut self, url: impl Into<String>) -> Self {
        self.trade_url = url.into();
        self
    }

    /// Set the number of rows shown per side
    #[must_use]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Set the flash display window
    #[must_use]
    pub fn with_flash_window(mut self, window: Duration) -> Self {
        self.flash_window = window;
        self
    }

    /// Set the connect handshake timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the reconnection behavior
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Get the market symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Order-book channel name, e.g. `update:BTCPFC_0`
    pub fn orderbook_channel(&self) -> String {
        format!("update:{}_{}", self.symbol, self.grouping)
    }

    /// Trade channel name, e.g. `tradeHistoryApi:BTCPFC`
    pub fn trade_channel(&self) -> String {
        format!("tradeHistoryApi:{}", self.symbol)
    }

    /// Get the order-book WebSocket URL
    pub fn orderbook_url(&self) -> &str {
        &self.orderbook_url
    }

    /// Get the trade WebSocket URL
    pub fn trade_url(&self) -> &str {
        &self.trade_url
    }

    /// Get the number of rows shown per side
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Get the flash display window
    pub fn flash_window(&self) -> Duration {
        self.flash_window
    }

    /// Get the connect handshake timeout
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Get the reconnection behavior
    pub fn reconnect(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    /// Check the configuration before connecting
    ///
    /// # Errors
    ///
    /// Returns an error if a URL does not parse or is not `ws`/`wss`, the
    /// symbol is empty, or the depth is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Config("symbol must not be empty".to_string()));
        }
        if self.depth == 0 {
            return Err(Error::Config("depth must be at least 1".to_string()));
        }
        parse_ws_url(&self.orderbook_url)?;
        parse_ws_url(&self.trade_url)?;
        Ok(())
    }
}

/// Parse a WebSocket URL, rejecting non-`ws`/`wss` schemes
pub(crate) fn parse_ws_url(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(Error::Config(format!(
            "unsupported URL scheme '{}' in {}",
            other, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.symbol(), "BTCPFC");
        assert_eq!(config.orderbook_channel(), "update:BTCPFC_0");
        assert_eq!(config.trade_channel(), "tradeHistoryApi:BTCPFC");
        assert_eq!(config.orderbook_url(), DEFAULT_ORDERBOOK_URL);
        assert_eq!(config.trade_url(), DEFAULT_TRADE_URL);
        assert_eq!(config.depth(), 8);
        assert_eq!(config.flash_window(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new("ETHPFC")
            .with_grouping(2)
            .with_depth(12)
            .with_connect_timeout(Duration::from_secs(3))
            .with_reconnect(ReconnectConfig::new().max_retries(3));

        assert_eq!(config.orderbook_channel(), "update:ETHPFC_2");
        assert_eq!(config.depth(), 12);
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.reconnect().max_retries, 3);
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            Config::new("").validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::default().with_depth(0).validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::default().with_trade_url("https://ws.btse.com").validate(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::default().with_orderbook_url("::::").validate(),
            Err(Error::InvalidUrl(_))
        ));
    }
}
