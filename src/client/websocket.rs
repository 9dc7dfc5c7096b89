//! WebSocket connection to a feed channel.
//!
//! [`FeedConnection`] is an owned connection resource: it is opened with
//! [`FeedConnection::connect`], sends [`FeedCommand`]s, yields text frames
//! from [`FeedConnection::next`], and is released with
//! [`FeedConnection::close`]. There is no process-wide connection; each
//! session owns its own.
//!
//! # Example
//!
//! ```rust,no_run
//! use orderbook_feed::client::websocket::FeedConnection;
//! use std::time::Duration;
//!
//! # async fn example() -> orderbook_feed::Result<()> {
//! let mut ws = FeedConnection::connect("wss://ws.btse.com/ws/oss/futures", Duration::from_secs(10)).await?;
//! ws.subscribe("update:BTCPFC_0").await?;
//!
//! while let Some(frame) = ws.next().await {
//!     println!("{}", frame?);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::parse_ws_url;
use crate::error::Error;
use crate::types::FeedCommand;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open WebSocket connection to one feed endpoint
///
/// # Thread Safety
///
/// This connection is NOT thread-safe. It is meant to be owned by a single
/// session task.
#[derive(Debug)]
pub struct FeedConnection {
    url: String,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl FeedConnection {
    /// Connect to a feed endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the handshake fails, or it
    /// does not complete within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, Error> {
        let parsed = parse_ws_url(url)?;

        let (ws_stream, _response) =
            tokio::time::timeout(timeout, tokio_tungstenite::connect_async(parsed.as_str()))
                .await
                .map_err(|_| Error::Timeout)??;
        let (write, read) = ws_stream.split();

        info!(url, "Connected to feed");
        Ok(Self {
            url: url.to_string(),
            write,
            read,
        })
    }

    /// Connect, retrying with backoff, and subscribe to `channel`
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] once `reconnect.max_retries`
    /// attempts have failed.
    pub async fn open(
        url: &str,
        channel: &str,
        timeout: Duration,
        reconnect: &ReconnectConfig,
    ) -> Result<Self, Error> {
        let mut attempt = 0;
        loop {
            match Self::connect(url, timeout).await {
                Ok(mut conn) => match conn.subscribe(channel).await {
                    Ok(()) => return Ok(conn),
                    Err(e) => warn!(url, channel, error = %e, "Subscribe failed"),
                },
                Err(e) if e.is_disconnect() => {
                    warn!(url, attempt, error = %e, "Connect failed");
                }
                Err(e) => return Err(e),
            }

            if reconnect.max_retries > 0 && attempt + 1 >= reconnect.max_retries {
                return Err(Error::ConnectionClosed);
            }
            tokio::time::sleep(reconnect.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }

    /// Endpoint this connection was opened against
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a command to the WebSocket server
    pub async fn send(&mut self, cmd: &FeedCommand) -> Result<(), Error> {
        let json = serde_json::to_string(cmd)?;
        debug!(url = %self.url, command = %json, "Sending command");
        self.write.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Subscribe to a channel
    pub async fn subscribe(&mut self, channel: &str) -> Result<(), Error> {
        self.send(&FeedCommand::subscribe(channel)).await?;
        info!(channel, "Subscribed to channel");
        Ok(())
    }

    /// Unsubscribe from a channel
    pub async fn unsubscribe(&mut self, channel: &str) -> Result<(), Error> {
        self.send(&FeedCommand::unsubscribe(channel)).await
    }

    /// Unsubscribe and immediately resubscribe, asking the server for a
    /// fresh baseline
    pub async fn resubscribe(&mut self, channel: &str) -> Result<(), Error> {
        for cmd in FeedCommand::resubscribe(channel) {
            self.send(&cmd).await?;
        }
        info!(channel, "Resubscribed to channel");
        Ok(())
    }

    /// Receive the next text frame
    ///
    /// Pings are answered automatically and other control frames skipped.
    ///
    /// # Returns
    ///
    /// The next text frame, `Err(ConnectionClosed)` on a close frame, or
    /// `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<String, Error>> {
        loop {
            match self.read.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Ping(data)) => {
                    // Respond to pings automatically
                    if let Err(e) = self.write.send(Message::Pong(data)).await {
                        return Some(Err(e.into()));
                    }
                }
                Ok(Message::Close(_)) => {
                    return Some(Err(Error::ConnectionClosed));
                }
                Ok(_) => {
                    // Ignore other message types (Binary, Pong, Frame)
                    continue;
                }
                Err(e) => {
                    return Some(Err(e.into()));
                }
            }
        }
    }

    /// Close the WebSocket connection
    pub async fn close(&mut self) -> Result<(), Error> {
        self.write.close().await?;
        Ok(())
    }
}

/// Configuration for reconnection behavior
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of connection attempts (0 = infinite)
    pub max_retries: u32,
    /// Initial delay between reconnection attempts
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum attempts (0 = infinite)
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay in milliseconds
    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set maximum delay in milliseconds
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay_ms)
    }
}
