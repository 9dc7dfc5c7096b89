//! Live session: two feed connections driving one [`FeedState`].
//!
//! The session task is the single writer. It waits on three event sources
//! with `tokio::select!` and handles each event to completion before the
//! next:
//!
//! - a frame from the order-book connection
//! - a frame from the trade connection
//! - the earliest pending flash deadline
//!
//! A sequence gap resubscribes the book channel. A lost transport is
//! handled the same way, except the book is first replaced by a fresh empty
//! one since nothing received before the disconnect can be trusted.

use std::future::Future;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::websocket::FeedConnection;
use crate::config::Config;
use crate::error::Error;
use crate::feed::{BookEvent, FeedHandle, FeedState};

/// A configured, not yet running, feed session
///
/// # Example
///
/// ```rust,no_run
/// use orderbook_feed::{Config, Session};
///
/// # async fn example() -> orderbook_feed::Result<()> {
/// let session = Session::new(Config::new("BTCPFC"))?;
/// let handle = session.handle();
///
/// let task = tokio::spawn(session.run(async {
///     let _ = tokio::signal::ctrl_c().await;
/// }));
///
/// let mut changes = handle.subscribe();
/// while changes.changed().await.is_ok() {
///     let view = handle.view();
///     println!("{} bids, {} asks, last {:?}", view.bids.len(), view.asks.len(), view.last_price);
/// }
/// # let _ = task.await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    config: Config,
    handle: FeedHandle,
}

impl Session {
    /// Create a session with empty state
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let handle = FeedHandle::new(FeedState::from_config(&config));
        Ok(Self { config, handle })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle for the presentation layer
    pub fn handle(&self) -> FeedHandle {
        self.handle.clone()
    }

    /// Connect both feeds and process events until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns an error if a feed cannot be (re)connected within the
    /// configured retries.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<(), Error> {
        let book_channel = self.config.orderbook_channel();
        let trade_channel = self.config.trade_channel();

        let mut book = self.open(self.config.orderbook_url(), &book_channel).await?;
        let mut trades = self.open(self.config.trade_url(), &trade_channel).await?;
        tokio::pin!(shutdown);

        loop {
            let deadline = self.handle.next_flash_deadline();
            let flash_timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                () = &mut shutdown => {
                    info!("Session shutting down");
                    if let Err(e) = book.close().await {
                        debug!(error = %e, "Closing book feed");
                    }
                    if let Err(e) = trades.close().await {
                        debug!(error = %e, "Closing trade feed");
                    }
                    return Ok(());
                }

                frame = book.next() => match frame {
                    Some(Ok(text)) => {
                        let event = self.handle.handle_book_text(&text, Instant::now());
                        if let BookEvent::Resync { .. } = event {
                            if let Err(e) = book.resubscribe(&book_channel).await {
                                warn!(error = %e, "Resubscribe failed");
                                book = self.reopen_book(&book_channel).await?;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Book feed error");
                        book = self.reopen_book(&book_channel).await?;
                    }
                    None => {
                        warn!("Book feed ended");
                        book = self.reopen_book(&book_channel).await?;
                    }
                },

                frame = trades.next() => match frame {
                    Some(Ok(text)) => {
                        self.handle.handle_trade_text(&text);
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Trade feed error");
                        trades = self.open(self.config.trade_url(), &trade_channel).await?;
                    }
                    None => {
                        warn!("Trade feed ended");
                        trades = self.open(self.config.trade_url(), &trade_channel).await?;
                    }
                },

                () = flash_timer => {
                    self.handle.expire_flashes(Instant::now());
                }
            }
        }
    }

    async fn open(&self, url: &str, channel: &str) -> Result<FeedConnection, Error> {
        FeedConnection::open(
            url,
            channel,
            self.config.connect_timeout(),
            self.config.reconnect(),
        )
        .await
    }

    async fn reopen_book(&self, channel: &str) -> Result<FeedConnection, Error> {
        info!(channel, "Reconnecting book feed with a fresh book");
        self.handle.reset_book();
        self.open(self.config.orderbook_url(), channel).await
    }
}
