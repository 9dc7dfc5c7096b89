//! Feed state: the single writer behind the presentation view.
//!
//! [`FeedState`] owns the [`Book`], the [`FlashTracker`] and the
//! [`TradeTracker`]. Every inbound frame and every flash deadline goes
//! through it, one at a time, and it is the only thing that mutates them.
//!
//! [`FeedHandle`] is the cloneable read side handed to a presentation layer:
//! it projects a [`BookView`] on demand and exposes `clear_flash`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::orderbook::{Book, FlashTracker, Ladder, LadderRow, SyncOutcome};
use crate::trade::TradeTracker;
use crate::types::{BookFrame, FlashField, Price, PriceDirection, Side, Size, TradeFrame};

/// What a book frame did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookEvent {
    /// Delta applied
    Applied {
        /// Sequence number now recorded
        seq_num: u64,
    },
    /// Snapshot replaced the book
    Baseline {
        /// Sequence number now recorded
        seq_num: u64,
    },
    /// Sequence gap: the book channel must be unsubscribed and resubscribed
    Resync {
        /// Recorded sequence number
        expected: u64,
        /// Predecessor the rejected delta named
        received: Option<u64>,
    },
    /// Heartbeat, ack or incomplete frame; nothing changed
    Ignored,
}

impl BookEvent {
    /// Check if the frame changed the book
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, BookEvent::Applied { .. } | BookEvent::Baseline { .. })
    }
}

/// Snapshot handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookView {
    /// Bid rows, best first, with cumulative totals
    pub bids: Vec<LadderRow>,
    /// Ask rows, best first, with cumulative totals
    pub asks: Vec<LadderRow>,
    /// Depth-bar scale for bids
    pub max_bid_total: Size,
    /// Depth-bar scale for asks
    pub max_ask_total: Size,
    /// Latest trade price
    pub last_price: Option<Price>,
    /// Direction of the latest trade price move
    pub price_direction: PriceDirection,
}

/// Book, flash and trade state for one market
#[derive(Debug, Clone)]
pub struct FeedState {
    book: Book,
    flashes: FlashTracker,
    trades: TradeTracker,
    depth: usize,
}

impl FeedState {
    /// Create empty state showing `depth` rows per side
    #[must_use]
    pub fn new(depth: usize, flash_window: Duration) -> Self {
        Self {
            book: Book::new(),
            flashes: FlashTracker::new(flash_window),
            trades: TradeTracker::new(),
            depth,
        }
    }

    /// Create empty state from a client configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.depth(), config.flash_window())
    }

    /// The local book
    #[must_use]
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// The trade tracker
    #[must_use]
    pub fn trades(&self) -> &TradeTracker {
        &self.trades
    }

    /// The flash tracker
    #[must_use]
    pub fn flashes(&self) -> &FlashTracker {
        &self.flashes
    }

    /// Rows shown per side
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Handle a raw text frame from the book channel
    ///
    /// Text that is not a book frame is ignored.
    pub fn handle_book_text(&mut self, text: &str, now: Instant) -> BookEvent {
        match serde_json::from_str::<BookFrame>(text) {
            Ok(frame) => self.handle_book_frame(frame, now),
            Err(e) => {
                trace!(error = %e, "Ignoring non-book frame");
                BookEvent::Ignored
            }
        }
    }

    /// Handle a decoded book frame
    pub fn handle_book_frame(&mut self, frame: BookFrame, now: Instant) -> BookEvent {
        let Some(update) = frame.into_update() else {
            trace!("Ignoring incomplete book frame");
            return BookEvent::Ignored;
        };

        let event = match self.book.reconcile(&update) {
            SyncOutcome::Applied { seq_num } => BookEvent::Applied { seq_num },
            SyncOutcome::Baseline { seq_num } => BookEvent::Baseline { seq_num },
            SyncOutcome::Gap { expected, received } => {
                warn!(
                    expected,
                    received = ?received,
                    seq_num = update.seq_num,
                    "Sequence gap in book feed, dropping delta"
                );
                return BookEvent::Resync { expected, received };
            }
        };

        self.refresh_flashes(now);
        event
    }

    /// Handle a raw text frame from the trade channel
    ///
    /// Returns the new direction if the frame carried a trade.
    pub fn handle_trade_text(&mut self, text: &str) -> Option<PriceDirection> {
        match serde_json::from_str::<TradeFrame>(text) {
            Ok(frame) => self.handle_trade_frame(&frame),
            Err(e) => {
                trace!(error = %e, "Ignoring non-trade frame");
                None
            }
        }
    }

    /// Handle a decoded trade frame
    pub fn handle_trade_frame(&mut self, frame: &TradeFrame) -> Option<PriceDirection> {
        let price = frame.latest_price()?;
        let direction = self.trades.on_trade(price);
        debug!(%price, direction = direction.as_str(), "Trade");
        Some(direction)
    }

    /// Earliest pending flash clear
    #[must_use]
    pub fn next_flash_deadline(&self) -> Option<Instant> {
        self.flashes.next_deadline()
    }

    /// Clear every flash whose window has elapsed; returns how many fired
    ///
    /// A flash whose level has since disappeared is a no-op.
    pub fn expire_flashes(&mut self, now: Instant) -> usize {
        let due = self.flashes.expire(now);
        for key in &due {
            self.book.clear_side_flash(key.side, key.price, key.field);
        }
        due.len()
    }

    /// Clear a flash field at `price` on both sides
    ///
    /// Idempotent; returns whether anything was cleared.
    pub fn clear_flash(&mut self, price: Price, field: FlashField) -> bool {
        self.flashes.clear(price, field);
        self.book.clear_flash(price, field)
    }

    /// Replace the book with a fresh empty one
    ///
    /// Used when the transport is lost; trade state is kept.
    pub fn reset_book(&mut self) {
        self.book = Book::new();
        self.flashes.reset();
    }

    /// Project the current view
    #[must_use]
    pub fn view(&self) -> BookView {
        let ladder = Ladder::project(&self.book, self.depth);
        BookView {
            bids: ladder.bids,
            asks: ladder.asks,
            max_bid_total: ladder.max_bid_total,
            max_ask_total: ladder.max_ask_total,
            last_price: self.trades.last_price(),
            price_direction: self.trades.direction(),
        }
    }

    fn refresh_flashes(&mut self, now: Instant) {
        let ladder = Ladder::project(&self.book, self.depth);
        for (side, rows) in [(Side::Bid, &ladder.bids), (Side::Ask, &ladder.asks)] {
            for (price, color) in self.flashes.observe(side, rows, now) {
                self.book.set_size_flash(side, price, color);
            }
        }
    }
}

/// Shared, cloneable access to a [`FeedState`]
///
/// # Example
///
/// ```rust
/// use orderbook_feed::feed::{FeedHandle, FeedState};
/// use orderbook_feed::orderbook::{DEFAULT_DEPTH, DEFAULT_FLASH_WINDOW};
///
/// let handle = FeedHandle::new(FeedState::new(DEFAULT_DEPTH, DEFAULT_FLASH_WINDOW));
/// let view = handle.view();
/// assert!(view.bids.is_empty());
/// assert_eq!(view.last_price, None);
/// ```
#[derive(Debug, Clone)]
pub struct FeedHandle {
    state: Arc<RwLock<FeedState>>,
    revision: Arc<watch::Sender<u64>>,
}

impl FeedHandle {
    /// Wrap state for sharing
    #[must_use]
    pub fn new(state: FeedState) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(state)),
            revision: Arc::new(revision),
        }
    }

    /// Project the current view
    #[must_use]
    pub fn view(&self) -> BookView {
        self.state.read().view()
    }

    /// Clear a flash field at `price`; idempotent
    pub fn clear_flash(&self, price: Price, field: FlashField) -> bool {
        let cleared = self.state.write().clear_flash(price, field);
        if cleared {
            self.bump();
        }
        cleared
    }

    /// Feed a book-channel text frame through the state
    pub fn handle_book_text(&self, text: &str, now: Instant) -> BookEvent {
        let event = self.state.write().handle_book_text(text, now);
        if event.changed() {
            self.bump();
        }
        event
    }

    /// Feed a trade-channel text frame through the state
    pub fn handle_trade_text(&self, text: &str) -> Option<PriceDirection> {
        let direction = self.state.write().handle_trade_text(text);
        if direction.is_some() {
            self.bump();
        }
        direction
    }

    /// Clear every flash whose window has elapsed
    pub fn expire_flashes(&self, now: Instant) -> usize {
        let fired = self.state.write().expire_flashes(now);
        if fired > 0 {
            self.bump();
        }
        fired
    }

    /// Earliest pending flash clear
    #[must_use]
    pub fn next_flash_deadline(&self) -> Option<Instant> {
        self.state.read().next_flash_deadline()
    }

    /// Replace the book with a fresh empty one
    pub fn reset_book(&self) {
        self.state.write().reset_book();
        self.bump();
    }

    /// Receiver notified whenever the view may have changed
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision number
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Run `f` with exclusive access to the state, then notify watchers
    pub fn update<R>(&self, f: impl FnOnce(&mut FeedState) -> R) -> R {
        let result = f(&mut *self.state.write());
        self.bump();
        result
    }

    /// Run `f` with shared access to the state
    pub fn read<R>(&self, f: impl FnOnce(&FeedState) -> R) -> R {
        f(&*self.state.read())
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
