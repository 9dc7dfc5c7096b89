//! Core orderbook data structure.
//!
//! Each side is a `BTreeMap` keyed by price, providing:
//!
//! - O(log n) insertion, deletion, and lookup
//! - O(1) access to best bid/ask (via `first_key_value` / `last_key_value`)
//! - Ordered iteration for ladder projection
//!
//! Updates from the feed are absolute: a `(price, size)` pair sets the size
//! at that price, and a size of zero removes the level.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::types::messages::RawLevel;
use crate::types::{BookUpdate, FlashColor, FlashField, Price, Side, Size, UpdateKind};

use super::sequence::{SequenceCheck, SequenceGuard};

/// One price point on one side of the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    /// Price (unique within its side)
    pub price: Price,
    /// Quantity available, never zero while stored
    pub size: Size,
    /// Set when the level newly appeared
    pub flash_color: Option<FlashColor>,
    /// Set when the level's size changed
    pub flash_size_color: Option<FlashColor>,
}

impl Level {
    /// Create a freshly inserted level, flashed with the side's color
    #[must_use]
    pub fn new(price: Price, size: Size, side: Side) -> Self {
        Self {
            price,
            size,
            flash_color: Some(side.new_level_flash()),
            flash_size_color: None,
        }
    }

    /// Read one flash channel
    #[must_use]
    pub const fn flash(&self, field: FlashField) -> Option<FlashColor> {
        match field {
            FlashField::FlashColor => self.flash_color,
            FlashField::FlashSizeColor => self.flash_size_color,
        }
    }

    /// Write one flash channel
    pub fn set_flash(&mut self, field: FlashField, color: Option<FlashColor>) {
        match field {
            FlashField::FlashColor => self.flash_color = color,
            FlashField::FlashSizeColor => self.flash_size_color = color,
        }
    }
}

/// Levels of one side, keyed by price
pub type Levels = BTreeMap<Price, Level>;

/// Apply a batch of `(price, size)` updates to one side, returning the new map
///
/// - size zero removes the level (no-op when absent)
/// - a new price is inserted with the side's new-level flash
/// - an existing price has its size replaced; its flash markers are left alone
#[must_use]
pub fn apply_delta(levels: &Levels, updates: &[(Price, Size)], side: Side) -> Levels {
    let mut updated = levels.clone();
    apply_in_place(&mut updated, updates.iter().copied(), side);
    updated
}

fn apply_in_place(levels: &mut Levels, updates: impl IntoIterator<Item = (Price, Size)>, side: Side) {
    for (price, size) in updates {
        if size.is_zero() {
            levels.remove(&price);
            continue;
        }

        match levels.get_mut(&price) {
            Some(level) => {
                level.price = price;
                level.size = size;
            }
            None => {
                levels.insert(price, Level::new(price, size, side));
            }
        }
    }
}

/// Parse raw feed pairs, dropping (and logging) any pair that is not a
/// decimal `[price, size]` with a non-negative size
pub fn parse_updates(raw: &[RawLevel], side: Side) -> Vec<(Price, Size)> {
    raw.iter()
        .filter_map(|level| match level.parse() {
            Some((price, size)) if !size.is_sign_negative() => Some((price, size)),
            _ => {
                warn!(side = side.as_str(), level = ?level.0, "Dropping malformed price level");
                None
            }
        })
        .collect()
}

/// Clear one flash field on a side; no-op when the price is absent
pub fn clear_flash(levels: &mut Levels, price: Price, field: FlashField) -> bool {
    match levels.get_mut(&price) {
        Some(level) => {
            let had = level.flash(field).is_some();
            level.set_flash(field, None);
            had
        }
        None => false,
    }
}

/// How a book update was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Delta applied on top of the existing book
    Applied {
        /// Sequence number now recorded
        seq_num: u64,
    },
    /// Snapshot replaced the book
    Baseline {
        /// Sequence number now recorded
        seq_num: u64,
    },
    /// Delta rejected; the channel must be resubscribed
    Gap {
        /// Recorded sequence number (unchanged)
        expected: u64,
        /// Predecessor the delta named
        received: Option<u64>,
    },
}

/// Local order book for a single market: bids, asks and the sequence guard.
///
/// # Thread Safety
///
/// This struct is `Send + Sync` but not internally synchronized. For
/// concurrent access, wrap in `parking_lot::RwLock`.
#[derive(Debug, Clone, Default)]
pub struct Book {
    bids: Levels,
    asks: Levels,
    sequence: SequenceGuard,
}

impl Book {
    /// Create a new empty book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last applied sequence number
    #[must_use]
    pub const fn seq_num(&self) -> Option<u64> {
        self.sequence.last()
    }

    /// Bid levels, keyed by price
    #[must_use]
    pub fn bids(&self) -> &Levels {
        &self.bids
    }

    /// Ask levels, keyed by price
    #[must_use]
    pub fn asks(&self) -> &Levels {
        &self.asks
    }

    /// Levels of one side
    #[must_use]
    pub fn levels(&self, side: Side) -> &Levels {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut Levels {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Look up a level
    #[must_use]
    pub fn level(&self, side: Side, price: Price) -> Option<&Level> {
        self.levels(side).get(&price)
    }

    /// Apply updates to one side without touching the sequence number
    pub fn apply(&mut self, side: Side, updates: &[(Price, Size)]) {
        apply_in_place(self.levels_mut(side), updates.iter().copied(), side);
    }

    /// Run a validated feed update through the sequence guard
    ///
    /// Snapshots are accepted unconditionally and rebuild both sides; levels
    /// that already existed keep their flash markers. Deltas are applied only
    /// when continuous; a gap leaves the book and its sequence untouched.
    pub fn reconcile(&mut self, update: &BookUpdate) -> SyncOutcome {
        if update.kind == UpdateKind::Snapshot {
            let bids = parse_updates(&update.bids, Side::Bid);
            let asks = parse_updates(&update.asks, Side::Ask);
            self.bids = rebuild(&self.bids, &bids, Side::Bid);
            self.asks = rebuild(&self.asks, &asks, Side::Ask);
            self.sequence.adopt(update.seq_num);
            debug!(
                seq_num = update.seq_num,
                bids = self.bids.len(),
                asks = self.asks.len(),
                "Applied book snapshot"
            );
            return SyncOutcome::Baseline {
                seq_num: update.seq_num,
            };
        }

        match self.sequence.check(update.prev_seq_num) {
            SequenceCheck::Continuous => {
                let bids = parse_updates(&update.bids, Side::Bid);
                let asks = parse_updates(&update.asks, Side::Ask);
                self.apply(Side::Bid, &bids);
                self.apply(Side::Ask, &asks);
                self.sequence.adopt(update.seq_num);
                SyncOutcome::Applied {
                    seq_num: update.seq_num,
                }
            }
            SequenceCheck::Gap { expected, received } => SyncOutcome::Gap { expected, received },
        }
    }

    /// Clear a flash field at `price` on both sides
    ///
    /// Idempotent, and a no-op for prices that are not in the book.
    pub fn clear_flash(&mut self, price: Price, field: FlashField) -> bool {
        let bid = clear_flash(&mut self.bids, price, field);
        let ask = clear_flash(&mut self.asks, price, field);
        bid || ask
    }

    /// Clear a flash field at `price` on one side only
    pub fn clear_side_flash(&mut self, side: Side, price: Price, field: FlashField) -> bool {
        clear_flash(self.levels_mut(side), price, field)
    }

    /// Mark a size change on an existing level
    pub fn set_size_flash(&mut self, side: Side, price: Price, color: FlashColor) -> bool {
        match self.levels_mut(side).get_mut(&price) {
            Some(level) => {
                level.flash_size_color = Some(color);
                true
            }
            None => false,
        }
    }

    /// Get the best bid (highest price)
    ///
    /// Returns `(price, size)` or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<(Price, Size)> {
        self.bids.last_key_value().map(|(&p, l)| (p, l.size))
    }

    /// Get the best ask (lowest price)
    ///
    /// Returns `(price, size)` or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<(Price, Size)> {
        self.asks.first_key_value().map(|(&p, l)| (p, l.size))
    }

    /// Get the spread (best ask minus best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    /// Get the mid price
    ///
    /// Returns the average of best bid and best ask, or `None` if either is missing.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some((bid + ask) / Price::TWO),
            _ => None,
        }
    }

    /// Check if the book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get the number of price levels as `(bids, asks)`
    #[must_use]
    pub fn num_levels(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}

fn rebuild(previous: &Levels, updates: &[(Price, Size)], side: Side) -> Levels {
    let mut fresh = Levels::new();
    apply_in_place(&mut fresh, updates.iter().copied(), side);
    for (price, level) in &mut fresh {
        if let Some(old) = previous.get(price) {
            level.flash_color = old.flash_color;
            level.flash_size_color = old.flash_size_color;
        }
    }
    fresh
}
