//! Ranked, size-limited depth ladders for display.
//!
//! Totals are derived here on every projection and never stored on the
//! levels themselves.

use rust_decimal::prelude::ToPrimitive;

use crate::types::{FlashColor, Price, Size};

use super::book::{Book, Level, Levels};

/// Number of rows shown per side
pub const DEFAULT_DEPTH: usize = 8;

/// One displayed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderRow {
    /// Level price
    pub price: Price,
    /// Level size
    pub size: Size,
    /// Cumulative size, see [`project_bids`] / [`project_asks`]
    pub total: Size,
    /// New-level flash
    pub flash_color: Option<FlashColor>,
    /// Size-change flash
    pub flash_size_color: Option<FlashColor>,
}

impl LadderRow {
    fn from_level(level: &Level) -> Self {
        Self {
            price: level.price,
            size: level.size,
            total: Size::ZERO,
            flash_color: level.flash_color,
            flash_size_color: level.flash_size_color,
        }
    }

    /// Width of this row's depth bar as a fraction of `max_total`, in `[0, 1]`
    #[must_use]
    pub fn depth_ratio(&self, max_total: Size) -> f64 {
        if max_total <= Size::ZERO {
            return 0.0;
        }
        (self.total / max_total)
            .to_f64()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

/// Best `depth` bids, highest price first, totals accumulated downward
/// from the best bid
#[must_use]
pub fn project_bids(levels: &Levels, depth: usize) -> Vec<LadderRow> {
    let mut total = Size::ZERO;
    levels
        .values()
        .rev()
        .take(depth)
        .map(|level| {
            total += level.size;
            LadderRow {
                total,
                ..LadderRow::from_level(level)
            }
        })
        .collect()
}

/// Best `depth` asks, lowest price first, totals accumulated from the
/// farthest displayed ask back toward the best one
#[must_use]
pub fn project_asks(levels: &Levels, depth: usize) -> Vec<LadderRow> {
    let mut rows: Vec<LadderRow> = levels.values().take(depth).map(LadderRow::from_level).collect();

    let mut total = Size::ZERO;
    for row in rows.iter_mut().rev() {
        total += row.size;
        row.total = total;
    }
    rows
}

/// Both ladders plus the totals used to scale depth bars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ladder {
    /// Bid rows, best first
    pub bids: Vec<LadderRow>,
    /// Ask rows, best first
    pub asks: Vec<LadderRow>,
    /// Largest bid total (the last bid row), `1` when there are no bids
    pub max_bid_total: Size,
    /// Largest ask total (the first ask row), `1` when there are no asks
    pub max_ask_total: Size,
}

impl Ladder {
    /// Project both sides of a book
    #[must_use]
    pub fn project(book: &Book, depth: usize) -> Self {
        Self::from_levels(book.bids(), book.asks(), depth)
    }

    /// Project from raw level maps
    #[must_use]
    pub fn from_levels(bids: &Levels, asks: &Levels, depth: usize) -> Self {
        let bids = project_bids(bids, depth);
        let asks = project_asks(asks, depth);
        let max_bid_total = bids.last().map_or(Size::ONE, |row| row.total);
        let max_ask_total = asks.first().map_or(Size::ONE, |row| row.total);
        Self {
            bids,
            asks,
            max_bid_total,
            max_ask_total,
        }
    }
}
