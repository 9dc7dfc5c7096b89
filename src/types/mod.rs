//! Value types shared by the orderbook, the trade tracker and the wire layer.
//!
//! - [`messages`] - WebSocket frames (inbound book/trade data, outbound commands)

pub mod messages;

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use messages::{BookFrame, BookUpdate, FeedCommand, TradeFrame, UpdateKind};

/// Price of a level or a trade
///
/// Using `Decimal` instead of floating point for:
/// - Exact parsing of the feed's decimal text
/// - Exact key equality (`"100"`, `"100.0"` and `"100.00"` are one level)
pub type Price = Decimal;

/// Quantity resting at a price level
pub type Size = Decimal;

/// Side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side, ranked highest price first
    Bid,
    /// Sell side, ranked lowest price first
    Ask,
}

impl Side {
    /// Flash color given to a level that newly appears on this side
    #[must_use]
    pub const fn new_level_flash(self) -> FlashColor {
        match self {
            Side::Bid => FlashColor::Green,
            Side::Ask => FlashColor::Red,
        }
    }

    /// Lowercase name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient highlight color attached to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashColor {
    /// New bid, or size went up
    Green,
    /// New ask, or size went down
    Red,
}

impl FlashColor {
    /// Color for a size change, or `None` when the size did not move
    #[must_use]
    pub fn for_size_change(previous: Size, current: Size) -> Option<Self> {
        match current.cmp(&previous) {
            std::cmp::Ordering::Greater => Some(FlashColor::Green),
            std::cmp::Ordering::Less => Some(FlashColor::Red),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Lowercase name (`"green"` / `"red"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FlashColor::Green => "green",
            FlashColor::Red => "red",
        }
    }
}

impl fmt::Display for FlashColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which flash channel of a level an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlashField {
    /// New-level highlight
    #[serde(rename = "flashColor")]
    FlashColor,
    /// Size-change highlight
    #[serde(rename = "flashSizeColor")]
    FlashSizeColor,
}

impl FlashField {
    /// Field name as used by the presentation layer
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FlashField::FlashColor => "flashColor",
            FlashField::FlashSizeColor => "flashSizeColor",
        }
    }
}

impl fmt::Display for FlashField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the last trade price relative to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    /// Last trade printed higher
    Up,
    /// Last trade printed lower
    Down,
    /// No movement classified yet
    #[default]
    Same,
}

impl PriceDirection {
    /// Lowercase name (`"up"`, `"down"`, `"same"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PriceDirection::Up => "up",
            PriceDirection::Down => "down",
            PriceDirection::Same => "same",
        }
    }
}

impl fmt::Display for PriceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
