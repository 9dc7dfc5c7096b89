//! Last trade price and its direction.

use crate::types::{Price, PriceDirection};

/// Tracks the most recent trade price and how it moved
///
/// Only the immediately previous price is retained. An unchanged price
/// keeps whatever direction was last classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeTracker {
    last_price: Option<Price>,
    direction: PriceDirection,
}

impl TradeTracker {
    /// Create a tracker with no trades seen
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Price of the latest trade
    #[must_use]
    pub const fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    /// Direction of the latest price move
    #[must_use]
    pub const fn direction(&self) -> PriceDirection {
        self.direction
    }

    /// Record a new trade price and return the resulting direction
    ///
    /// The first trade is not classified.
    pub fn on_trade(&mut self, price: Price) -> PriceDirection {
        if let Some(previous) = self.last_price {
            if price > previous {
                self.direction = PriceDirection::Up;
            } else if price < previous {
                self.direction = PriceDirection::Down;
            }
        }
        self.last_price = Some(price);
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_trade_unclassified() {
        let mut tracker = TradeTracker::new();
        assert_eq!(tracker.on_trade(dec!(100)), PriceDirection::Same);
        assert_eq!(tracker.last_price(), Some(dec!(100)));
    }

    #[test]
    fn test_direction_sequence() {
        let mut tracker = TradeTracker::new();
        let observed: Vec<PriceDirection> = [dec!(100), dec!(105), dec!(105), dec!(95)]
            .into_iter()
            .map(|p| tracker.on_trade(p))
            .collect();

        assert_eq!(
            observed,
            vec![
                PriceDirection::Same,
                PriceDirection::Up,
                PriceDirection::Up,
                PriceDirection::Down,
            ]
        );
        assert_eq!(tracker.last_price(), Some(dec!(95)));
    }

    #[test]
    fn test_equal_prices_keep_direction() {
        let mut tracker = TradeTracker::new();
        tracker.on_trade(dec!(10));
        tracker.on_trade(dec!(9));
        for _ in 0..5 {
            assert_eq!(tracker.on_trade(dec!(9.00)), PriceDirection::Down);
        }
    }
}
