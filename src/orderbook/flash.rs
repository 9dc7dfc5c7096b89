//! Flash highlight lifecycle for displayed rows.
//!
//! A row is a level currently shown in the projected ladder. Each row owns
//! two independent flash channels:
//!
//! - **new level** ([`FlashField::FlashColor`]): set by the delta applier on
//!   insertion; the tracker schedules its clear when the row first shows it.
//! - **size change** ([`FlashField::FlashSizeColor`]): set by the tracker when
//!   the row's size differs from the previous size it observed.
//!
//! Each flash is cleared once its window elapses. Deadlines live on the row;
//! when a row leaves the ladder its deadlines go with it, so nothing fires
//! for a row that is no longer displayed.

use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use tokio::time::Instant;

use crate::types::{FlashColor, FlashField, Price, Side, Size};

use super::ladder::LadderRow;

/// How long a flash stays visible
pub const DEFAULT_FLASH_WINDOW: Duration = Duration::from_millis(500);

/// Identifies one pending flash clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlashKey {
    /// Side the row is on
    pub side: Side,
    /// Row price
    pub price: Price,
    /// Flash channel
    pub field: FlashField,
}

#[derive(Debug, Clone)]
struct RowState {
    previous_size: Size,
    flash_color: Option<FlashColor>,
    color_deadline: Option<Instant>,
    size_deadline: Option<Instant>,
}

/// Per-row flash state with deadline scheduling
#[derive(Debug, Clone)]
pub struct FlashTracker {
    window: Duration,
    rows: FxHashMap<(Side, Price), RowState>,
}

impl Default for FlashTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_WINDOW)
    }
}

impl FlashTracker {
    /// Create a tracker with the given display window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            rows: FxHashMap::default(),
        }
    }

    /// Display window for each flash
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Reconcile the tracked rows of `side` with the rows now displayed
    ///
    /// Rows that are no longer displayed are torn down along with their
    /// pending deadlines. Returns the size-change flashes to write onto the
    /// book's levels.
    pub fn observe(&mut self, side: Side, rows: &[LadderRow], now: Instant) -> Vec<(Price, FlashColor)> {
        let displayed: FxHashSet<Price> = rows.iter().map(|row| row.price).collect();
        self.rows
            .retain(|(row_side, price), _| *row_side != side || displayed.contains(price));

        let deadline = now + self.window;
        let mut size_flashes = Vec::new();

        for row in rows {
            let Some(state) = self.rows.get_mut(&(side, row.price)) else {
                self.rows.insert(
                    (side, row.price),
                    RowState {
                        previous_size: row.size,
                        flash_color: row.flash_color,
                        color_deadline: row.flash_color.map(|_| deadline),
                        size_deadline: None,
                    },
                );
                continue;
            };

            if row.flash_color != state.flash_color {
                state.flash_color = row.flash_color;
                state.color_deadline = row.flash_color.map(|_| deadline);
            }

            if let Some(color) = FlashColor::for_size_change(state.previous_size, row.size) {
                state.previous_size = row.size;
                state.size_deadline = Some(deadline);
                size_flashes.push((row.price, color));
            }
        }

        size_flashes
    }

    /// Earliest pending deadline across all rows
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.rows
            .values()
            .flat_map(|state| [state.color_deadline, state.size_deadline])
            .flatten()
            .min()
    }

    /// Take every flash whose deadline is at or before `now`
    ///
    /// Returned keys are sorted so callers process them deterministically.
    pub fn expire(&mut self, now: Instant) -> Vec<FlashKey> {
        let mut due = Vec::new();
        for (&(side, price), state) in &mut self.rows {
            if take_due(&mut state.color_deadline, now) {
                state.flash_color = None;
                due.push(FlashKey {
                    side,
                    price,
                    field: FlashField::FlashColor,
                });
            }
            if take_due(&mut state.size_deadline, now) {
                due.push(FlashKey {
                    side,
                    price,
                    field: FlashField::FlashSizeColor,
                });
            }
        }
        due.sort_unstable();
        due
    }

    /// Pending deadline for one flash, if scheduled
    #[must_use]
    pub fn deadline(&self, key: FlashKey) -> Option<Instant> {
        let state = self.rows.get(&(key.side, key.price))?;
        match key.field {
            FlashField::FlashColor => state.color_deadline,
            FlashField::FlashSizeColor => state.size_deadline,
        }
    }

    /// Forget a flash at `price` on both sides, cancelling its deadline
    ///
    /// Call this whenever the flash is cleared on the book outside of
    /// [`FlashTracker::expire`], so a later re-insertion is scheduled again.
    pub fn clear(&mut self, price: Price, field: FlashField) -> bool {
        let mut cancelled = false;
        for side in [Side::Bid, Side::Ask] {
            let Some(state) = self.rows.get_mut(&(side, price)) else {
                continue;
            };
            match field {
                FlashField::FlashColor => {
                    state.flash_color = None;
                    cancelled |= state.color_deadline.take().is_some();
                }
                FlashField::FlashSizeColor => {
                    cancelled |= state.size_deadline.take().is_some();
                }
            }
        }
        cancelled
    }

    /// Tear down a single row, cancelling its deadlines
    pub fn teardown(&mut self, side: Side, price: Price) -> bool {
        self.rows.remove(&(side, price)).is_some()
    }

    /// Tear down every row
    pub fn reset(&mut self) {
        self.rows.clear();
    }

    /// Number of rows being tracked
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows are tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn take_due(deadline: &mut Option<Instant>, now: Instant) -> bool {
    match *deadline {
        Some(at) if at <= now => {
            *deadline = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(price: Price, size: Size, flash: Option<FlashColor>) -> LadderRow {
        LadderRow {
            price,
            size,
            total: size,
            flash_color: flash,
            flash_size_color: None,
        }
    }

    fn key(side: Side, price: Price, field: FlashField) -> FlashKey {
        FlashKey { side, price, field }
    }

    #[test]
    fn test_new_row_schedules_color_clear() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();

        let flashes = tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), Some(FlashColor::Green))], now);
        assert!(flashes.is_empty());
        assert_eq!(
            tracker.deadline(key(Side::Bid, dec!(100), FlashField::FlashColor)),
            Some(now + DEFAULT_FLASH_WINDOW)
        );
        assert_eq!(tracker.next_deadline(), Some(now + DEFAULT_FLASH_WINDOW));
    }

    #[test]
    fn test_size_change_colors() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();
        tracker.observe(Side::Ask, &[row(dec!(101), dec!(2), None)], now);

        let up = tracker.observe(Side::Ask, &[row(dec!(101), dec!(3), None)], now);
        assert_eq!(up, vec![(dec!(101), FlashColor::Green)]);

        let down = tracker.observe(Side::Ask, &[row(dec!(101), dec!(1), None)], now);
        assert_eq!(down, vec![(dec!(101), FlashColor::Red)]);

        let same = tracker.observe(Side::Ask, &[row(dec!(101), dec!(1.0), None)], now);
        assert!(same.is_empty());
    }

    #[test]
    fn test_size_change_replaces_pending_deadline() {
        let mut tracker = FlashTracker::new(Duration::from_millis(500));
        let start = Instant::now();
        let later = start + Duration::from_millis(300);
        let size_key = key(Side::Bid, dec!(100), FlashField::FlashSizeColor);

        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), None)], start);
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(2), None)], start);
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(3), None)], later);

        assert_eq!(tracker.deadline(size_key), Some(later + Duration::from_millis(500)));
        assert!(tracker.expire(start + Duration::from_millis(500)).is_empty());
        assert_eq!(tracker.expire(later + Duration::from_millis(500)), vec![size_key]);
    }

    #[test]
    fn test_expire_is_one_shot() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();
        tracker.observe(
            Side::Bid,
            &[
                row(dec!(100), dec!(1), Some(FlashColor::Green)),
                row(dec!(99), dec!(1), Some(FlashColor::Green)),
            ],
            now,
        );

        assert!(tracker.expire(now).is_empty());

        let due = tracker.expire(now + DEFAULT_FLASH_WINDOW);
        assert_eq!(
            due,
            vec![
                key(Side::Bid, dec!(99), FlashField::FlashColor),
                key(Side::Bid, dec!(100), FlashField::FlashColor),
            ]
        );
        assert!(tracker.expire(now + DEFAULT_FLASH_WINDOW * 2).is_empty());
        assert_eq!(tracker.next_deadline(), None);
    }

    #[test]
    fn test_reinserted_flash_after_expiry_is_rescheduled() {
        let mut tracker = FlashTracker::default();
        let start = Instant::now();
        let color_key = key(Side::Bid, dec!(100), FlashField::FlashColor);
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), Some(FlashColor::Green))], start);
        assert_eq!(tracker.expire(start + DEFAULT_FLASH_WINDOW), vec![color_key]);

        // Level deleted and re-inserted within one batch: same row, new flash
        let later = start + Duration::from_secs(2);
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(2), Some(FlashColor::Green))], later);

        assert_eq!(tracker.deadline(color_key), Some(later + DEFAULT_FLASH_WINDOW));
    }

    #[test]
    fn test_clear_cancels_and_forgets_flash() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), Some(FlashColor::Green))], now);
        tracker.observe(Side::Ask, &[row(dec!(100), dec!(1), Some(FlashColor::Red))], now);

        assert!(tracker.clear(dec!(100), FlashField::FlashColor));
        assert!(!tracker.clear(dec!(100), FlashField::FlashColor));
        assert!(!tracker.clear(dec!(5), FlashField::FlashSizeColor));
        assert_eq!(tracker.next_deadline(), None);

        let later = now + Duration::from_secs(1);
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), Some(FlashColor::Green))], later);
        assert_eq!(
            tracker.deadline(key(Side::Bid, dec!(100), FlashField::FlashColor)),
            Some(later + DEFAULT_FLASH_WINDOW)
        );
    }

    #[test]
    fn test_hidden_row_is_torn_down() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), Some(FlashColor::Green))], now);
        tracker.observe(Side::Ask, &[row(dec!(100), dec!(1), Some(FlashColor::Red))], now);

        tracker.observe(Side::Bid, &[], now);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.deadline(key(Side::Bid, dec!(100), FlashField::FlashColor)), None);
        assert!(tracker
            .deadline(key(Side::Ask, dec!(100), FlashField::FlashColor))
            .is_some());
    }

    #[test]
    fn test_returning_row_starts_fresh() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();
        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), None)], now);
        tracker.observe(Side::Bid, &[], now);

        let flashes = tracker.observe(Side::Bid, &[row(dec!(100), dec!(5), None)], now);
        assert!(flashes.is_empty());
    }

    #[test]
    fn test_cleared_color_not_rescheduled() {
        let mut tracker = FlashTracker::default();
        let now = Instant::now();
        let color_key = key(Side::Bid, dec!(100), FlashField::FlashColor);

        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), Some(FlashColor::Green))], now);
        assert_eq!(tracker.expire(now + DEFAULT_FLASH_WINDOW), vec![color_key]);

        tracker.observe(Side::Bid, &[row(dec!(100), dec!(1), None)], now);
        assert_eq!(tracker.deadline(color_key), None);
        assert!(tracker.teardown(Side::Bid, dec!(100)));
        assert!(tracker.is_empty());
    }
}
