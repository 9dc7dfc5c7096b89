//! Order-book state reconciliation.
//!
//! This module turns the feed's sequence-numbered delta stream into a
//! consistent, bounded, display-ready book:
//!
//! - [`book`] - level maps, the delta applier and snapshot handling
//! - [`sequence`] - gap detection on `seqNum` / `prevSeqNum`
//! - [`ladder`] - top-N ranked ladders with cumulative totals
//! - [`flash`] - per-row flash highlights and their clear deadlines
//!
//! # Example
//!
//! ```rust
//! use orderbook_feed::orderbook::{Book, Ladder, DEFAULT_DEPTH};
//! use orderbook_feed::types::Side;
//! use rust_decimal::Decimal;
//!
//! let mut book = Book::new();
//! book.apply(Side::Bid, &[(Decimal::from(100), Decimal::from(2))]);
//! book.apply(Side::Ask, &[(Decimal::from(101), Decimal::from(1))]);
//!
//! let ladder = Ladder::project(&book, DEFAULT_DEPTH);
//! assert_eq!(ladder.bids[0].total, Decimal::from(2));
//! assert_eq!(book.spread(), Some(Decimal::from(1)));
//! ```

pub mod book;
pub mod flash;
pub mod ladder;
pub mod sequence;

pub use book::{apply_delta, Book, Level, Levels, SyncOutcome};
pub use flash::{FlashKey, FlashTracker, DEFAULT_FLASH_WINDOW};
pub use ladder::{Ladder, LadderRow, DEFAULT_DEPTH};
pub use sequence::{SequenceCheck, SequenceGuard};
