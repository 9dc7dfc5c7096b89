//! WebSocket message types.
//!
//! This module contains the control commands sent to the feed and the
//! frames received on the order-book and trade channels.
//!
//! Inbound frames are deserialized leniently: every field is optional so
//! that heartbeats, subscribe acknowledgements and partial frames parse
//! cleanly and can be dropped by the caller instead of erroring.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Price, Size};

/// Control command sent to the server
///
/// Serializes as `{"op": "subscribe", "args": ["update:BTCPFC_0"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "lowercase")]
pub enum FeedCommand {
    /// Subscribe to channels
    Subscribe(Vec<String>),
    /// Unsubscribe from channels
    Unsubscribe(Vec<String>),
}

impl FeedCommand {
    /// Subscribe to a single channel
    pub fn subscribe(channel: impl Into<String>) -> Self {
        FeedCommand::Subscribe(vec![channel.into()])
    }

    /// Unsubscribe from a single channel
    pub fn unsubscribe(channel: impl Into<String>) -> Self {
        FeedCommand::Unsubscribe(vec![channel.into()])
    }

    /// Unsubscribe immediately followed by subscribe, forcing a fresh baseline
    pub fn resubscribe(channel: &str) -> [Self; 2] {
        [Self::unsubscribe(channel), Self::subscribe(channel)]
    }

    /// Channels this command targets
    pub fn channels(&self) -> &[String] {
        match self {
            FeedCommand::Subscribe(args) | FeedCommand::Unsubscribe(args) => args,
        }
    }
}

/// Frame received on the order-book channel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFrame {
    /// Channel the frame belongs to
    #[serde(default)]
    pub topic: Option<String>,
    /// Book payload (absent on heartbeats and acks)
    #[serde(default)]
    pub data: Option<BookFrameData>,
}

/// Order-book payload
///
/// Price levels are `[price, size]` pairs, normally sent as decimal text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFrameData {
    /// Bid updates
    #[serde(default)]
    pub bids: Option<Vec<RawLevel>>,
    /// Ask updates
    #[serde(default)]
    pub asks: Option<Vec<RawLevel>>,
    /// Sequence number of this frame
    #[serde(default, rename = "seqNum")]
    pub seq_num: Option<u64>,
    /// Sequence number of the frame this one follows
    #[serde(default, rename = "prevSeqNum")]
    pub prev_seq_num: Option<u64>,
    /// Snapshot or delta
    #[serde(default, rename = "type")]
    pub kind: Option<UpdateKind>,
    /// Market symbol
    #[serde(default)]
    pub symbol: Option<String>,
    /// Server timestamp (Unix ms)
    #[serde(default)]
    pub timestamp: Option<u64>,
}

/// Kind of book frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Full baseline replacing the local book
    Snapshot,
    /// Incremental changes since `prevSeqNum`
    #[default]
    #[serde(other)]
    Delta,
}

/// A validated book frame with every required field present
#[derive(Debug, Clone)]
pub struct BookUpdate {
    /// Snapshot or delta
    pub kind: UpdateKind,
    /// Sequence number of this update
    pub seq_num: u64,
    /// Sequence number this update claims to follow
    pub prev_seq_num: Option<u64>,
    /// Raw bid pairs
    pub bids: Vec<RawLevel>,
    /// Raw ask pairs
    pub asks: Vec<RawLevel>,
}

impl BookFrame {
    /// Extract the update, or `None` if `data`, `bids`, `asks` or `seqNum`
    /// is missing. Nothing from an incomplete frame is ever applied.
    ///
    /// The feed numbers frames from 1, so `seqNum: 0` counts as missing.
    pub fn into_update(self) -> Option<BookUpdate> {
        let data = self.data?;
        Some(BookUpdate {
            kind: data.kind.unwrap_or_default(),
            seq_num: data.seq_num.filter(|&seq| seq != 0)?,
            prev_seq_num: data.prev_seq_num,
            bids: data.bids?,
            asks: data.asks?,
        })
    }
}

/// One `[price, size]` entry exactly as received
///
/// Kept as raw JSON so a single malformed pair can be dropped without
/// failing the whole frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawLevel(pub Vec<serde_json::Value>);

impl RawLevel {
    /// Build from price and size text
    pub fn new(price: &str, size: &str) -> Self {
        RawLevel(vec![
            serde_json::Value::String(price.to_string()),
            serde_json::Value::String(size.to_string()),
        ])
    }

    /// Parse into `(price, size)`; `None` if either element is missing or
    /// not a decimal
    pub fn parse(&self) -> Option<(Price, Size)> {
        let price = decimal_from_json(self.0.first()?)?;
        let size = decimal_from_json(self.0.get(1)?)?;
        Some((price, size))
    }
}

fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(text) => parse_decimal(text),
        serde_json::Value::Number(number) => parse_decimal(&number.to_string()),
        _ => None,
    }
}

/// Parse decimal text, accepting plain (`"0.0125"`) and scientific
/// (`"1.25e-2"`) notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Frame received on the trade channel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeFrame {
    /// Channel the frame belongs to
    #[serde(default)]
    pub topic: Option<String>,
    /// Trade payload; only an array of trades is meaningful
    ///
    /// Kept as raw JSON so that only the newest entry has to be well formed.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// A single executed trade
#[derive(Debug, Clone, Deserialize)]
pub struct TradeTick {
    /// Execution price
    pub price: Price,
    /// Traded size
    #[serde(default)]
    pub size: Option<Size>,
    /// Aggressor side as reported (`"BUY"` / `"SELL"`)
    #[serde(default)]
    pub side: Option<String>,
    /// Execution time (Unix ms)
    #[serde(default)]
    pub timestamp: Option<u64>,
}

impl TradeFrame {
    /// Newest trade (`data[0]`), or `None` for empty / non-array payloads
    /// or a newest entry without a usable price
    ///
    /// Older entries in the batch are never inspected.
    pub fn latest_trade(&self) -> Option<TradeTick> {
        let newest = self.data.as_ref()?.as_array()?.first()?;
        TradeTick::deserialize(newest).ok()
    }

    /// Price of the newest trade
    pub fn latest_price(&self) -> Option<Price> {
        self.latest_trade().map(|trade| trade.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_subscribe_command_serialization() {
        let cmd = FeedCommand::subscribe("update:BTCPFC_0");
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"op":"subscribe","args":["update:BTCPFC_0"]}"#);
    }

    #[test]
    fn test_resubscribe_order() {
        let [first, second] = FeedCommand::resubscribe("update:BTCPFC_0");
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            r#"{"op":"unsubscribe","args":["update:BTCPFC_0"]}"#
        );
        assert_eq!(second, FeedCommand::subscribe("update:BTCPFC_0"));
        assert_eq!(second.channels(), ["update:BTCPFC_0".to_string()]);
    }

    #[test]
    fn test_book_frame_deserialization() {
        let json = r#"{
            "topic": "update:BTCPFC_0",
            "data": {
                "bids": [["100", "1.5"], ["99", "2"]],
                "asks": [["101", "1.2"]],
                "seqNum": 7,
                "prevSeqNum": 6,
                "type": "delta",
                "symbol": "BTCPFC",
                "timestamp": 1700000000000
            }
        }"#;

        let frame: BookFrame = serde_json::from_str(json).unwrap();
        let update = frame.into_update().unwrap();
        assert_eq!(update.kind, UpdateKind::Delta);
        assert_eq!(update.seq_num, 7);
        assert_eq!(update.prev_seq_num, Some(6));
        assert_eq!(update.bids.len(), 2);
        assert_eq!(update.bids[0].parse(), Some((dec!(100), dec!(1.5))));
    }

    #[test]
    fn test_snapshot_kind_and_null_prev() {
        let json = r#"{"data":{"bids":[],"asks":[],"seqNum":1,"prevSeqNum":null,"type":"snapshot"}}"#;
        let update = serde_json::from_str::<BookFrame>(json)
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.kind, UpdateKind::Snapshot);
        assert_eq!(update.prev_seq_num, None);
    }

    #[test]
    fn test_unknown_kind_is_delta() {
        let json = r#"{"data":{"bids":[],"asks":[],"seqNum":1,"type":"update"}}"#;
        let update = serde_json::from_str::<BookFrame>(json)
            .unwrap()
            .into_update()
            .unwrap();
        assert_eq!(update.kind, UpdateKind::Delta);
    }

    #[test]
    fn test_incomplete_frames_yield_nothing() {
        for json in [
            r#"{"event":"subscribe","channel":["update:BTCPFC_0"]}"#,
            r#"{"data":{"asks":[],"seqNum":3}}"#,
            r#"{"data":{"bids":[],"seqNum":3}}"#,
            r#"{"data":{"bids":[],"asks":[]}}"#,
            r#"{"data":{"bids":[["100","1"]],"asks":[],"seqNum":0}}"#,
        ] {
            let frame: BookFrame = serde_json::from_str(json).unwrap();
            assert!(frame.into_update().is_none(), "{json}");
        }
    }

    #[test]
    fn test_raw_level_parsing() {
        assert_eq!(
            RawLevel::new("27123.5", "0.010").parse(),
            Some((dec!(27123.5), dec!(0.01)))
        );
        assert_eq!(
            RawLevel::new("27000", "2.5e-1").parse(),
            Some((dec!(27000), dec!(0.25)))
        );
        assert_eq!(RawLevel::new("abc", "1").parse(), None);

        let numeric: RawLevel = serde_json::from_str("[100.25, 3]").unwrap();
        assert_eq!(numeric.parse(), Some((dec!(100.25), dec!(3))));

        let short: RawLevel = serde_json::from_str(r#"["100"]"#).unwrap();
        assert_eq!(short.parse(), None);
    }

    #[test]
    fn test_trade_frame_latest_price() {
        let json = r#"{
            "topic": "tradeHistoryApi:BTCPFC",
            "data": [
                {"price": 50025.5, "size": 12, "side": "BUY", "timestamp": 1700000000000},
                {"price": 50020, "size": 1, "side": "SELL", "timestamp": 1699999999000}
            ]
        }"#;
        let frame: TradeFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.latest_price(), Some(dec!(50025.5)));
    }

    #[test]
    fn test_trade_frame_ignores_non_arrays() {
        for json in [
            r#"{"data":[]}"#,
            r#"{"data":{"price":1}}"#,
            r#"{"event":"subscribe"}"#,
        ] {
            let frame: TradeFrame = serde_json::from_str(json).unwrap();
            assert_eq!(frame.latest_price(), None, "{json}");
        }
    }

    #[test]
    fn test_trade_frame_reads_only_newest_entry() {
        let json = r#"{"data":[{"price":"100","side":"BUY"},{"size":1},"junk"]}"#;
        let frame: TradeFrame = serde_json::from_str(json).unwrap();
        let trade = frame.latest_trade().unwrap();
        assert_eq!(trade.price, dec!(100));
        assert_eq!(trade.side.as_deref(), Some("BUY"));

        let json = r#"{"data":[{"size":1},{"price":100}]}"#;
        let frame: TradeFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.latest_price(), None);
    }
}
