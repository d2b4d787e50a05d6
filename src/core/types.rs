//! Core types - Strong typing for safety

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::core::price::to_fraction;
use crate::core::traits::{DisplayRecord, Keyed};
use crate::core::{Error, Result};

/// Instrument identifier (CUSIP for Treasuries, e.g. "912828V23")
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        InstrumentId::new(s)
    }
}

/// Treasury bond static data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub id: InstrumentId,
    /// e.g. "US10Y"
    pub ticker: String,
    pub coupon: Decimal,
    pub maturity: NaiveDate,
}

impl Bond {
    pub fn new(
        id: impl Into<InstrumentId>,
        ticker: impl Into<String>,
        coupon: Decimal,
        maturity: NaiveDate,
    ) -> Self {
        Self { id: id.into(), ticker: ticker.into(), coupon, maturity }
    }
}

/// Implements the display/parse table for a field-less enum.
///
/// The `match` in `as_str` is exhaustive, so adding a variant without a
/// display string fails to compile; `ALL` drives the round-trip tests.
macro_rules! display_table {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(Error::Parse(format!(
                        "unknown {} {:?}", stringify!($ty), other
                    ))),
                }
            }
        }
    };
}

/// Quote side of a market data or streaming order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PricingSide {
    Bid,
    Offer,
}

display_table!(PricingSide { Bid => "BID", Offer => "OFFER" });

/// Trade side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

display_table!(Side { Buy => "BUY", Sell => "SELL" });

impl Side {
    /// Signed multiplier applied to quantities when netting positions.
    pub fn sign(&self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

/// Execution order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Fok,
    Ioc,
    Market,
    Limit,
    Stop,
}

display_table!(OrderType {
    Fok => "FOK",
    Ioc => "IOC",
    Market => "MARKET",
    Limit => "LIMIT",
    Stop => "STOP",
});

/// Customer inquiry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InquiryState {
    Received,
    Quoted,
    Done,
    Rejected,
    CustomerRejected,
}

display_table!(InquiryState {
    Received => "RECEIVED",
    Quoted => "QUOTED",
    Done => "DONE",
    Rejected => "REJECTED",
    CustomerRejected => "CUSTOMER_REJECTED",
});

/// Single market data order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub price: Decimal,
    pub quantity: i64,
    pub side: PricingSide,
}

impl Order {
    pub fn new(price: Decimal, quantity: i64, side: PricingSide) -> Self {
        Self { price, quantity, side }
    }
}

/// Best bid and best offer of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidOffer {
    pub bid: Order,
    pub offer: Order,
}

impl BidOffer {
    pub fn spread(&self) -> Decimal {
        self.offer.price - self.bid.price
    }
}

/// Internal mid price and bid/offer spread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub instrument: Bond,
    pub mid: Decimal,
    pub spread: Decimal,
}

impl PriceQuote {
    pub fn new(instrument: Bond, mid: Decimal, spread: Decimal) -> Self {
        Self { instrument, mid, spread }
    }

    /// Build a quote from a raw bid/ask pair.
    pub fn from_bid_ask(instrument: Bond, bid: Decimal, ask: Decimal) -> Self {
        Self {
            instrument,
            mid: (bid + ask) / Decimal::TWO,
            spread: ask - bid,
        }
    }
}

/// Order sent to market by the algo execution engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOrder {
    pub instrument: Bond,
    pub side: PricingSide,
    pub order_id: String,
    pub order_type: OrderType,
    pub price: Decimal,
    pub visible_quantity: i64,
    pub hidden_quantity: i64,
    pub parent_order_id: String,
    pub is_child: bool,
}

impl ExecutionOrder {
    pub fn total_quantity(&self) -> Result<i64> {
        self.visible_quantity.checked_add(self.hidden_quantity).ok_or_else(|| {
            Error::QuantityOverflow(format!("{} visible + hidden", self.order_id))
        })
    }
}

/// Booked trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub instrument: Bond,
    pub trade_id: String,
    pub price: Decimal,
    pub book: String,
    pub quantity: i64,
    pub side: Side,
}

/// Net position of one instrument, broken down by book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: Bond,
    pub books: BTreeMap<String, i64>,
}

impl Position {
    pub fn new(instrument: Bond) -> Self {
        Self { instrument, books: BTreeMap::new() }
    }

    /// Add a signed quantity to a book's running total. Leaves the position
    /// untouched when the book or the aggregate would overflow.
    pub fn add(&mut self, book: &str, quantity: i64) -> Result<()> {
        let overflow = || Error::QuantityOverflow(format!("{} book {}", self.instrument.id, book));
        let total = self.book_quantity(book).checked_add(quantity).ok_or_else(overflow)?;
        self.aggregate().checked_add(quantity).ok_or_else(overflow)?;
        self.books.insert(book.to_string(), total);
        Ok(())
    }

    pub fn book_quantity(&self, book: &str) -> i64 {
        self.books.get(book).copied().unwrap_or(0)
    }

    /// Net quantity over all books; saturates if `books` was filled directly.
    pub fn aggregate(&self) -> i64 {
        self.books.values().fold(0, |sum, q| sum.saturating_add(*q))
    }
}

/// PV01 risk of one instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pv01 {
    pub instrument: Bond,
    /// PV01 per unit of face
    pub pv01: Decimal,
    pub quantity: i64,
}

impl Pv01 {
    pub fn exposure(&self) -> Decimal {
        self.pv01 * Decimal::from(self.quantity)
    }
}

/// Named group of instruments for bucketed risk queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedSector {
    pub name: String,
    pub instruments: Vec<Bond>,
}

impl BucketedSector {
    pub fn new(name: impl Into<String>, instruments: Vec<Bond>) -> Self {
        Self { name: name.into(), instruments }
    }
}

/// Derived risk of a bucketed sector; never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRisk {
    pub sector: String,
    pub exposure: Decimal,
    pub instruments: usize,
}

/// One side of a streamed two-way price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamLeg {
    pub price: Decimal,
    pub visible_quantity: i64,
    pub hidden_quantity: i64,
    pub side: PricingSide,
}

/// Two-way price published to the street
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayQuote {
    pub instrument: Bond,
    pub bid: StreamLeg,
    pub offer: StreamLeg,
}

/// Customer inquiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub inquiry_id: String,
    pub instrument: Bond,
    pub side: Side,
    pub quantity: i64,
    pub price: Decimal,
    pub state: InquiryState,
}

// ── Store keys ──────────────────────────────────────────────────────────

impl Keyed for PriceQuote {
    type Key = InstrumentId;
    fn key(&self) -> InstrumentId {
        self.instrument.id.clone()
    }
}

impl Keyed for ExecutionOrder {
    type Key = InstrumentId;
    fn key(&self) -> InstrumentId {
        self.instrument.id.clone()
    }
}

impl Keyed for Trade {
    type Key = String;
    fn key(&self) -> String {
        self.trade_id.clone()
    }
}

impl Keyed for Position {
    type Key = InstrumentId;
    fn key(&self) -> InstrumentId {
        self.instrument.id.clone()
    }
}

impl Keyed for Pv01 {
    type Key = InstrumentId;
    fn key(&self) -> InstrumentId {
        self.instrument.id.clone()
    }
}

impl Keyed for TwoWayQuote {
    type Key = InstrumentId;
    fn key(&self) -> InstrumentId {
        self.instrument.id.clone()
    }
}

impl Keyed for Inquiry {
    type Key = String;
    fn key(&self) -> String {
        self.inquiry_id.clone()
    }
}

// ── Display fields ──────────────────────────────────────────────────────

impl DisplayRecord for PriceQuote {
    fn display_fields(&self) -> Vec<String> {
        vec![
            self.instrument.id.to_string(),
            to_fraction(self.mid),
            to_fraction(self.spread),
        ]
    }
}

impl DisplayRecord for ExecutionOrder {
    fn display_fields(&self) -> Vec<String> {
        vec![
            self.instrument.id.to_string(),
            self.side.to_string(),
            self.order_id.clone(),
            self.order_type.to_string(),
            to_fraction(self.price),
            self.visible_quantity.to_string(),
            self.hidden_quantity.to_string(),
            self.parent_order_id.clone(),
            if self.is_child { "YES" } else { "NO" }.to_string(),
        ]
    }
}

impl DisplayRecord for StreamLeg {
    fn display_fields(&self) -> Vec<String> {
        vec![
            to_fraction(self.price),
            self.visible_quantity.to_string(),
            self.hidden_quantity.to_string(),
            self.side.to_string(),
        ]
    }
}

impl DisplayRecord for TwoWayQuote {
    fn display_fields(&self) -> Vec<String> {
        let mut fields = vec![self.instrument.id.to_string()];
        fields.extend(self.bid.display_fields());
        fields.extend(self.offer.display_fields());
        fields
    }
}

impl DisplayRecord for Trade {
    fn display_fields(&self) -> Vec<String> {
        vec![
            self.instrument.id.to_string(),
            self.trade_id.clone(),
            to_fraction(self.price),
            self.book.clone(),
            self.quantity.to_string(),
            self.side.to_string(),
        ]
    }
}

impl DisplayRecord for Position {
    fn display_fields(&self) -> Vec<String> {
        let mut fields = vec![self.instrument.id.to_string()];
        for (book, quantity) in &self.books {
            fields.push(book.clone());
            fields.push(quantity.to_string());
        }
        fields
    }
}

impl DisplayRecord for Pv01 {
    fn display_fields(&self) -> Vec<String> {
        vec![
            self.instrument.id.to_string(),
            self.pv01.to_string(),
            self.quantity.to_string(),
        ]
    }
}

impl DisplayRecord for SectorRisk {
    fn display_fields(&self) -> Vec<String> {
        vec![
            self.sector.clone(),
            self.exposure.to_string(),
            self.instruments.to_string(),
        ]
    }
}

impl DisplayRecord for Inquiry {
    fn display_fields(&self) -> Vec<String> {
        vec![
            self.inquiry_id.clone(),
            self.instrument.id.to_string(),
            self.side.to_string(),
            self.quantity.to_string(),
            to_fraction(self.price),
            self.state.to_string(),
        ]
    }
}
