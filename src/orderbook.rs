//! Order book aggregation - best bid/offer and depth per price level

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{BidOffer, Bond, Error, InstrumentId, Keyed, Listener, Order, PricingSide, Result};
use crate::store::EventStore;

/// Order stacks of a single instrument.
/// Raw snapshots are unordered and may repeat a price; aggregated books hold
/// one order per price, bids descending and offers ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub instrument: Bond,
    pub bids: Vec<Order>,
    pub offers: Vec<Order>,
}

impl OrderBook {
    pub fn new(instrument: Bond, bids: Vec<Order>, offers: Vec<Order>) -> Self {
        Self { instrument, bids, offers }
    }

    /// Build a book from mixed-side orders.
    pub fn from_orders(instrument: Bond, orders: impl IntoIterator<Item = Order>) -> Self {
        let (bids, offers) = orders.into_iter().partition(|o| o.side == PricingSide::Bid);
        Self { instrument, bids, offers }
    }

    /// Highest bid and lowest offer. Ties keep the first order encountered.
    pub fn best_bid_offer(&self) -> Result<BidOffer> {
        let bid = best(&self.bids, |candidate, current| candidate > current)
            .ok_or_else(|| self.empty_side("bid"))?;
        let offer = best(&self.offers, |candidate, current| candidate < current)
            .ok_or_else(|| self.empty_side("offer"))?;
        Ok(BidOffer { bid: bid.clone(), offer: offer.clone() })
    }

    /// One order per distinct price with quantities summed, best price first.
    pub fn aggregated(&self) -> Result<OrderBook> {
        let mut bids = self.aggregate(&self.bids, PricingSide::Bid)?;
        bids.reverse();
        Ok(OrderBook {
            instrument: self.instrument.clone(),
            bids,
            offers: self.aggregate(&self.offers, PricingSide::Offer)?,
        })
    }

    /// Ascending by price
    fn aggregate(&self, orders: &[Order], side: PricingSide) -> Result<Vec<Order>> {
        let mut levels: BTreeMap<Decimal, i64> = BTreeMap::new();
        for order in orders {
            let level = levels.entry(order.price).or_insert(0);
            *level = level.checked_add(order.quantity).ok_or_else(|| {
                let id = &self.instrument.id;
                Error::QuantityOverflow(format!("{id} {side} level {}", order.price))
            })?;
        }
        Ok(levels.into_iter().map(|(price, quantity)| Order::new(price, quantity, side)).collect())
    }

    pub fn spread(&self) -> Result<Decimal> {
        Ok(self.best_bid_offer()?.spread())
    }

    fn empty_side(&self, side: &'static str) -> Error {
        Error::EmptyBook { instrument: self.instrument.id.to_string(), side }
    }
}

impl Keyed for OrderBook {
    type Key = InstrumentId;
    fn key(&self) -> InstrumentId {
        self.instrument.id.clone()
    }
}

fn best(orders: &[Order], better: impl Fn(Decimal, Decimal) -> bool) -> Option<&Order> {
    let mut iter = orders.iter();
    let first = iter.next()?;
    Some(iter.fold(first, |current, o| if better(o.price, current.price) { o } else { current }))
}

/// Latest order book snapshot per instrument
pub struct MarketDataService {
    store: EventStore<OrderBook>,
    book_depth: usize,
}

impl MarketDataService {
    pub fn new(book_depth: usize) -> Self {
        Self { store: EventStore::new("market_data"), book_depth }
    }

    /// Levels per side in each incoming snapshot
    pub fn book_depth(&self) -> usize {
        self.book_depth
    }

    pub fn ingest(&self, book: OrderBook) -> Result<()> {
        tracing::debug!(
            instrument = %book.instrument.id,
            bids = book.bids.len(),
            offers = book.offers.len(),
            "order book"
        );
        self.store.update(book)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<OrderBook>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<OrderBook> {
        self.store.get(id)
    }

    pub fn best_bid_offer(&self, id: &InstrumentId) -> Result<BidOffer> {
        self.stored(id)?.best_bid_offer()
    }

    /// Collapse the stored book to one order per price and return a copy.
    /// The stored book is replaced without notifying listeners.
    pub fn aggregate_depth(&self, id: &InstrumentId) -> Result<OrderBook> {
        let aggregated = self.stored(id)?.aggregated()?;
        self.store.put(aggregated.clone());
        Ok(aggregated)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn stored(&self, id: &InstrumentId) -> Result<OrderBook> {
        self.store.get(id).ok_or_else(|| Error::UnknownInstrument(id.to_string()))
    }
}
