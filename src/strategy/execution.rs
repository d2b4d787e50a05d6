//! Algo execution - cross the spread when the book is tight enough
//!
//! On every order book snapshot the best bid/offer is computed. When the
//! spread is at or below the threshold a market order is sent, alternating
//! between lifting the offer and hitting the bid.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::core::{
    BidOffer, ExecutionOrder, InstrumentId, Listener, OrderType, PricingSide, Result,
};
use crate::orderbook::OrderBook;
use crate::store::EventStore;

pub const PARENT_ORDER_ID: &str = "PARENT_ORDER_ID";

pub struct AlgoExecutionService {
    store: EventStore<ExecutionOrder>,
    spread_threshold: Decimal,
    /// Orders sent so far
    count: Mutex<u64>,
}

impl AlgoExecutionService {
    pub fn new(spread_threshold: Decimal) -> Self {
        Self {
            store: EventStore::new("algo_execution"),
            spread_threshold,
            count: Mutex::new(0),
        }
    }

    pub fn spread_threshold(&self) -> Decimal {
        self.spread_threshold
    }

    /// Decide on one snapshot; returns the order sent, if any.
    pub fn on_book(&self, book: &OrderBook) -> Result<Option<ExecutionOrder>> {
        let bo = book.best_bid_offer()?;
        let spread = bo.spread();
        if spread > self.spread_threshold {
            tracing::trace!(instrument = %book.instrument.id, %spread, "spread too wide");
            return Ok(None);
        }

        let order = {
            let mut count = self.count.lock();
            let side = if *count % 2 == 0 { PricingSide::Offer } else { PricingSide::Bid };
            *count += 1;
            build_order(book, &bo, side, *count)
        };

        tracing::info!(
            instrument = %order.instrument.id,
            order_id = %order.order_id,
            side = %order.side,
            quantity = order.visible_quantity,
            "algo execution"
        );
        self.store.update(order.clone())?;
        Ok(Some(order))
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<ExecutionOrder>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<ExecutionOrder> {
        self.store.get(id)
    }

    pub fn order_count(&self) -> u64 {
        *self.count.lock()
    }
}

fn build_order(book: &OrderBook, bo: &BidOffer, side: PricingSide, count: u64) -> ExecutionOrder {
    let level = match side {
        PricingSide::Offer => &bo.offer,
        PricingSide::Bid => &bo.bid,
    };
    ExecutionOrder {
        instrument: book.instrument.clone(),
        side,
        order_id: format!("AlgoExec{count}"),
        order_type: OrderType::Market,
        price: level.price,
        visible_quantity: level.quantity,
        hidden_quantity: 0,
        parent_order_id: PARENT_ORDER_ID.to_string(),
        is_child: false,
    }
}

impl Listener<OrderBook> for AlgoExecutionService {
    fn on_add(&self, book: &OrderBook) -> Result<()> {
        self.on_book(book).map(|_| ())
    }

    fn name(&self) -> &str {
        "algo_execution"
    }
}
