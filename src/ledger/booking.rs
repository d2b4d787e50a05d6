//! Trade booking - executions become trades on round-robin books

use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::{Error, ExecutionOrder, Listener, PricingSide, Result, Side, Trade};
use crate::store::EventStore;

pub struct TradeBookingService {
    store: EventStore<Trade>,
    books: Vec<String>,
    /// Executions booked so far
    booked: Mutex<u64>,
}

impl TradeBookingService {
    pub fn new(books: Vec<String>) -> Result<Self> {
        if books.is_empty() {
            return Err(Error::Config("trade booking needs at least one book".into()));
        }
        Ok(Self { store: EventStore::new("trade_booking"), books, booked: Mutex::new(0) })
    }

    /// Book a trade and notify listeners.
    pub fn book_trade(&self, trade: Trade) -> Result<()> {
        tracing::debug!(
            trade_id = %trade.trade_id,
            instrument = %trade.instrument.id,
            book = %trade.book,
            side = %trade.side,
            quantity = trade.quantity,
            "booking trade"
        );
        self.store.update(trade)
    }

    /// Turn an execution into a trade. Hitting the bid sells, lifting the
    /// offer buys. The count is bumped before the book is chosen, so the
    /// first execution lands on the second book.
    pub fn on_execution(&self, order: &ExecutionOrder) -> Result<Trade> {
        let quantity = order.total_quantity()?;
        let book = {
            let mut booked = self.booked.lock();
            *booked += 1;
            self.books[(*booked % self.books.len() as u64) as usize].clone()
        };
        let side = match order.side {
            PricingSide::Bid => Side::Sell,
            PricingSide::Offer => Side::Buy,
        };
        let trade = Trade {
            instrument: order.instrument.clone(),
            trade_id: order.order_id.clone(),
            price: order.price,
            book,
            quantity,
            side,
        };
        self.book_trade(trade.clone())?;
        Ok(trade)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<Trade>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, trade_id: &str) -> Option<Trade> {
        self.store.get(&trade_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Listener<ExecutionOrder> for TradeBookingService {
    fn on_add(&self, order: &ExecutionOrder) -> Result<()> {
        self.on_execution(order).map(|_| ())
    }

    fn name(&self) -> &str {
        "trade_booking"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bond, InstrumentId, OrderType};
    use rust_decimal::Decimal;

    struct Count(Mutex<Vec<String>>);

    impl Listener<Trade> for Count {
        fn on_add(&self, trade: &Trade) -> Result<()> {
            self.0.lock().push(trade.trade_id.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "count"
        }
    }

    fn execution(id: &str, side: PricingSide) -> ExecutionOrder {
        ExecutionOrder {
            instrument: Bond { id: InstrumentId::new("912828Y20"), ..Bond::default() },
            side,
            order_id: id.to_string(),
            order_type: OrderType::Market,
            price: Decimal::from(100),
            visible_quantity: 3_000_000,
            hidden_quantity: 1_000_000,
            parent_order_id: "PARENT_ORDER_ID".into(),
            is_child: false,
        }
    }

    fn books() -> Vec<String> {
        vec!["TRSY1".into(), "TRSY2".into(), "TRSY3".into()]
    }

    #[test]
    fn test_round_robin_books() {
        let booking = TradeBookingService::new(books()).unwrap();
        let assigned: Vec<_> = (1..=4)
            .map(|i| execution(&format!("AlgoExec{i}"), PricingSide::Offer))
            .map(|order| booking.on_execution(&order).unwrap())
            .map(|t| t.book)
            .collect();
        assert_eq!(assigned, vec!["TRSY2", "TRSY3", "TRSY1", "TRSY2"]);
    }

    #[test]
    fn test_side_mapping_and_quantity() {
        let booking = TradeBookingService::new(books()).unwrap();
        let sell = booking.on_execution(&execution("AlgoExec1", PricingSide::Bid)).unwrap();
        let buy = booking.on_execution(&execution("AlgoExec2", PricingSide::Offer)).unwrap();

        assert_eq!(sell.side, Side::Sell);
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(sell.quantity, 4_000_000);
        assert_eq!(sell.trade_id, "AlgoExec1");
        assert_eq!(booking.get("AlgoExec2"), Some(buy));
    }

    #[test]
    fn test_single_notification_per_trade() {
        let booking = TradeBookingService::new(books()).unwrap();
        let seen = Arc::new(Count(Mutex::new(Vec::new())));
        booking.subscribe(seen.clone());

        booking.on_execution(&execution("AlgoExec1", PricingSide::Bid)).unwrap();
        assert_eq!(*seen.0.lock(), vec!["AlgoExec1"]);
    }

    #[test]
    fn test_overflowing_order_keeps_rotation() {
        let booking = TradeBookingService::new(books()).unwrap();
        let mut huge = execution("AlgoExec1", PricingSide::Offer);
        huge.visible_quantity = i64::MAX;
        assert!(matches!(booking.on_execution(&huge), Err(Error::QuantityOverflow(_))));
        assert_eq!(booking.len(), 0);

        let trade = booking.on_execution(&execution("AlgoExec2", PricingSide::Offer)).unwrap();
        assert_eq!(trade.book, "TRSY2");
    }

    #[test]
    fn test_empty_books_rejected() {
        assert!(matches!(TradeBookingService::new(vec![]), Err(Error::Config(_))));
    }
}
