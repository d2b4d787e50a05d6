//! Position ledger - net quantity per book for every instrument

use std::sync::Arc;

use crate::core::{Error, InstrumentId, Listener, Position, Result, Trade};
use crate::store::EventStore;

pub struct PositionService {
    store: EventStore<Position>,
}

impl PositionService {
    pub fn new() -> Self {
        Self { store: EventStore::new("position") }
    }

    /// Net a trade into its instrument's position and notify listeners.
    /// Quantities accumulate per book; other books are left untouched.
    pub fn add_trade(&self, trade: &Trade) -> Result<Position> {
        let mut position = self
            .store
            .get(&trade.instrument.id)
            .unwrap_or_else(|| Position::new(trade.instrument.clone()));
        let signed = trade.side.sign().checked_mul(trade.quantity).ok_or_else(|| {
            Error::QuantityOverflow(format!("trade {} quantity", trade.trade_id))
        })?;
        position.add(&trade.book, signed)?;

        tracing::debug!(
            instrument = %position.instrument.id,
            book = %trade.book,
            aggregate = position.aggregate(),
            "position"
        );
        self.store.update(position.clone())?;
        Ok(position)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<Position>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<Position> {
        self.store.get(id)
    }

    /// Flat when the instrument has never traded
    pub fn get_or_default(&self, id: &InstrumentId) -> Position {
        self.store.get_or_default(id)
    }

    pub fn all_positions(&self) -> Vec<Position> {
        self.store.values()
    }
}

impl Default for PositionService {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener<Trade> for PositionService {
    fn on_add(&self, trade: &Trade) -> Result<()> {
        self.add_trade(trade).map(|_| ())
    }

    fn name(&self) -> &str {
        "position"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bond, Side};
    use rust_decimal::Decimal;

    fn trade(id: &str, book: &str, quantity: i64, side: Side) -> Trade {
        Trade {
            instrument: Bond { id: InstrumentId::new("912810FZ8"), ..Bond::default() },
            trade_id: id.to_string(),
            price: Decimal::from(99),
            book: book.to_string(),
            quantity,
            side,
        }
    }

    #[test]
    fn test_netting_across_books() {
        let positions = PositionService::new();
        positions.add_trade(&trade("T1", "B1", 100, Side::Buy)).unwrap();
        positions.add_trade(&trade("T2", "B1", 40, Side::Sell)).unwrap();
        let position = positions.add_trade(&trade("T3", "B2", 10, Side::Buy)).unwrap();

        assert_eq!(position.aggregate(), 70);
        assert_eq!(position.book_quantity("B1"), 60);
        assert_eq!(position.book_quantity("B2"), 10);
        assert_eq!(positions.get(&InstrumentId::new("912810FZ8")), Some(position));
    }

    #[test]
    fn test_overflowing_trade_is_refused() {
        let positions = PositionService::new();
        positions.add_trade(&trade("T1", "TRSY1", i64::MAX, Side::Buy)).unwrap();
        let result = positions.add_trade(&trade("T2", "TRSY1", i64::MAX, Side::Buy));
        assert!(matches!(result, Err(Error::QuantityOverflow(_))));

        let position = positions.get(&InstrumentId::new("912810FZ8")).unwrap();
        assert_eq!(position.book_quantity("TRSY1"), i64::MAX);
        assert_eq!(position.aggregate(), i64::MAX);
    }

    #[test]
    fn test_unknown_instrument_is_flat() {
        let positions = PositionService::new();
        assert_eq!(positions.get_or_default(&InstrumentId::new("912828V23")).aggregate(), 0);
    }
}
