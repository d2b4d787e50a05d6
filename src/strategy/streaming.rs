//! Algo streaming - two-way quotes around the internal mid

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::core::{InstrumentId, Listener, PriceQuote, PricingSide, Result, StreamLeg, TwoWayQuote};
use crate::store::EventStore;

pub struct AlgoStreamingService {
    store: EventStore<TwoWayQuote>,
    base_size: i64,
    /// Quotes published so far
    count: Mutex<u64>,
}

impl AlgoStreamingService {
    pub fn new(base_size: i64) -> Self {
        Self { store: EventStore::new("algo_streaming"), base_size, count: Mutex::new(0) }
    }

    /// Quote `mid ± spread/2`, alternating visible size between one and two
    /// base units; hidden size is always twice the visible size.
    pub fn on_price(&self, price: &PriceQuote) -> Result<TwoWayQuote> {
        let visible = {
            let mut count = self.count.lock();
            let units = (*count % 2 + 1) as i64;
            *count += 1;
            units * self.base_size
        };
        let hidden = 2 * visible;
        let half = price.spread / Decimal::TWO;

        let leg = |px, side| StreamLeg {
            price: px,
            visible_quantity: visible,
            hidden_quantity: hidden,
            side,
        };
        let quote = TwoWayQuote {
            instrument: price.instrument.clone(),
            bid: leg(price.mid - half, PricingSide::Bid),
            offer: leg(price.mid + half, PricingSide::Offer),
        };

        tracing::debug!(instrument = %quote.instrument.id, visible, hidden, "stream quote");
        self.store.update(quote.clone())?;
        Ok(quote)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<TwoWayQuote>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<TwoWayQuote> {
        self.store.get(id)
    }
}

impl Listener<PriceQuote> for AlgoStreamingService {
    fn on_add(&self, price: &PriceQuote) -> Result<()> {
        self.on_price(price).map(|_| ())
    }

    fn name(&self) -> &str {
        "algo_streaming"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Bond;

    #[test]
    fn test_sizes_alternate() {
        let algo = AlgoStreamingService::new(1_000_000);
        let bond = Bond { id: InstrumentId::new("912828X21"), ..Bond::default() };
        let price = PriceQuote::new(bond, Decimal::from(100), Decimal::new(78125, 7));

        let sizes: Vec<_> = (0..3)
            .map(|_| algo.on_price(&price).unwrap())
            .map(|q| (q.bid.visible_quantity, q.bid.hidden_quantity, q.offer.visible_quantity))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (1_000_000, 2_000_000, 1_000_000),
                (2_000_000, 4_000_000, 2_000_000),
                (1_000_000, 2_000_000, 1_000_000),
            ]
        );
    }

    #[test]
    fn test_legs_straddle_mid() {
        let algo = AlgoStreamingService::new(1_000_000);
        let price = PriceQuote::new(Bond::default(), Decimal::from(100), Decimal::new(78125, 7));
        let quote = algo.on_price(&price).unwrap();

        assert_eq!(quote.bid.price, Decimal::new(999_960_9375, 8));
        assert_eq!(quote.offer.price, Decimal::new(1_000_039_0625, 8));
        assert_eq!(quote.bid.side, PricingSide::Bid);
        assert_eq!(quote.offer.side, PricingSide::Offer);
    }
}
