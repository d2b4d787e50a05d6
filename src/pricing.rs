//! Pricing - latest internal mid/spread per instrument

use std::sync::Arc;

use crate::core::{InstrumentId, Listener, PriceQuote, Result};
use crate::store::EventStore;

pub struct PricingService {
    store: EventStore<PriceQuote>,
}

impl PricingService {
    pub fn new() -> Self {
        Self { store: EventStore::new("pricing") }
    }

    pub fn ingest(&self, quote: PriceQuote) -> Result<()> {
        tracing::debug!(
            instrument = %quote.instrument.id,
            mid = %quote.mid,
            spread = %quote.spread,
            "price"
        );
        self.store.update(quote)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<PriceQuote>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<PriceQuote> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for PricingService {
    fn default() -> Self {
        Self::new()
    }
}
