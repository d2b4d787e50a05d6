//! Streaming publisher - records and republishes two-way quotes

use std::sync::Arc;

use crate::core::{InstrumentId, Listener, Result, TwoWayQuote};
use crate::store::EventStore;

pub struct StreamingService {
    store: EventStore<TwoWayQuote>,
}

impl StreamingService {
    pub fn new() -> Self {
        Self { store: EventStore::new("streaming") }
    }

    /// Publish a two-way quote to downstream listeners.
    pub fn publish(&self, quote: TwoWayQuote) -> Result<()> {
        self.store.update(quote)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<TwoWayQuote>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<TwoWayQuote> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for StreamingService {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener<TwoWayQuote> for StreamingService {
    fn on_add(&self, quote: &TwoWayQuote) -> Result<()> {
        self.publish(quote.clone())
    }

    fn name(&self) -> &str {
        "streaming"
    }
}
