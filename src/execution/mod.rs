//! Execution layer - routes algo orders to market
//!
//! Orders are recorded per instrument and forwarded unconditionally; there
//! is no cancel/replace and no partial fill handling.

use std::sync::Arc;
use tracing::info;

use crate::core::{ExecutionOrder, InstrumentId, Listener, Result};
use crate::store::EventStore;

pub struct ExecutionService {
    store: EventStore<ExecutionOrder>,
}

impl ExecutionService {
    pub fn new() -> Self {
        Self { store: EventStore::new("execution") }
    }

    /// Send an order to market and notify downstream listeners.
    pub fn execute(&self, order: ExecutionOrder) -> Result<()> {
        info!(
            "Executing order: {} {} {} x {}+{} @ {}",
            order.order_id,
            order.side,
            order.instrument.id,
            order.visible_quantity,
            order.hidden_quantity,
            order.price
        );
        self.store.update(order)
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<ExecutionOrder>>) {
        self.store.subscribe(listener);
    }

    /// Latest order for an instrument
    pub fn get(&self, id: &InstrumentId) -> Option<ExecutionOrder> {
        self.store.get(id)
    }

    /// Latest order of every instrument
    pub fn all_orders(&self) -> Vec<ExecutionOrder> {
        self.store.values()
    }
}

impl Default for ExecutionService {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener<ExecutionOrder> for ExecutionService {
    fn on_add(&self, order: &ExecutionOrder) -> Result<()> {
        self.execute(order.clone())
    }

    fn name(&self) -> &str {
        "execution"
    }
}
