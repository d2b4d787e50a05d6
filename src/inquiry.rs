//! Customer inquiry lifecycle
//!
//! RECEIVED inquiries are stored and published back as QUOTED; a QUOTED
//! inquiry is completed to DONE and announced to listeners. Inquiries
//! arriving in any other state are ignored.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::core::{Error, Inquiry, InquiryState, Listener, Result};
use crate::store::EventStore;

pub struct InquiryService {
    store: EventStore<Inquiry>,
}

impl InquiryService {
    pub fn new() -> Self {
        Self { store: EventStore::new("inquiry") }
    }

    pub fn ingest(&self, inquiry: Inquiry) -> Result<()> {
        match inquiry.state {
            InquiryState::Received => {
                self.store.put(inquiry.clone());
                self.publish(inquiry)
            }
            InquiryState::Quoted => {
                let done = Inquiry { state: InquiryState::Done, ..inquiry };
                tracing::debug!(inquiry_id = %done.inquiry_id, "inquiry done");
                self.store.update(done)
            }
            state => {
                tracing::debug!(inquiry_id = %inquiry.inquiry_id, %state, "ignoring inquiry");
                Ok(())
            }
        }
    }

    /// Quote a RECEIVED inquiry back to the customer and feed the QUOTED
    /// inquiry back through `ingest`. No-op for any other state.
    pub fn publish(&self, inquiry: Inquiry) -> Result<()> {
        if inquiry.state != InquiryState::Received {
            return Ok(());
        }
        tracing::debug!(inquiry_id = %inquiry.inquiry_id, "inquiry quoted");
        self.ingest(Inquiry { state: InquiryState::Quoted, ..inquiry })
    }

    /// Set the quoted price and notify listeners. The state is left as is.
    pub fn send_quote(&self, inquiry_id: &str, price: Decimal) -> Result<()> {
        let mut inquiry = self.stored(inquiry_id)?;
        inquiry.price = price;
        self.store.update(inquiry)
    }

    /// Mark an inquiry REJECTED without notifying listeners.
    pub fn reject(&self, inquiry_id: &str) -> Result<()> {
        self.store
            .modify(&inquiry_id.to_string(), |inquiry| inquiry.state = InquiryState::Rejected)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownInquiry(inquiry_id.to_string()))
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<Inquiry>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, inquiry_id: &str) -> Option<Inquiry> {
        self.store.get(&inquiry_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn stored(&self, inquiry_id: &str) -> Result<Inquiry> {
        self.get(inquiry_id).ok_or_else(|| Error::UnknownInquiry(inquiry_id.to_string()))
    }
}

impl Default for InquiryService {
    fn default() -> Self {
        Self::new()
    }
}
