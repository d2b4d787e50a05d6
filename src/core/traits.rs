//! Core traits - Seams between stores, engines and sinks

use crate::core::Result;

/// Receives every value written to a store it is subscribed to.
///
/// Called synchronously from the store's `update`, after the store lock has
/// been released, so implementations may update other stores.
pub trait Listener<V>: Send + Sync {
    fn on_add(&self, value: &V) -> Result<()>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// A record that knows the key it is stored under.
pub trait Keyed {
    type Key;

    fn key(&self) -> Self::Key;
}

/// Ordered display fields consumed by the output sinks.
pub trait DisplayRecord {
    fn display_fields(&self) -> Vec<String>;
}
