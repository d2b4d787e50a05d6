//! Keyed event store - latest value per key with synchronous fan-out
//!
//! Every pipeline stage owns one `EventStore`. An `update` replaces the value
//! under its key and then calls each subscribed listener in registration
//! order. Listeners run after the lock is released, so a listener may update
//! a downstream store and the cascade completes depth-first before the
//! original `update` returns.
//!
//! Re-entering a store from its own fan-out is a cycle and is rejected. The
//! guard is tracked per thread, so updates from other threads are not
//! mistaken for cycles; they only serialize on the data lock.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::core::{Error, Keyed, Listener, Result};

pub struct EventStore<V: Keyed> {
    name: &'static str,
    data: RwLock<BTreeMap<V::Key, V>>,
    listeners: RwLock<Vec<Arc<dyn Listener<V>>>>,
    /// Threads currently inside this store's fan-out
    dispatching: Mutex<Vec<ThreadId>>,
}

/// Removes the thread from the dispatch set when the fan-out ends,
/// including on early return.
struct DispatchGuard<'a> {
    threads: &'a Mutex<Vec<ThreadId>>,
    id: ThreadId,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.threads.lock().retain(|t| *t != self.id);
    }
}

impl<V> EventStore<V>
where
    V: Keyed + Clone,
    V::Key: Ord + Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            data: RwLock::new(BTreeMap::new()),
            listeners: RwLock::new(Vec::new()),
            dispatching: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<V>>) {
        tracing::debug!(store = self.name, listener = listener.name(), "subscribed");
        self.listeners.write().push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Store `value` under its key and notify every listener.
    ///
    /// All listeners run even if one fails; the first error is returned.
    pub fn update(&self, value: V) -> Result<()> {
        let id = thread::current().id();
        {
            let mut threads = self.dispatching.lock();
            if threads.contains(&id) {
                return Err(Error::CyclicPropagation(self.name));
            }
            threads.push(id);
        }
        let _guard = DispatchGuard { threads: &self.dispatching, id };

        self.data.write().insert(value.key(), value.clone());
        let listeners = self.listeners.read().clone();

        let mut first_err = None;
        for listener in &listeners {
            if let Err(e) = listener.on_add(&value) {
                tracing::warn!(
                    store = self.name,
                    listener = listener.name(),
                    "listener failed: {}",
                    e
                );
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Store `value` without notifying.
    pub fn put(&self, value: V) {
        self.data.write().insert(value.key(), value);
    }

    /// Apply `f` to the stored value in place, without notifying.
    /// Returns the updated value, or `None` when the key is absent.
    pub fn modify(&self, key: &V::Key, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut data = self.data.write();
        let value = data.get_mut(key)?;
        f(value);
        Some(value.clone())
    }

    pub fn get(&self, key: &V::Key) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    pub fn get_or_default(&self, key: &V::Key) -> V
    where
        V: Default,
    {
        self.get(key).unwrap_or_default()
    }

    pub fn contains(&self, key: &V::Key) -> bool {
        self.data.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn keys(&self) -> Vec<V::Key> {
        self.data.read().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }
}
