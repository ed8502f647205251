//! The concurrency-safe metric mapping.
//!
//! A single mutex guards the whole map. That is deliberate: the expected
//! cardinality is tens to low thousands of ids from one instrumented
//! process, every operation except `list` is an O(1) map access, and the
//! counter merge must read and write the stored delta in one critical
//! section anyway. Nothing awaits while the lock is held.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::types::{MetricRecord, MetricValue};

/// Thread-safe mapping from metric id to its current record.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MetricStore {
    inner: Arc<Mutex<HashMap<String, MetricRecord>>>,
}

impl MetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MetricRecord>> {
        // A poisoned lock means a panic mid-operation; every operation
        // leaves the map in a valid state, so recover the guard.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or merge a record.
    ///
    /// Gauges overwrite the stored value. Counters add the incoming delta
    /// to the stored total; the read of the existing delta and the write
    /// of the merged one happen under the same lock, so concurrent
    /// increments to one id never lose updates. An upsert whose kind
    /// differs from the stored kind replaces the record outright.
    pub fn upsert(&self, record: MetricRecord) -> StoreResult<()> {
        if record.id.is_empty() {
            return Err(StoreError::EmptyId);
        }
        let mut map = self.lock();
        match map.entry(record.id) {
            Entry::Occupied(mut slot) => {
                let merged = match (slot.get().value, record.value) {
                    (MetricValue::Counter(total), MetricValue::Counter(delta)) => {
                        MetricValue::Counter(total.wrapping_add(delta))
                    }
                    (_, incoming) => incoming,
                };
                slot.get_mut().value = merged;
            }
            Entry::Vacant(slot) => {
                let id = slot.key().clone();
                slot.insert(MetricRecord {
                    id,
                    value: record.value,
                });
            }
        }
        Ok(())
    }

    /// Get a record by id. Kind checks belong to the query layer.
    pub fn get(&self, id: &str) -> Option<MetricRecord> {
        self.lock().get(id).cloned()
    }

    /// A consistent point-in-time copy of all records, in no particular
    /// order.
    pub fn list(&self) -> Vec<MetricRecord> {
        self.lock().values().cloned().collect()
    }

    /// Remove a record by id.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Number of distinct metric ids currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
