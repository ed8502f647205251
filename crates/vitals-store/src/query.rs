//! Read-side operations over the metric store.
//!
//! Built purely on store reads; adds kind checking, formatting, and
//! selection, never mutation. A kind mismatch is reported as not-found —
//! callers cannot distinguish "no such id" from "id exists under the other
//! kind".

use crate::error::{StoreError, StoreResult};
use crate::store::MetricStore;
use crate::types::{BatchEntry, MetricKind, MetricQuery, MetricRecord};

/// Read-only view over a [`MetricStore`].
#[derive(Clone)]
pub struct QueryService {
    store: MetricStore,
}

impl QueryService {
    pub fn new(store: MetricStore) -> Self {
        Self { store }
    }

    /// Single read, kind-checked, returning the record.
    pub fn get_record(&self, id: &str, kind: MetricKind) -> StoreResult<MetricRecord> {
        match self.store.get(id) {
            Some(record) if record.kind() == kind => Ok(record),
            _ => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// Single read, kind-checked, returning the formatted value.
    pub fn get_one(&self, id: &str, kind: MetricKind) -> StoreResult<String> {
        self.get_record(id, kind).map(|r| r.value.format())
    }

    /// All metrics as `(id, kind, formatted value)`, sorted ascending by
    /// id for deterministic presentation.
    pub fn get_all(&self) -> Vec<(String, MetricKind, String)> {
        let mut rows: Vec<_> = self
            .store
            .list()
            .into_iter()
            .map(|r| (r.id.clone(), r.kind(), r.value.format()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Lenient batch read: requests whose id is absent, whose stored kind
    /// differs, or whose requested kind is unrecognized are silently
    /// omitted from the result.
    pub fn batch_get(&self, requests: &[MetricQuery]) -> Vec<BatchEntry> {
        self.batch_get_detailed(requests).0
    }

    /// Batch read that also reports the misses, for callers that want
    /// partial-failure detail.
    pub fn batch_get_detailed(
        &self,
        requests: &[MetricQuery],
    ) -> (Vec<BatchEntry>, Vec<MetricQuery>) {
        let mut matched = Vec::new();
        let mut missed = Vec::new();
        for request in requests {
            let hit = MetricKind::parse(&request.kind)
                .and_then(|kind| self.get_record(&request.id, kind).ok());
            match hit {
                Some(record) => matched.push(BatchEntry {
                    id: record.id,
                    kind: record.value.kind(),
                    value: record.value.format(),
                }),
                None => missed.push(request.clone()),
            }
        }
        (matched, missed)
    }
}
