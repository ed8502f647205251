//! Update dispatch: decodes both wire encodings into a [`MetricRecord`]
//! and applies it to the store, honoring the write-through durability
//! policy.
//!
//! Validation order is the same on both paths: kind recognized, then id
//! non-empty, then value present and parsable. The first failing check
//! determines the reported error.

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::persist::{DurabilityPolicy, Persistence};
use crate::store::MetricStore;
use crate::types::{MetricKind, MetricPayload, MetricRecord, MetricValue};

/// Decode the positional encoding: `(kind, id, rawValue)`. The raw value
/// parses as i64 for counters and f64 for gauges; a parse failure is
/// reported distinctly from an unknown kind.
pub fn decode_positional(kind: &str, id: &str, raw: &str) -> StoreResult<MetricRecord> {
    let kind = MetricKind::parse(kind).ok_or_else(|| StoreError::UnknownKind(kind.to_string()))?;
    if id.is_empty() {
        return Err(StoreError::EmptyId);
    }
    let invalid = || StoreError::InvalidValue {
        kind,
        raw: raw.to_string(),
    };
    let value = match kind {
        MetricKind::Gauge => {
            let parsed: f64 = raw.parse().map_err(|_| invalid())?;
            // f64::from_str accepts "NaN" and "inf", but JSON cannot carry
            // them; a store holding one could never be restored.
            if !parsed.is_finite() {
                return Err(invalid());
            }
            MetricValue::Gauge(parsed)
        }
        MetricKind::Counter => MetricValue::Counter(raw.parse().map_err(|_| invalid())?),
    };
    Ok(MetricRecord {
        id: id.to_string(),
        value,
    })
}

/// Applies decoded observations to the store. Under the write-through
/// policy every successful upsert snapshots before returning, and a
/// snapshot failure is reported as a persistence failure of that update.
#[derive(Clone)]
pub struct UpdateDispatch {
    store: MetricStore,
    persistence: Persistence,
    policy: DurabilityPolicy,
}

impl UpdateDispatch {
    pub fn new(store: MetricStore, persistence: Persistence, policy: DurabilityPolicy) -> Self {
        Self {
            store,
            persistence,
            policy,
        }
    }

    /// Ingest a `(kind, id, rawValue)` triple.
    pub fn apply_positional(&self, kind: &str, id: &str, raw: &str) -> StoreResult<()> {
        let record = decode_positional(kind, id, raw)?;
        self.apply(record)
    }

    /// Ingest a structured wire payload.
    pub fn apply_structured(&self, payload: MetricPayload) -> StoreResult<()> {
        let record = MetricRecord::try_from(payload)?;
        self.apply(record)
    }

    fn apply(&self, record: MetricRecord) -> StoreResult<()> {
        debug!(id = %record.id, kind = %record.kind(), "metric upsert");
        self.store.upsert(record)?;
        if self.policy == DurabilityPolicy::WriteThrough {
            self.persistence.snapshot()?;
        }
        Ok(())
    }
}
