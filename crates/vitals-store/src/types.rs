//! Domain types for the vitals metric store.
//!
//! `MetricRecord` is the internal representation: the kind and its payload
//! live in one tagged union, so a gauge can never carry a delta and a
//! counter can never carry a float. `MetricPayload` is the wire shape — the
//! JSON object with optional `value`/`delta` fields that producers send and
//! the snapshot file stores — and converting it into a record is where
//! structured-body validation happens.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The two supported metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Point-in-time metric; a new observation replaces the previous value.
    Gauge,
    /// Accumulating metric; a new observation's delta is added to the total.
    Counter,
}

impl MetricKind {
    /// Parse a wire kind string, case-insensitively. `None` for anything
    /// other than `gauge` or `counter`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("gauge") {
            Some(MetricKind::Gauge)
        } else if s.eq_ignore_ascii_case("counter") {
            Some(MetricKind::Counter)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric observation's payload. The variant is the kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Gauge(f64),
    Counter(i64),
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Counter(_) => MetricKind::Counter,
        }
    }

    /// Render for plain-text responses: gauges as the minimal decimal
    /// representation (`1.5`, `2`, no forced trailing zeros), counters as
    /// a plain integer.
    pub fn format(&self) -> String {
        match self {
            MetricValue::Gauge(v) => format!("{v}"),
            MetricValue::Counter(d) => d.to_string(),
        }
    }
}

/// A stored metric: a non-empty id plus its kind-tagged value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub id: String,
    pub value: MetricValue,
}

impl MetricRecord {
    pub fn gauge(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            value: MetricValue::Gauge(value),
        }
    }

    pub fn counter(id: impl Into<String>, delta: i64) -> Self {
        Self {
            id: id.into(),
            value: MetricValue::Counter(delta),
        }
    }

    pub fn kind(&self) -> MetricKind {
        self.value.kind()
    }
}

/// The structured wire encoding of a metric, also used in the snapshot
/// file. Exactly one of `value`/`delta` is populated for a valid payload;
/// the kind stays a raw string so an unrecognized kind surfaces as an
/// `UnknownKind` validation error instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

impl TryFrom<MetricPayload> for MetricRecord {
    type Error = StoreError;

    /// Structured-body validation. Order matters: kind is checked before
    /// the id, the id before the value, and the first failing check
    /// determines the reported error.
    fn try_from(payload: MetricPayload) -> StoreResult<Self> {
        let kind = MetricKind::parse(&payload.kind)
            .ok_or_else(|| StoreError::UnknownKind(payload.kind.clone()))?;
        if payload.id.is_empty() {
            return Err(StoreError::EmptyId);
        }
        let value = match kind {
            MetricKind::Gauge => {
                let value = payload
                    .value
                    .ok_or_else(|| StoreError::MissingValue(payload.id.clone()))?;
                // JSON cannot represent NaN or infinity; a snapshot of such
                // a value would serialize as null and fail to restore.
                if !value.is_finite() {
                    return Err(StoreError::InvalidValue {
                        kind,
                        raw: value.to_string(),
                    });
                }
                MetricValue::Gauge(value)
            }
            MetricKind::Counter => MetricValue::Counter(
                payload
                    .delta
                    .ok_or_else(|| StoreError::MissingDelta(payload.id.clone()))?,
            ),
        };
        Ok(MetricRecord {
            id: payload.id,
            value,
        })
    }
}

impl From<&MetricRecord> for MetricPayload {
    fn from(record: &MetricRecord) -> Self {
        let (value, delta) = match record.value {
            MetricValue::Gauge(v) => (Some(v), None),
            MetricValue::Counter(d) => (None, Some(d)),
        };
        MetricPayload {
            id: record.id.clone(),
            kind: record.kind().as_str().to_string(),
            value,
            delta,
        }
    }
}

impl From<MetricRecord> for MetricPayload {
    fn from(record: MetricRecord) -> Self {
        MetricPayload::from(&record)
    }
}

/// A single batch-read request: which metric, and as which kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A matched batch-read entry with its formatted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub value: String,
}
