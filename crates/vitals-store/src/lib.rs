//! vitals-store — the metric store at the heart of the vitals server.
//!
//! Accepts gauge and counter observations in two wire encodings, applies
//! kind-specific merge semantics (gauges overwrite, counters accumulate),
//! keeps the mapping consistent under concurrent access, and snapshots it
//! to a file so the store survives restarts.
//!
//! # Architecture
//!
//! ```text
//! UpdateDispatch
//!   ├── apply_positional()  ← (kind, id, rawValue) triples
//!   ├── apply_structured()  ← MetricPayload JSON bodies
//!   └── MetricStore::upsert() → [Persistence::snapshot() if write-through]
//!
//! QueryService
//!   ├── get_one() / get_record() ← single reads, kind-checked
//!   ├── get_all()                ← sorted listing
//!   └── batch_get()              ← lenient multi-read
//!
//! Persistence
//!   ├── snapshot() → atomic write of the full store
//!   ├── restore()  → replay a snapshot through upsert at startup
//!   └── run()      → periodic snapshot loop
//! ```

pub mod dispatch;
pub mod error;
pub mod persist;
pub mod query;
pub mod store;
pub mod types;

pub use dispatch::UpdateDispatch;
pub use error::{StoreError, StoreResult};
pub use persist::{DurabilityPolicy, Persistence};
pub use query::QueryService;
pub use store::MetricStore;
pub use types::{BatchEntry, MetricKind, MetricPayload, MetricQuery, MetricRecord, MetricValue};
