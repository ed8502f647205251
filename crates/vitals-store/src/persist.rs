//! Snapshot/restore persistence for the metric store.
//!
//! A snapshot is the full store serialized as a JSON array of wire
//! payloads (stable field names: id/type/value/delta). Writes go to a
//! temporary file in the same directory followed by an atomic rename, so a
//! reader never observes a partially written snapshot. Restore replays
//! each record through the live upsert path, which keeps restore and live
//! ingestion on identical merge semantics and validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::StoreResult;
use crate::store::MetricStore;
use crate::types::{MetricPayload, MetricRecord};

/// When snapshots are taken. Exactly one policy is active per
/// configuration; write-through and the periodic task never run together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityPolicy {
    /// Every successful upsert snapshots before the call returns; a
    /// snapshot failure is surfaced to that caller.
    WriteThrough,
    /// A background task snapshots on a fixed interval; failures are
    /// logged and retried on the next tick.
    Periodic(Duration),
}

impl DurabilityPolicy {
    /// An interval of zero seconds selects write-through.
    pub fn from_interval_secs(secs: u64) -> Self {
        if secs == 0 {
            DurabilityPolicy::WriteThrough
        } else {
            DurabilityPolicy::Periodic(Duration::from_secs(secs))
        }
    }
}

/// Writes and reloads store snapshots at a configured path.
#[derive(Clone)]
pub struct Persistence {
    store: MetricStore,
    path: PathBuf,
    /// Serializes the write-and-rename pair. Snapshots share one temp
    /// path; two running at once could publish a half-written file.
    write_lock: Arc<Mutex<()>>,
}

impl Persistence {
    pub fn new(store: MetricStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the full store contents to the snapshot file.
    ///
    /// The store lock is held only for the `list()` copy; serialization
    /// and I/O happen after it is released.
    pub fn snapshot(&self) -> StoreResult<()> {
        let payloads: Vec<MetricPayload> =
            self.store.list().iter().map(MetricPayload::from).collect();
        let data = serde_json::to_vec_pretty(&payloads)?;

        // Same directory as the destination, so the rename stays atomic.
        // Concurrent snapshots (write-through under load) must not
        // interleave on the shared temp file.
        let tmp = self.path.with_extension("tmp");
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, &self.path)?;

        debug!(path = ?self.path, records = payloads.len(), "snapshot written");
        Ok(())
    }

    /// Reload the snapshot file into the store, replaying every record
    /// through `upsert`. A missing file is a fresh start, not an error.
    /// Returns the number of records replayed.
    pub fn restore(&self) -> StoreResult<usize> {
        if !self.path.exists() {
            info!(path = ?self.path, "snapshot file does not exist, starting fresh");
            return Ok(0);
        }

        let data = fs::read(&self.path)?;
        let payloads: Vec<MetricPayload> = serde_json::from_slice(&data)?;
        let mut replayed = 0;
        for payload in payloads {
            let record = MetricRecord::try_from(payload)?;
            self.store.upsert(record)?;
            replayed += 1;
        }

        info!(path = ?self.path, records = replayed, "store restored from snapshot");
        Ok(replayed)
    }

    /// Periodic snapshot loop. Runs until the shutdown channel flips, then
    /// takes one final snapshot so the durability gap is bounded by at
    /// most one in-flight write rather than the full interval.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            path = ?self.path,
            "periodic snapshot task started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.snapshot() {
                        error!(error = %e, "periodic snapshot failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("snapshot task shutting down");
                    if let Err(e) = self.snapshot() {
                        error!(error = %e, "final snapshot failed");
                    }
                    break;
                }
            }
        }
    }
}
