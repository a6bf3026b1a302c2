//! Immutable canonical record sets and the store that publishes them.
//!
//! A [`Snapshot`] never changes after construction. [`SnapshotStore`] swaps
//! whole snapshots behind an `RwLock<Arc<_>>`: a reader clones the `Arc` and
//! keeps a consistent view for as long as it holds it, while a reload builds
//! the replacement completely before taking the write lock.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::{
    error::Result,
    normalize::{NormalizeReport, normalize},
    record::KpiRecord,
    source::{RawTable, RowSource},
};

#[derive(Debug)]
pub struct Snapshot {
    records: Vec<KpiRecord>,
    source_name: String,
    fingerprint: String,
    loaded_at: DateTime<Utc>,
    report: NormalizeReport,
}

impl Snapshot {
    pub fn from_table(table: &RawTable) -> Result<Self> {
        let normalized = normalize(table)?;
        Ok(Self {
            records: normalized.records,
            source_name: table.name.clone(),
            fingerprint: table.fingerprint(),
            loaded_at: Utc::now(),
            report: normalized.report,
        })
    }

    pub fn load(source: &dyn RowSource) -> Result<Self> {
        let table = source.load()?;
        Self::from_table(&table)
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            source_name: String::new(),
            fingerprint: String::new(),
            loaded_at: Utc::now(),
            report: NormalizeReport::default(),
        }
    }

    pub fn records(&self) -> &[KpiRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn report(&self) -> &NormalizeReport {
        &self.report
    }
}

#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Snapshot::empty())
    }
}

impl SnapshotStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The published snapshot. Later replacements do not affect the returned handle.
    pub fn current(&self) -> Arc<Snapshot> {
        // The guarded value is a single Arc, so a poisoned lock still holds a whole snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Publishes `snapshot` and returns the one it replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Loads and publishes a fresh snapshot. On error the current one stays in place.
    pub fn load(&self, source: &dyn RowSource) -> Result<Arc<Snapshot>> {
        let snapshot = Snapshot::load(source)?;
        info!(
            "Loaded {} record(s) from '{}'",
            snapshot.len(),
            snapshot.source_name()
        );
        self.replace(snapshot);
        Ok(self.current())
    }

    /// Publishes a new snapshot only when the source data differs from the
    /// current one. Returns whether a replacement happened.
    pub fn reload_if_changed(&self, source: &dyn RowSource) -> Result<bool> {
        let table = source.load()?;
        let fingerprint = table.fingerprint();
        if self.current().fingerprint() == fingerprint {
            debug!("Source '{}' unchanged; keeping current snapshot", table.name);
            return Ok(false);
        }
        let snapshot = Snapshot::from_table(&table)?;
        info!(
            "Reloaded {} record(s) from '{}'",
            snapshot.len(),
            snapshot.source_name()
        );
        self.replace(snapshot);
        Ok(true)
    }
}
