//! Creation-time cache keyed by workload identity

use chrono::{DateTime, Utc};
use reaper_util::WorkloadId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Cached creation time for one workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: WorkloadId,

    /// Creation time the age is measured from
    pub created_at: DateTime<Utc>,

    /// When the entry was first recorded
    pub observed_at: DateTime<Utc>,
}

/// In-memory age cache.
///
/// Entries are written once and only replaced by [`AgeCache::observe`] when
/// the cluster reports an earlier creation time. Nothing is persisted; a
/// restart starts empty and repopulates from the cluster's timestamps.
#[derive(Debug, Default)]
pub struct AgeCache {
    entries: HashMap<WorkloadId, CacheEntry>,
}

impl AgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &WorkloadId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &WorkloadId) -> bool {
        self.entries.contains_key(id)
    }

    /// Insert an entry if none exists. Returns whether it was inserted.
    pub fn put(
        &mut self,
        id: WorkloadId,
        created_at: DateTime<Utc>,
        observed_at: DateTime<Utc>,
    ) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }

        self.entries.insert(
            id.clone(),
            CacheEntry {
                id,
                created_at,
                observed_at,
            },
        );
        true
    }

    pub fn evict(&mut self, id: &WorkloadId) -> Option<CacheEntry> {
        self.entries.remove(id)
    }

    /// Drop entries not in `current`. Returns the number removed.
    pub fn reconcile(&mut self, current: &HashSet<WorkloadId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| {
            let keep = current.contains(id);
            if !keep {
                debug!(workload = %id, "Pruning vanished workload from age cache");
            }
            keep
        });
        before - self.entries.len()
    }

    /// Record a sighting and return the creation time to measure age from.
    ///
    /// The first reported time wins. A reported time earlier than the cached
    /// one replaces the entry: the identity was recreated or the earlier
    /// sighting was wrong, and the older timestamp is authoritative.
    pub fn observe(
        &mut self,
        id: &WorkloadId,
        reported_created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        match self.entries.get_mut(id) {
            Some(entry) if reported_created_at < entry.created_at => {
                debug!(
                    workload = %id,
                    cached = %entry.created_at,
                    reported = %reported_created_at,
                    "Earlier creation time reported; refreshing cache entry"
                );
                *entry = CacheEntry {
                    id: id.clone(),
                    created_at: reported_created_at,
                    observed_at: now,
                };
                reported_created_at
            }
            Some(entry) => entry.created_at,
            None => {
                debug!(workload = %id, created_at = %reported_created_at, "Caching new workload");
                self.put(id.clone(), reported_created_at, now);
                reported_created_at
            }
        }
    }
}
