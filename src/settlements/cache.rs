//! Persisted, deduplicated settlement registry
//!
//! Discoveries closer than the clustering radius to a known record are
//! folded into that record. Every mutation marks the cache dirty and
//! immediately rewrites the full record list to the key-value store; a failed
//! write is logged and the in-memory set stays authoritative.

use super::grid::SettlementGrid;
use super::record::{DiscoveryMethod, SettlementRecord};
use super::store::{KeyValueStore, SETTLEMENTS_KEY};
use crate::core::config::RaidConfig;
use crate::core::error::RaidError;
use crate::core::types::{horizontal_distance, BlockPos, ParticipantId, SettlementKey, Tick};
use ahash::AHashMap;

/// What happened to a discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new record was stored under this key
    Added(SettlementKey),
    /// An existing record within the clustering radius absorbed it
    Known(SettlementKey),
}

impl AddOutcome {
    pub fn added(&self) -> bool {
        matches!(self, AddOutcome::Added(_))
    }

    pub fn key(&self) -> &SettlementKey {
        match self {
            AddOutcome::Added(key) | AddOutcome::Known(key) => key,
        }
    }
}

pub struct SettlementCache {
    records: AHashMap<SettlementKey, SettlementRecord>,
    grid: SettlementGrid,
    store: Box<dyn KeyValueStore>,
    clustering_radius: f64,
    max_size: usize,
    dirty: bool,
    evicted: Vec<SettlementKey>,
}

impl SettlementCache {
    /// Empty cache writing to `store`, ignoring anything already stored
    pub fn new(store: Box<dyn KeyValueStore>, config: &RaidConfig) -> Self {
        Self {
            records: AHashMap::new(),
            grid: SettlementGrid::new(config.clustering_radius),
            store,
            clustering_radius: config.clustering_radius,
            max_size: config.max_settlements.max(1),
            dirty: false,
            evicted: Vec::new(),
        }
    }

    /// Cache populated from the record list in `store`
    ///
    /// A missing or unreadable list starts an empty cache.
    pub fn load(store: Box<dyn KeyValueStore>, config: &RaidConfig) -> Self {
        let mut cache = Self::new(store, config);

        let stored = match cache.store.read(SETTLEMENTS_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Could not read settlement list, starting empty: {}", e);
                None
            }
        };
        let Some(json) = stored else {
            return cache;
        };

        match serde_json::from_str::<Vec<SettlementRecord>>(&json) {
            Ok(records) => {
                for record in records {
                    cache.records.insert(record.key.clone(), record);
                }
                cache.rebuild_grid();
                tracing::info!("Loaded {} settlements", cache.records.len());
            }
            Err(e) => {
                tracing::warn!("Stored settlement list is corrupt, starting empty: {}", e);
            }
        }
        cache
    }

    fn rebuild_grid(&mut self) {
        self.grid.rebuild(
            self.records
                .values()
                .map(|r| (r.key.clone(), r.location)),
        );
    }

    /// Register a discovery unless a record within the clustering radius exists
    pub fn add_settlement(
        &mut self,
        location: BlockPos,
        method: DiscoveryMethod,
        now: Tick,
    ) -> AddOutcome {
        if let Some(existing) = self.nearest_known(location) {
            return AddOutcome::Known(existing.clone());
        }

        if self.records.len() >= self.max_size {
            self.evict_oldest();
        }

        let record = SettlementRecord::new(location, now, method);
        let key = record.key.clone();
        self.grid.insert(key.clone(), location);
        self.records.insert(key.clone(), record);
        tracing::info!("Discovered settlement {} via {:?}", key, method);

        self.mark_dirty();
        AddOutcome::Added(key)
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .records
            .values()
            .min_by(|a, b| {
                a.discovered_at
                    .cmp(&b.discovered_at)
                    .then_with(|| a.key.cmp(&b.key))
            })
            .map(|r| r.key.clone());

        if let Some(key) = oldest {
            if let Some(record) = self.records.remove(&key) {
                self.grid.remove(&key, record.location);
                tracing::info!("Evicted settlement {} (capacity {})", key, self.max_size);
                self.evicted.push(key);
            }
        }
    }

    /// Keys evicted since the last call, oldest first
    pub fn take_evicted(&mut self) -> Vec<SettlementKey> {
        std::mem::take(&mut self.evicted)
    }

    /// Whether a record lies within the clustering radius of `location`
    pub fn has_discovered(&self, location: BlockPos) -> bool {
        self.nearest_known(location).is_some()
    }

    /// Key of the closest record within the clustering radius
    pub fn nearest_known(&self, location: BlockPos) -> Option<&SettlementKey> {
        self.grid
            .nearest_within(location, self.clustering_radius)
            .map(|(key, _)| key)
    }

    /// Count a conquest and remember who made it
    ///
    /// Returns false for unknown keys.
    pub fn record_conquest(&mut self, key: &SettlementKey, participant: ParticipantId) -> bool {
        let Some(record) = self.records.get_mut(key) else {
            return false;
        };
        record.conquest_count += 1;
        record.last_conquered_by = Some(participant);
        self.mark_dirty();
        true
    }

    pub fn get(&self, key: &SettlementKey) -> Option<&SettlementRecord> {
        self.records.get(key)
    }

    /// Every record, oldest first
    pub fn all_settlements(&self) -> Vec<SettlementRecord> {
        let mut all: Vec<SettlementRecord> = self.records.values().cloned().collect();
        all.sort_by(|a, b| {
            a.discovered_at
                .cmp(&b.discovered_at)
                .then_with(|| a.key.cmp(&b.key))
        });
        all
    }

    /// Records within `radius` of `center`, horizontally
    pub fn within(&self, center: BlockPos, radius: f64) -> Vec<&SettlementRecord> {
        if radius <= self.clustering_radius {
            self.grid
                .query_neighbors(center)
                .filter(|(_, at)| horizontal_distance(center, *at) <= radius)
                .filter_map(|(key, _)| self.records.get(key))
                .collect()
        } else {
            self.records
                .values()
                .filter(|r| horizontal_distance(center, r.location) <= radius)
                .collect()
        }
    }

    /// Number of settlements whose last conqueror is `participant`
    pub fn conquests_by(&self, participant: ParticipantId) -> usize {
        self.records
            .values()
            .filter(|r| r.was_last_conquered_by(participant))
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.persist();
    }

    /// Write the full record list; returns false (and stays dirty) on failure
    pub fn persist(&mut self) -> bool {
        if !self.dirty {
            return true;
        }

        let written = serde_json::to_string(&self.all_settlements())
            .map_err(RaidError::from)
            .and_then(|json| self.store.write(SETTLEMENTS_KEY, &json));

        match written {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to persist {} settlements, keeping in memory: {}",
                    self.records.len(),
                    e
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for SettlementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementCache")
            .field("records", &self.records.len())
            .field("clustering_radius", &self.clustering_radius)
            .field("max_size", &self.max_size)
            .field("dirty", &self.dirty)
            .finish()
    }
}
