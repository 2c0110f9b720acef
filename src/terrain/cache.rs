//! Time-bounded cache of ground results keyed by block column

use super::GroundResult;
use crate::core::types::Tick;
use ahash::AHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct CachedGround {
    result: GroundResult,
    stored_at: Tick,
}

/// Ground results with tick expiry and oldest-first eviction at capacity
///
/// A miss only costs a fresh search, so the cache never needs to be exact.
#[derive(Debug)]
pub struct GroundCache {
    entries: AHashMap<(i32, i32), CachedGround>,
    /// Insertion order; stale entries are skipped on eviction
    order: VecDeque<((i32, i32), Tick)>,
    ttl: u64,
    capacity: usize,
}

impl GroundCache {
    pub fn new(ttl: u64, capacity: usize) -> Self {
        Self {
            entries: AHashMap::new(),
            order: VecDeque::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&mut self, column: (i32, i32), now: Tick) -> Option<GroundResult> {
        let cached = *self.entries.get(&column)?;
        if now.saturating_sub(cached.stored_at) >= self.ttl {
            self.entries.remove(&column);
            return None;
        }
        Some(cached.result)
    }

    pub fn insert(&mut self, column: (i32, i32), result: GroundResult, now: Tick) {
        if !self.entries.contains_key(&column) {
            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(column, CachedGround { result, stored_at: now });
        self.order.push_back((column, now));
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some((column, stored_at)) = self.order.pop_front() {
            let live = self
                .entries
                .get(&column)
                .is_some_and(|cached| cached.stored_at == stored_at);
            if live {
                self.entries.remove(&column);
                return true;
            }
        }
        false
    }

    pub fn remove(&mut self, column: (i32, i32)) -> Option<GroundResult> {
        self.entries.remove(&column).map(|cached| cached.result)
    }

    /// Drop every expired entry
    pub fn purge_expired(&mut self, now: Tick) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, cached| now.saturating_sub(cached.stored_at) < ttl);
        let entries = &self.entries;
        self.order.retain(|(column, stored_at)| {
            entries
                .get(column)
                .is_some_and(|cached| cached.stored_at == *stored_at)
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
