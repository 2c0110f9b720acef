//! Terrain search: finding somewhere to stand
//!
//! [`TerrainSearch`] wraps the column search with a ground cache. A `None`
//! result always means "region not resident" and is never cached.

pub mod cache;
pub mod platform;
pub mod search;

use crate::core::config::RaidConfig;
use crate::core::types::Tick;
use crate::world::WorldAccess;
use serde::{Deserialize, Serialize};

pub use cache::GroundCache;
pub use platform::{PlatformJob, PlatformQueue, PlatformTick};
pub use search::{find_ground_level, SearchLimits};

/// What a creature would be standing on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    Solid,
    Water,
    Lava,
    /// Nothing found between floor and ceiling
    Void,
}

/// Result of a ground search at one block column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundResult {
    /// Height of the block a creature would stand on
    pub ground_level: i32,
    pub surface: SurfaceType,
    /// Liquid and void surfaces need a synthetic floor
    pub needs_platform: bool,
    /// Solid block found by the liquid depth probe, if any
    pub solid_beneath: Option<i32>,
}

impl GroundResult {
    pub fn solid(ground_level: i32) -> Self {
        Self {
            ground_level,
            surface: SurfaceType::Solid,
            needs_platform: false,
            solid_beneath: None,
        }
    }

    pub fn void(ground_level: i32) -> Self {
        Self {
            ground_level,
            surface: SurfaceType::Void,
            needs_platform: true,
            solid_beneath: None,
        }
    }

    pub fn is_liquid(&self) -> bool {
        matches!(self.surface, SurfaceType::Water | SurfaceType::Lava)
    }
}

/// Column search with a time-bounded result cache
#[derive(Debug)]
pub struct TerrainSearch {
    limits: SearchLimits,
    cache: GroundCache,
}

impl TerrainSearch {
    pub fn new(config: &RaidConfig) -> Self {
        Self {
            limits: SearchLimits::from_config(config),
            cache: GroundCache::new(config.ground_cache_ttl_ticks, config.ground_cache_capacity),
        }
    }

    /// Ground at horizontal position (x, z), or `None` when not resident
    ///
    /// Coordinates are rounded down to their block column, which is also the
    /// cache key.
    pub fn ground_at(
        &mut self,
        world: &dyn WorldAccess,
        x: f64,
        z: f64,
        start_y: i32,
        now: Tick,
    ) -> Option<GroundResult> {
        let column = (x.floor() as i32, z.floor() as i32);
        if let Some(hit) = self.cache.get(column, now) {
            return Some(hit);
        }

        match find_ground_level(world, column.0, column.1, start_y, &self.limits) {
            Some(result) => {
                self.cache.insert(column, result, now);
                Some(result)
            }
            None => {
                tracing::debug!(
                    "Column ({}, {}) not resident, ground search deferred",
                    column.0,
                    column.1
                );
                None
            }
        }
    }

    /// Forget a column so the next query searches again (e.g. after a
    /// platform changed it)
    pub fn invalidate(&mut self, x: i32, z: i32) {
        self.cache.remove((x, z));
    }

    pub fn purge_expired(&mut self, now: Tick) -> usize {
        self.cache.purge_expired(now)
    }

    pub fn cached_columns(&self) -> usize {
        self.cache.len()
    }
}
