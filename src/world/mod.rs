//! The seam between raid logic and the host world
//!
//! Everything the core learns about blocks and creatures goes through
//! [`WorldAccess`]. Queries against regions that are not resident in memory
//! answer `None` / [`EntityStatus::NotResident`] immediately; callers treat
//! that as "try again next pass", never as an answer.

pub mod memory;

use crate::core::types::{BlockPos, CreatureType, EntityId};
use glam::DVec3;
use serde::{Deserialize, Serialize};

pub use memory::MemoryWorld;

/// Coarse block classification used by terrain search and column clearing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Air,
    /// Structural terrain; never removed by this crate
    Solid,
    /// Grass, flowers, saplings and other thin plants
    Foliage,
    Water,
    Lava,
}

impl BlockKind {
    pub fn is_solid(self) -> bool {
        matches!(self, BlockKind::Solid)
    }

    pub fn is_liquid(self) -> bool {
        matches!(self, BlockKind::Water | BlockKind::Lava)
    }

    /// Air-like for the purpose of finding ground
    pub fn is_passable(self) -> bool {
        matches!(self, BlockKind::Air | BlockKind::Foliage)
    }

    /// Non-structural obstruction that may be removed above a spawn point
    pub fn is_clearable(self) -> bool {
        matches!(self, BlockKind::Foliage | BlockKind::Water | BlockKind::Lava)
    }
}

/// Liveness of a tracked creature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    Alive,
    Dead,
    /// The creature's region is unloaded; liveness is unknown
    NotResident,
}

/// Block and creature access provided by the host world
pub trait WorldAccess {
    /// Block at `pos`, or `None` when its region is not resident
    fn block_at(&self, pos: BlockPos) -> Option<BlockKind>;

    /// Replace the block at `pos`; returns false when its region is not resident
    fn set_block(&mut self, pos: BlockPos, kind: BlockKind) -> bool;

    /// Materialize a creature; `None` when the host refuses (e.g. unloaded region)
    fn spawn_creature(&mut self, creature: &CreatureType, position: DVec3) -> Option<EntityId>;

    /// Fire a named trigger on a creature (used to stamp tier stats)
    fn trigger_event(&mut self, entity: EntityId, event: &str);

    fn entity_status(&self, entity: EntityId) -> EntityStatus;
}
