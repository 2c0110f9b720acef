//! In-memory voxel world
//!
//! A sparse block map plus a creature table, with chunk-level residency so
//! callers can simulate regions that are not loaded. Used by the headless
//! driver and by tests.

use super::{BlockKind, EntityStatus, WorldAccess};
use crate::core::types::{BlockPos, CreatureType, EntityId};
use ahash::{AHashMap, AHashSet};
use glam::DVec3;

/// Horizontal size of a residency chunk in blocks
pub const CHUNK_SIZE: i32 = 16;

/// A creature living in a [`MemoryWorld`]
#[derive(Debug, Clone)]
pub struct Creature {
    pub creature: CreatureType,
    pub position: DVec3,
    pub alive: bool,
    /// Tier events fired on this creature, in order
    pub events: Vec<String>,
}

/// Sparse block storage; unset resident positions are air
#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: AHashMap<BlockPos, BlockKind>,
    unloaded: AHashSet<(i32, i32)>,
    creatures: AHashMap<EntityId, Creature>,
}

fn chunk_of(x: i32, z: i32) -> (i32, i32) {
    (x.div_euclid(CHUNK_SIZE), z.div_euclid(CHUNK_SIZE))
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-layer floor of `kind` at height `y` spanning `-half..=half`
    pub fn flat(y: i32, half: i32, kind: BlockKind) -> Self {
        let mut world = Self::new();
        world.fill_box(BlockPos::new(-half, y, -half), BlockPos::new(half, y, half), kind);
        world
    }

    /// Fill the inclusive box between `min` and `max`
    pub fn fill_box(&mut self, min: BlockPos, max: BlockPos, kind: BlockKind) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.put(BlockPos::new(x, y, z), kind);
                }
            }
        }
    }

    /// Set a block regardless of residency
    pub fn put(&mut self, pos: BlockPos, kind: BlockKind) {
        if kind == BlockKind::Air {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, kind);
        }
    }

    /// Read a block regardless of residency
    pub fn peek(&self, pos: BlockPos) -> BlockKind {
        self.blocks.get(&pos).copied().unwrap_or(BlockKind::Air)
    }

    pub fn unload_chunk_at(&mut self, x: i32, z: i32) {
        self.unloaded.insert(chunk_of(x, z));
    }

    pub fn load_chunk_at(&mut self, x: i32, z: i32) {
        self.unloaded.remove(&chunk_of(x, z));
    }

    pub fn is_resident(&self, x: i32, z: i32) -> bool {
        !self.unloaded.contains(&chunk_of(x, z))
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn creatures(&self) -> impl Iterator<Item = (&EntityId, &Creature)> {
        self.creatures.iter()
    }

    pub fn living_count(&self) -> usize {
        self.creatures.values().filter(|c| c.alive).count()
    }

    pub fn kill(&mut self, id: EntityId) -> bool {
        match self.creatures.get_mut(&id) {
            Some(creature) if creature.alive => {
                creature.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Kill every living creature within `radius` of `center` (horizontal)
    pub fn kill_within(&mut self, center: BlockPos, radius: f64) -> usize {
        let cx = center.x as f64;
        let cz = center.z as f64;
        let mut killed = 0;
        for creature in self.creatures.values_mut().filter(|c| c.alive) {
            let dx = creature.position.x - cx;
            let dz = creature.position.z - cz;
            if (dx * dx + dz * dz).sqrt() <= radius {
                creature.alive = false;
                killed += 1;
            }
        }
        killed
    }
}

impl WorldAccess for MemoryWorld {
    fn block_at(&self, pos: BlockPos) -> Option<BlockKind> {
        self.is_resident(pos.x, pos.z).then(|| self.peek(pos))
    }

    fn set_block(&mut self, pos: BlockPos, kind: BlockKind) -> bool {
        if !self.is_resident(pos.x, pos.z) {
            return false;
        }
        self.put(pos, kind);
        true
    }

    fn spawn_creature(&mut self, creature: &CreatureType, position: DVec3) -> Option<EntityId> {
        let (x, z) = (position.x.floor() as i32, position.z.floor() as i32);
        if !self.is_resident(x, z) {
            return None;
        }
        let id = EntityId::new();
        self.creatures.insert(
            id,
            Creature {
                creature: creature.clone(),
                position,
                alive: true,
                events: Vec::new(),
            },
        );
        Some(id)
    }

    fn trigger_event(&mut self, entity: EntityId, event: &str) {
        if let Some(creature) = self.creatures.get_mut(&entity) {
            creature.events.push(event.to_string());
        }
    }

    fn entity_status(&self, entity: EntityId) -> EntityStatus {
        match self.creatures.get(&entity) {
            Some(creature) => {
                let (x, z) = (creature.position.x.floor() as i32, creature.position.z.floor() as i32);
                if !self.is_resident(x, z) {
                    EntityStatus::NotResident
                } else if creature.alive {
                    EntityStatus::Alive
                } else {
                    EntityStatus::Dead
                }
            }
            // Despawned creatures count as dead
            None => EntityStatus::Dead,
        }
    }
}
