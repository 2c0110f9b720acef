//! Entity placement: turning spawn points into living defenders
//!
//! Each target is resolved against terrain independently. Anything that
//! cannot be placed now comes back as a [`FailedSpawn`] which can be fed to
//! [`EntityPlacer::retry`] unchanged on a later pass.

use crate::core::config::RaidConfig;
use crate::core::types::{BlockPos, CreatureType, EntityId, Tick};
use crate::terrain::{GroundResult, PlatformQueue, PlatformTick, SurfaceType, TerrainSearch};
use crate::world::{BlockKind, WorldAccess};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Fractions of the offset from the fallback center tried on liquid, outermost first
const DECAY_STEPS: u32 = 10;

/// A spawn that did not happen and should be attempted again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSpawn {
    pub creature_type: CreatureType,
    pub position: DVec3,
    #[serde(default)]
    pub tier_event: Option<String>,
}

/// Result of placing a batch of targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementOutcome {
    pub succeeded: Vec<EntityId>,
    pub failed: Vec<FailedSpawn>,
}

impl PlacementOutcome {
    pub fn merge(&mut self, other: PlacementOutcome) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }
}

/// Why a single target failed; only used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlacementFailure {
    NotResident,
    NoBearingGround,
    Refused,
}

/// Places creatures on the ground, building floors where there is none
#[derive(Debug)]
pub struct EntityPlacer {
    terrain: TerrainSearch,
    platforms: PlatformQueue,
    clear_height: i32,
}

impl EntityPlacer {
    pub fn new(config: &RaidConfig) -> Self {
        Self {
            terrain: TerrainSearch::new(config),
            platforms: PlatformQueue::new(config.platform_radius, config.platform_poll_budget),
            clear_height: config.clear_column_height.max(1),
        }
    }

    /// Materialize `creature` at each target
    ///
    /// With a `fallback_center`, targets over liquid are pulled toward the
    /// center in 10% steps until solid ground is found; without one, the
    /// creature stands on a platform on the liquid surface.
    pub fn place(
        &mut self,
        world: &mut dyn WorldAccess,
        creature: &CreatureType,
        targets: &[DVec3],
        tier_event: Option<&str>,
        fallback_center: Option<DVec3>,
        now: Tick,
    ) -> PlacementOutcome {
        let mut outcome = PlacementOutcome::default();
        for &target in targets {
            match self.place_one(world, creature, target, tier_event, fallback_center, now) {
                Ok(id) => outcome.succeeded.push(id),
                Err(reason) => {
                    tracing::debug!(
                        "Could not place {} at ({:.1}, {:.1}, {:.1}): {:?}, will retry",
                        creature,
                        target.x,
                        target.y,
                        target.z,
                        reason
                    );
                    outcome.failed.push(FailedSpawn {
                        creature_type: creature.clone(),
                        position: target,
                        tier_event: tier_event.map(str::to_string),
                    });
                }
            }
        }
        outcome
    }

    /// Attempt a previous failure list again, exactly as recorded
    pub fn retry(
        &mut self,
        world: &mut dyn WorldAccess,
        failed: &[FailedSpawn],
        fallback_center: Option<DVec3>,
        now: Tick,
    ) -> PlacementOutcome {
        let mut outcome = PlacementOutcome::default();
        for spawn in failed {
            outcome.merge(self.place(
                world,
                &spawn.creature_type,
                std::slice::from_ref(&spawn.position),
                spawn.tier_event.as_deref(),
                fallback_center,
                now,
            ));
        }
        outcome
    }

    /// Advance queued platforms by one unit of work each
    pub fn tick_platforms(&mut self, world: &mut dyn WorldAccess) -> PlatformTick {
        self.platforms.tick(world)
    }

    pub fn pending_platforms(&self) -> usize {
        self.platforms.pending()
    }

    pub fn purge_ground_cache(&mut self, now: Tick) -> usize {
        self.terrain.purge_expired(now)
    }

    fn place_one(
        &mut self,
        world: &mut dyn WorldAccess,
        creature: &CreatureType,
        target: DVec3,
        tier_event: Option<&str>,
        fallback_center: Option<DVec3>,
        now: Tick,
    ) -> Result<EntityId, PlacementFailure> {
        let start_y = target.y.round() as i32;
        let ground = self
            .terrain
            .ground_at(&*world, target.x, target.z, start_y, now)
            .ok_or(PlacementFailure::NotResident)?;

        let spot = match (ground.surface, fallback_center) {
            (SurfaceType::Solid, _) => DVec3::new(target.x, ground.ground_level as f64, target.z),
            (SurfaceType::Water | SurfaceType::Lava, Some(center)) => {
                self.decay_toward(&*world, target, center, start_y, now)?
            }
            (SurfaceType::Water | SurfaceType::Lava | SurfaceType::Void, _) => {
                self.raise_platform(world, target, &ground)?
            }
        };

        self.spawn_on(world, creature, spot, tier_event)
    }

    /// Walk from `target` toward `center` until a solid column turns up
    fn decay_toward(
        &mut self,
        world: &dyn WorldAccess,
        target: DVec3,
        center: DVec3,
        start_y: i32,
        now: Tick,
    ) -> Result<DVec3, PlacementFailure> {
        let offset = target - center;
        for step in (0..=DECAY_STEPS).rev() {
            let fraction = step as f64 / DECAY_STEPS as f64;
            let x = center.x + offset.x * fraction;
            let z = center.z + offset.z * fraction;
            let ground = self
                .terrain
                .ground_at(world, x, z, start_y, now)
                .ok_or(PlacementFailure::NotResident)?;
            if ground.surface == SurfaceType::Solid {
                return Ok(DVec3::new(x, ground.ground_level as f64, z));
            }
        }
        Err(PlacementFailure::NoBearingGround)
    }

    /// Lay the middle block of a floor now and queue the rest
    fn raise_platform(
        &mut self,
        world: &mut dyn WorldAccess,
        target: DVec3,
        ground: &GroundResult,
    ) -> Result<DVec3, PlacementFailure> {
        let block = BlockPos::new(
            target.x.floor() as i32,
            ground.ground_level,
            target.z.floor() as i32,
        );
        if !world.set_block(block, BlockKind::Solid) {
            return Err(PlacementFailure::NotResident);
        }
        self.terrain.invalidate(block.x, block.z);
        self.platforms.enqueue(block);
        tracing::debug!("Queued {:?} platform at {}", ground.surface, block);
        Ok(DVec3::new(target.x, ground.ground_level as f64, target.z))
    }

    /// Clear the column above `ground` and spawn one block up
    fn spawn_on(
        &mut self,
        world: &mut dyn WorldAccess,
        creature: &CreatureType,
        ground: DVec3,
        tier_event: Option<&str>,
    ) -> Result<EntityId, PlacementFailure> {
        let base = BlockPos::new(ground.x.floor() as i32, ground.y as i32, ground.z.floor() as i32);
        for dy in 1..=self.clear_height {
            let pos = base + BlockPos::new(0, dy, 0);
            let kind = world.block_at(pos).ok_or(PlacementFailure::NotResident)?;
            if kind.is_clearable() && !world.set_block(pos, BlockKind::Air) {
                return Err(PlacementFailure::NotResident);
            }
        }

        let position = DVec3::new(ground.x, ground.y + 1.0, ground.z);
        let id = world
            .spawn_creature(creature, position)
            .ok_or(PlacementFailure::Refused)?;
        if let Some(event) = tier_event {
            world.trigger_event(id, event);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::MemoryWorld;

    fn placer() -> EntityPlacer {
        EntityPlacer::new(&RaidConfig::default())
    }

    fn raider() -> CreatureType {
        CreatureType::new("raider")
    }

    #[test]
    fn test_places_one_block_above_solid_ground() {
        let mut world = MemoryWorld::flat(60, 8, BlockKind::Solid);
        let mut placer = placer();
        let outcome = placer.place(
            &mut world,
            &raider(),
            &[DVec3::new(2.5, 64.0, 2.5)],
            Some("raid_tier_1"),
            None,
            0,
        );

        assert_eq!(outcome.succeeded.len(), 1);
        assert!(outcome.failed.is_empty());
        let creature = world.creature(outcome.succeeded[0]).unwrap();
        assert_eq!(creature.position, DVec3::new(2.5, 61.0, 2.5));
        assert_eq!(creature.events, vec!["raid_tier_1"]);
    }

    #[test]
    fn test_clears_foliage_and_water_but_not_solid() {
        let mut world = MemoryWorld::flat(60, 8, BlockKind::Solid);
        world.put(BlockPos::new(0, 61, 0), BlockKind::Foliage);
        world.put(BlockPos::new(0, 62, 0), BlockKind::Water);
        world.put(BlockPos::new(0, 63, 0), BlockKind::Solid);
        let mut placer = placer();

        // Start below the overhang so the search lands on y=60
        let outcome = placer.place(&mut world, &raider(), &[DVec3::new(0.5, 61.0, 0.5)], None, None, 0);

        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(world.peek(BlockPos::new(0, 61, 0)), BlockKind::Air);
        assert_eq!(world.peek(BlockPos::new(0, 62, 0)), BlockKind::Air);
        assert_eq!(world.peek(BlockPos::new(0, 63, 0)), BlockKind::Solid);
    }

    #[test]
    fn test_unloaded_target_fails_and_retries() {
        let mut world = MemoryWorld::flat(60, 40, BlockKind::Solid);
        world.unload_chunk_at(20, 20);
        let mut placer = placer();

        let targets = [DVec3::new(1.0, 64.0, 1.0), DVec3::new(20.0, 64.0, 20.0)];
        let outcome = placer.place(&mut world, &raider(), &targets, Some("raid_tier_2"), None, 0);
        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(
            outcome.failed,
            vec![FailedSpawn {
                creature_type: raider(),
                position: targets[1],
                tier_event: Some("raid_tier_2".into()),
            }]
        );

        // Still unloaded: same failure comes back
        let again = placer.retry(&mut world, &outcome.failed, None, 1);
        assert_eq!(again.failed, outcome.failed);

        world.load_chunk_at(20, 20);
        let done = placer.retry(&mut world, &outcome.failed, None, 2);
        assert_eq!(done.succeeded.len(), 1);
        assert!(done.failed.is_empty());
        let creature = world.creature(done.succeeded[0]).unwrap();
        assert_eq!(creature.events, vec!["raid_tier_2"]);
    }

    #[test]
    fn test_liquid_with_fallback_decays_toward_center() {
        // Land for x <= 10, a lake beyond
        let mut world = MemoryWorld::new();
        world.fill_box(BlockPos::new(-20, 60, -2), BlockPos::new(10, 60, 2), BlockKind::Solid);
        world.fill_box(BlockPos::new(11, 58, -2), BlockPos::new(30, 60, 2), BlockKind::Water);
        let mut placer = placer();

        let center = DVec3::new(0.5, 64.0, 0.5);
        let target = DVec3::new(20.5, 64.0, 0.5);
        let outcome = placer.place(&mut world, &raider(), &[target], None, Some(center), 0);

        assert_eq!(outcome.succeeded.len(), 1);
        let creature = world.creature(outcome.succeeded[0]).unwrap();
        // 50% of the offset is the first step that reaches land
        assert!((creature.position.x - 10.5).abs() < 1e-9);
        assert_eq!(creature.position.y, 61.0);
    }

    #[test]
    fn test_liquid_with_fallback_and_no_land_fails() {
        let mut world = MemoryWorld::new();
        world.fill_box(BlockPos::new(-30, 50, -2), BlockPos::new(30, 60, 2), BlockKind::Water);
        let mut placer = placer();

        let outcome = placer.place(
            &mut world,
            &raider(),
            &[DVec3::new(20.5, 64.0, 0.5)],
            None,
            Some(DVec3::new(0.5, 64.0, 0.5)),
            0,
        );
        assert!(outcome.succeeded.is_empty());
        assert_eq!(outcome.failed.len(), 1);
    }

    #[test]
    fn test_liquid_without_fallback_stands_on_platform() {
        let mut world = MemoryWorld::new();
        world.fill_box(BlockPos::new(-5, 55, -5), BlockPos::new(5, 60, 5), BlockKind::Water);
        let mut placer = placer();

        let outcome = placer.place(&mut world, &raider(), &[DVec3::new(0.5, 64.0, 0.5)], None, None, 0);

        assert_eq!(outcome.succeeded.len(), 1);
        let creature = world.creature(outcome.succeeded[0]).unwrap();
        assert_eq!(creature.position.y, 61.0);
        assert_eq!(world.peek(BlockPos::new(0, 60, 0)), BlockKind::Solid);
        assert_eq!(placer.pending_platforms(), 1);

        while placer.pending_platforms() > 0 {
            placer.tick_platforms(&mut world);
        }
        assert_eq!(world.peek(BlockPos::new(1, 60, 1)), BlockKind::Solid);
        assert_eq!(world.peek(BlockPos::new(-1, 60, -1)), BlockKind::Solid);
    }

    #[test]
    fn test_void_builds_platform_below_target() {
        let mut world = MemoryWorld::new();
        let mut placer = placer();

        let outcome = placer.place(&mut world, &raider(), &[DVec3::new(3.5, 70.0, 3.5)], None, None, 0);

        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(world.peek(BlockPos::new(3, 69, 3)), BlockKind::Solid);
        let creature = world.creature(outcome.succeeded[0]).unwrap();
        assert_eq!(creature.position, DVec3::new(3.5, 70.0, 3.5));
    }
}
