//! Bidirectional ground search over a single block column
//!
//! The search tolerates caves, overhangs, liquids and void. Any block read
//! that lands in a non-resident region aborts with `None`, which callers
//! must treat as "retry later" rather than "no ground".

use super::{GroundResult, SurfaceType};
use crate::core::config::RaidConfig;
use crate::core::types::BlockPos;
use crate::world::{BlockKind, WorldAccess};

/// Vertical bounds of a ground search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    pub floor: i32,
    pub ceiling: i32,
    pub liquid_probe_depth: i32,
}

impl SearchLimits {
    pub fn from_config(config: &RaidConfig) -> Self {
        Self {
            floor: config.search_floor,
            ceiling: config.search_ceiling,
            liquid_probe_depth: config.liquid_probe_depth,
        }
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from_config(&RaidConfig::default())
    }
}

/// Locate the walkable surface of column (x, z) starting at `start_y`
///
/// * Start inside solid terrain: climb until the column opens up and report
///   the last solid block (spawn points buried in a mountain).
/// * Start in the open: walk down to the floor; if nothing is there, walk up
///   to the ceiling and report the top of the first mass found (spawn points
///   below floating or tall terrain).
/// * Start submerged: climb to the top of the liquid and report that.
/// * Liquid surfaces are reported as ground with `needs_platform`.
/// * Nothing anywhere: a void result one block below `start_y`.
pub fn find_ground_level(
    world: &dyn WorldAccess,
    x: i32,
    z: i32,
    start_y: i32,
    limits: &SearchLimits,
) -> Option<GroundResult> {
    let start_y = start_y.clamp(limits.floor, limits.ceiling);
    let block = |y: i32| world.block_at(BlockPos::new(x, y, z));

    let start = block(start_y)?;
    if start.is_solid() {
        for y in start_y + 1..=limits.ceiling {
            if !block(y)?.is_solid() {
                return Some(GroundResult::solid(y - 1));
            }
        }
        return Some(GroundResult::solid(limits.ceiling));
    }

    if start.is_liquid() {
        // Submerged start: the surface is the top of this liquid column
        let mut top = start_y;
        while top < limits.ceiling && block(top + 1)?.is_liquid() {
            top += 1;
        }
        return classify_surface(world, x, z, top, block(top)?, limits);
    }

    for y in (limits.floor..=start_y).rev() {
        let kind = block(y)?;
        if kind.is_passable() {
            continue;
        }
        return classify_surface(world, x, z, y, kind, limits);
    }

    let mut y = start_y + 1;
    while y <= limits.ceiling {
        if block(y)?.is_passable() {
            y += 1;
            continue;
        }
        let mut top = y;
        while top < limits.ceiling && !block(top + 1)?.is_passable() {
            top += 1;
        }
        let kind = block(top)?;
        return classify_surface(world, x, z, top, kind, limits);
    }

    Some(GroundResult::void(start_y - 1))
}

/// Classify the first non-passable block at `y`
fn classify_surface(
    world: &dyn WorldAccess,
    x: i32,
    z: i32,
    y: i32,
    kind: BlockKind,
    limits: &SearchLimits,
) -> Option<GroundResult> {
    let surface = match kind {
        BlockKind::Water => SurfaceType::Water,
        BlockKind::Lava => SurfaceType::Lava,
        _ => return Some(GroundResult::solid(y)),
    };

    let mut solid_beneath = None;
    for depth in 1..=limits.liquid_probe_depth {
        let probe_y = y - depth;
        if probe_y < limits.floor {
            break;
        }
        if world.block_at(BlockPos::new(x, probe_y, z))?.is_solid() {
            solid_beneath = Some(probe_y);
            break;
        }
    }

    Some(GroundResult {
        ground_level: y,
        surface,
        needs_platform: true,
        solid_beneath,
    })
}
