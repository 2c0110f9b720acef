//! Synthetic platforms over void and liquid
//!
//! Building a floor is the one job spread across scheduler ticks: each call
//! to [`PlatformQueue::tick`] places at most one block per job and then
//! yields. A job that cannot finish within its poll budget is dropped and
//! whatever it managed to place stays in the world.

use crate::core::types::BlockPos;
use crate::world::{BlockKind, WorldAccess};

/// A floor under construction, centered on `center`
#[derive(Debug, Clone)]
pub struct PlatformJob {
    pub center: BlockPos,
    remaining: Vec<BlockPos>,
    placed: usize,
    polls: u32,
}

impl PlatformJob {
    /// Square floor of half-width `radius` at `center.y`, center block first
    pub fn new(center: BlockPos, radius: i32) -> Self {
        let mut cells: Vec<BlockPos> = (-radius..=radius)
            .flat_map(|dx| (-radius..=radius).map(move |dz| (dx, dz)))
            .map(|(dx, dz)| BlockPos::new(center.x + dx, center.y, center.z + dz))
            .collect();
        // Build outward from the middle; popped from the back
        cells.sort_by_key(|p| std::cmp::Reverse((p.x - center.x).abs() + (p.z - center.z).abs()));
        Self {
            center,
            remaining: cells,
            placed: 0,
            polls: 0,
        }
    }

    /// Do one unit of work. Returns true once nothing is left.
    pub fn step(&mut self, world: &mut dyn WorldAccess) -> bool {
        self.polls += 1;
        while let Some(&pos) = self.remaining.last() {
            match world.block_at(pos) {
                // Not resident: keep the block for a later poll
                None => return false,
                Some(kind) if kind.is_solid() => {
                    self.remaining.pop();
                }
                Some(_) => {
                    if world.set_block(pos, BlockKind::Solid) {
                        self.remaining.pop();
                        self.placed += 1;
                    }
                    return self.remaining.is_empty();
                }
            }
        }
        true
    }

    pub fn is_done(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

/// Outcome of advancing every queued platform once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformTick {
    pub completed: usize,
    pub abandoned: usize,
    pub pending: usize,
}

/// Platform jobs advanced one unit per scheduler tick
#[derive(Debug)]
pub struct PlatformQueue {
    jobs: Vec<PlatformJob>,
    radius: i32,
    poll_budget: u32,
}

impl PlatformQueue {
    pub fn new(radius: i32, poll_budget: u32) -> Self {
        Self {
            jobs: Vec::new(),
            radius: radius.max(0),
            poll_budget: poll_budget.max(1),
        }
    }

    /// Queue a floor at `center`; ignored if one is already queued there
    pub fn enqueue(&mut self, center: BlockPos) -> bool {
        if self.jobs.iter().any(|job| job.center == center) {
            return false;
        }
        self.jobs.push(PlatformJob::new(center, self.radius));
        true
    }

    /// Advance every job by one unit of work
    pub fn tick(&mut self, world: &mut dyn WorldAccess) -> PlatformTick {
        let mut outcome = PlatformTick::default();
        let budget = self.poll_budget;

        self.jobs.retain_mut(|job| {
            if job.step(&mut *world) {
                tracing::debug!("Platform at {} finished ({} blocks)", job.center, job.placed);
                outcome.completed += 1;
                return false;
            }
            if job.polls >= budget {
                tracing::warn!(
                    "Platform at {} abandoned after {} polls, {} blocks placed",
                    job.center,
                    job.polls,
                    job.placed
                );
                outcome.abandoned += 1;
                return false;
            }
            true
        });

        outcome.pending = self.jobs.len();
        outcome
    }

    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }
}
