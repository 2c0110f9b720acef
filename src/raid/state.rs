//! Per-settlement raid state

use crate::core::types::{BlockPos, EntityId, Tier};
use crate::placement::FailedSpawn;
use serde::{Deserialize, Serialize};

/// Where a settlement is in its raid lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaidPhase {
    Idle,
    Active,
    Conquered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidState {
    pub tier: Tier,
    pub is_active: bool,
    pub is_conquered: bool,
    pub defender_ids: Vec<EntityId>,
    pub failed_spawns: Vec<FailedSpawn>,
    pub location: BlockPos,
    /// Reward for this conquest has been paid out
    pub claimed: bool,
}

impl RaidState {
    pub fn new(location: BlockPos) -> Self {
        Self {
            tier: Tier::Outpost,
            is_active: false,
            is_conquered: false,
            defender_ids: Vec::new(),
            failed_spawns: Vec::new(),
            location,
            claimed: false,
        }
    }

    pub fn phase(&self) -> RaidPhase {
        if self.is_conquered {
            RaidPhase::Conquered
        } else if self.is_active {
            RaidPhase::Active
        } else {
            RaidPhase::Idle
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == RaidPhase::Idle
    }

    /// Enter Active at `tier`; the tier is fixed until the next activation
    pub fn activate(&mut self, tier: Tier) {
        self.tier = tier;
        self.is_active = true;
        self.is_conquered = false;
        self.claimed = false;
        self.defender_ids.clear();
        self.failed_spawns.clear();
    }

    /// Active with defenders still owed to the world
    pub fn has_pending_spawns(&self) -> bool {
        self.is_active && !self.is_conquered && !self.failed_spawns.is_empty()
    }

    /// Conquered and not yet paid out
    pub fn is_claimable(&self) -> bool {
        self.is_conquered && !self.claimed
    }

    /// Back to Idle, keeping tier and location
    pub fn reset(&mut self) {
        self.is_active = false;
        self.is_conquered = false;
        self.claimed = false;
        self.defender_ids.clear();
        self.failed_spawns.clear();
    }
}
