//! Collaborators owned by the host
//!
//! These are simple bookkeeping services living outside this crate. The
//! raid core reads a power estimate and cooldowns from them, hands rewards
//! to them, and asks the locator where landmarks are.

use crate::core::types::{BlockPos, ParticipantId, SettlementKey};

/// Estimates how strong a participant is, from 0.0 (fresh) to 1.0 (maxed)
pub trait PowerEstimator {
    fn estimate(&self, participant: ParticipantId) -> f64;
}

/// Per-participant, per-settlement cooldowns
pub trait CooldownTracker {
    fn can_act_on(&self, participant: ParticipantId, key: &SettlementKey) -> bool;
    fn record(&mut self, participant: ParticipantId, key: &SettlementKey);
}

/// Pays out conquest rewards
pub trait RewardService {
    fn grant(&mut self, participant: ParticipantId, key: &SettlementKey, amount: u64);
}

/// Finds raw landmark positions near a point
pub trait SettlementLocator {
    fn settlements_near(&self, center: BlockPos, radius: f64) -> Vec<BlockPos>;
}

/// Every participant has the same power estimate
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPower(pub f64);

impl PowerEstimator for FixedPower {
    fn estimate(&self, _participant: ParticipantId) -> f64 {
        self.0
    }
}

/// Nothing is ever on cooldown
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCooldowns;

impl CooldownTracker for NoCooldowns {
    fn can_act_on(&self, _participant: ParticipantId, _key: &SettlementKey) -> bool {
        true
    }

    fn record(&mut self, _participant: ParticipantId, _key: &SettlementKey) {}
}

/// A locator over a fixed list of landmark positions
#[derive(Debug, Clone, Default)]
pub struct FixedLocator {
    pub landmarks: Vec<BlockPos>,
}

impl FixedLocator {
    pub fn new(landmarks: Vec<BlockPos>) -> Self {
        Self { landmarks }
    }
}

impl SettlementLocator for FixedLocator {
    fn settlements_near(&self, center: BlockPos, radius: f64) -> Vec<BlockPos> {
        self.landmarks
            .iter()
            .copied()
            .filter(|&pos| crate::core::types::horizontal_distance(center, pos) <= radius)
            .collect()
    }
}
