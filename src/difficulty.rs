//! Difficulty calculator
//!
//! A single calculator with a strategy chosen at composition time:
//!
//! * `Progression` - tier from how many settlements the participant holds the
//!   last conquest of, optionally raised one step by their power estimate.
//! * `DistanceFromOrigin` - tier from how far the settlement is from (0, 0).

use crate::core::config::{DifficultyStrategy, RaidConfig};
use crate::core::types::{horizontal_distance, BlockPos, Participant, ParticipantId, SettlementKey, Tier};
use crate::services::PowerEstimator;
use crate::settlements::{SettlementCache, SettlementRecord};
use ordered_float::OrderedFloat;

/// A candidate settlement with its difficulty for one participant
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSettlement {
    pub key: SettlementKey,
    pub location: BlockPos,
    pub tier: Tier,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct DifficultyCalculator {
    strategy: DifficultyStrategy,
    expert_power: f64,
    advanced_power: f64,
    advanced_min_conquests: usize,
    distance_bands: [f64; 3],
}

/// Tier earned from prior conquests alone
pub fn base_tier(conquests: usize) -> Tier {
    match conquests {
        0..=2 => Tier::Outpost,
        3..=7 => Tier::Fortified,
        8..=14 => Tier::Stronghold,
        _ => Tier::Citadel,
    }
}

impl DifficultyCalculator {
    pub fn new(config: &RaidConfig) -> Self {
        Self {
            strategy: config.strategy,
            expert_power: config.expert_power,
            advanced_power: config.advanced_power,
            advanced_min_conquests: config.advanced_min_conquests,
            distance_bands: config.distance_bands,
        }
    }

    pub fn strategy(&self) -> DifficultyStrategy {
        self.strategy
    }

    /// Tier of the settlement at `location` for `participant`
    pub fn tier_for(
        &self,
        participant: ParticipantId,
        location: BlockPos,
        history: &SettlementCache,
        power: &dyn PowerEstimator,
    ) -> Tier {
        match self.strategy {
            DifficultyStrategy::Progression => {
                let conquests = history.conquests_by(participant);
                self.progression_tier(conquests, power.estimate(participant))
            }
            DifficultyStrategy::DistanceFromOrigin => self.distance_tier(location),
        }
    }

    /// Base tier from conquests, raised at most one step by power
    pub fn progression_tier(&self, conquests: usize, power: f64) -> Tier {
        let base = base_tier(conquests);
        // NaN estimates count as no power at all
        let power = if power.is_nan() { 0.0 } else { power.clamp(0.0, 1.0) };

        if power >= self.expert_power {
            base.raised()
        } else if power >= self.advanced_power && conquests >= self.advanced_min_conquests {
            base.raised()
        } else {
            base
        }
    }

    pub fn distance_tier(&self, location: BlockPos) -> Tier {
        let distance = horizontal_distance(BlockPos::ZERO, location);
        let band = self
            .distance_bands
            .iter()
            .position(|&bound| distance < bound)
            .unwrap_or(self.distance_bands.len());
        Tier::from_index(band)
    }

    /// Candidates ordered easiest first, then nearest first
    pub fn rank(
        &self,
        participant: &Participant,
        candidates: &[SettlementRecord],
        history: &SettlementCache,
        power: &dyn PowerEstimator,
    ) -> Vec<RankedSettlement> {
        let mut ranked: Vec<RankedSettlement> = candidates
            .iter()
            .map(|record| RankedSettlement {
                key: record.key.clone(),
                location: record.location,
                tier: self.tier_for(participant.id, record.location, history, power),
                distance: horizontal_distance(participant.position, record.location),
            })
            .collect();

        ranked.sort_by(|a, b| {
            (a.tier, OrderedFloat(a.distance), &a.key).cmp(&(b.tier, OrderedFloat(b.distance), &b.key))
        });
        ranked
    }
}
