//! Settlement raid orchestrator
//!
//! Owns one [`RaidState`] per settlement key and drives it through
//! Idle -> Active -> Conquered -> Idle. Nothing here keeps time: the host's
//! scheduler calls [`RaidOrchestrator::scan_proximity`],
//! [`RaidOrchestrator::check_victories`] and
//! [`RaidOrchestrator::tick_platforms`] at its own cadence and passes the
//! current tick in.

use super::state::RaidState;
use super::tiers::TierTable;
use crate::core::config::RaidConfig;
use crate::core::types::{BlockPos, Participant, ParticipantId, SettlementKey, Tick, Tier};
use crate::difficulty::{DifficultyCalculator, RankedSettlement};
use crate::geometry;
use crate::placement::EntityPlacer;
use crate::services::{CooldownTracker, PowerEstimator, RewardService, SettlementLocator};
use crate::settlements::{AddOutcome, DiscoveryMethod, SettlementCache, SettlementRecord};
use crate::terrain::PlatformTick;
use crate::world::{EntityStatus, WorldAccess};
use glam::DVec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet};

/// What a single proximity scan did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub discovered: Vec<SettlementKey>,
    pub activated: Vec<SettlementKey>,
    /// Defenders placed, including retried ones
    pub placed: usize,
    /// Defenders still waiting for a later pass
    pub pending: usize,
}

pub struct RaidOrchestrator {
    config: RaidConfig,
    cache: SettlementCache,
    tiers: TierTable,
    difficulty: DifficultyCalculator,
    placer: EntityPlacer,
    // Ordered so count rolls happen in a reproducible order
    states: BTreeMap<SettlementKey, RaidState>,
    rng: ChaCha8Rng,
}

/// Block-center point of a settlement, at its recorded height
fn settlement_center(location: BlockPos) -> DVec3 {
    DVec3::new(
        location.x as f64 + 0.5,
        location.y as f64,
        location.z as f64 + 0.5,
    )
}

impl RaidOrchestrator {
    pub fn new(config: RaidConfig, cache: SettlementCache, tiers: TierTable) -> Self {
        Self {
            difficulty: DifficultyCalculator::new(&config),
            placer: EntityPlacer::new(&config),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            states: BTreeMap::new(),
            config,
            cache,
            tiers,
        }
    }

    pub fn config(&self) -> &RaidConfig {
        &self.config
    }

    pub fn cache(&self) -> &SettlementCache {
        &self.cache
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    /// Register a settlement found outside a proximity scan
    pub fn register_settlement(
        &mut self,
        location: BlockPos,
        method: DiscoveryMethod,
        now: Tick,
    ) -> AddOutcome {
        let outcome = self.cache.add_settlement(location, method, now);
        self.forget_evicted();
        outcome
    }

    /// Drop raid state for settlements the cache has evicted
    fn forget_evicted(&mut self) {
        for key in self.cache.take_evicted() {
            if let Some(state) = self.states.remove(&key) {
                tracing::info!(
                    "Dropped raid on evicted {} ({} defenders left untracked)",
                    key,
                    state.defender_ids.len()
                );
            }
        }
    }

    /// One scheduled proximity pass
    ///
    /// Discovers landmarks near each participant, activates idle settlements
    /// within the activation radius, then retries earlier failed spawns of
    /// every active settlement.
    pub fn scan_proximity(
        &mut self,
        world: &mut dyn WorldAccess,
        participants: &[Participant],
        locator: &dyn SettlementLocator,
        power: &dyn PowerEstimator,
        cooldowns: &dyn CooldownTracker,
        now: Tick,
    ) -> ScanReport {
        let mut report = ScanReport::default();
        let radius = self.config.activation_radius;

        for participant in participants {
            let mut nearby = BTreeSet::new();

            for landmark in locator.settlements_near(participant.position, radius) {
                let outcome = self
                    .cache
                    .add_settlement(landmark, DiscoveryMethod::Proximity, now);
                if outcome.added() {
                    report.discovered.push(outcome.key().clone());
                }
                nearby.insert(outcome.key().clone());
            }
            self.forget_evicted();
            for record in self.cache.within(participant.position, radius) {
                nearby.insert(record.key.clone());
            }

            for key in nearby {
                let idle = self.states.get(&key).map_or(true, RaidState::is_idle);
                if !idle {
                    continue;
                }
                if !cooldowns.can_act_on(participant.id, &key) {
                    tracing::debug!("{} is on cooldown for {}", key, participant.id);
                    continue;
                }
                if let Some(placed) = self.activate(world, participant.id, &key, power, now) {
                    report.placed += placed;
                    report.activated.push(key);
                }
            }
        }

        report.placed += self.retry_failed(world, now);
        report.pending = self
            .states
            .values()
            .filter(|s| s.has_pending_spawns())
            .map(|s| s.failed_spawns.len())
            .sum();

        let purged = self.placer.purge_ground_cache(now);
        if purged > 0 {
            tracing::debug!("Purged {} expired ground results", purged);
        }
        report
    }

    /// Idle -> Active: fix the tier and place every configured defender
    ///
    /// Returns the number of defenders placed, or None if the key is unknown.
    fn activate(
        &mut self,
        world: &mut dyn WorldAccess,
        participant: ParticipantId,
        key: &SettlementKey,
        power: &dyn PowerEstimator,
        now: Tick,
    ) -> Option<usize> {
        let location = self.cache.get(key)?.location;
        let tier = self
            .difficulty
            .tier_for(participant, location, &self.cache, power);

        let state = self
            .states
            .entry(key.clone())
            .or_insert_with(|| RaidState::new(location));
        state.activate(tier);
        if !self.tiers.has_defenders(tier) {
            tracing::debug!("No defenders configured for {}, {} stays unguarded", tier, key);
        }

        let center = settlement_center(location);
        for entry in self.tiers.entries(tier) {
            let count = entry.count.roll(&mut self.rng);
            let targets = geometry::positions(center, entry.radius, entry.pattern, count, &entry.offsets);
            let outcome = self.placer.place(
                world,
                &entry.creature_type,
                &targets,
                entry.tier_event.as_deref(),
                Some(center),
                now,
            );
            state.defender_ids.extend(outcome.succeeded);
            state.failed_spawns.extend(outcome.failed);
        }

        tracing::info!(
            "Raid on {} active at {}: {} defenders placed, {} pending",
            key,
            tier,
            state.defender_ids.len(),
            state.failed_spawns.len()
        );
        Some(state.defender_ids.len())
    }

    /// Place earlier failures exactly as recorded; tier and geometry stay fixed
    fn retry_failed(&mut self, world: &mut dyn WorldAccess, now: Tick) -> usize {
        let mut placed = 0;
        for (key, state) in self.states.iter_mut() {
            if !state.has_pending_spawns() {
                continue;
            }
            let failed = std::mem::take(&mut state.failed_spawns);
            let outcome = self
                .placer
                .retry(world, &failed, Some(settlement_center(state.location)), now);

            if !outcome.succeeded.is_empty() {
                tracing::debug!(
                    "Placed {} late defenders at {}, {} still pending",
                    outcome.succeeded.len(),
                    key,
                    outcome.failed.len()
                );
            }
            placed += outcome.succeeded.len();
            state.defender_ids.extend(outcome.succeeded);
            state.failed_spawns = outcome.failed;
        }
        placed
    }

    /// Active -> Conquered for every settlement whose defenders are all dead
    ///
    /// Each conquest is reported once. Settlements with no tracked defenders
    /// never qualify, and a defender in an unloaded region defers the check.
    pub fn check_victories(&mut self, world: &dyn WorldAccess) -> Vec<SettlementKey> {
        let mut conquered = Vec::new();

        for (key, state) in self.states.iter_mut() {
            if !state.is_active || state.is_conquered || state.defender_ids.is_empty() {
                continue;
            }

            let mut all_dead = true;
            for &id in &state.defender_ids {
                match world.entity_status(id) {
                    EntityStatus::Dead => {}
                    EntityStatus::Alive => {
                        all_dead = false;
                        break;
                    }
                    EntityStatus::NotResident => {
                        tracing::debug!("Defender of {} not resident, checking again later", key);
                        all_dead = false;
                        break;
                    }
                }
            }

            if all_dead {
                state.is_conquered = true;
                tracing::info!("{} conquered ({})", key, state.tier);
                conquered.push(key.clone());
            }
        }

        conquered
    }

    /// Pay out a conquest to `participant`
    ///
    /// Records the conquest and the cooldown and grants the tier-scaled
    /// reward. Returns the amount, or None if the settlement is not
    /// claimable or the participant is on cooldown.
    pub fn claim_conquest(
        &mut self,
        participant: ParticipantId,
        key: &SettlementKey,
        cooldowns: &mut dyn CooldownTracker,
        rewards: &mut dyn RewardService,
    ) -> Option<u64> {
        let state = self.states.get_mut(key)?;
        if !state.is_claimable() {
            return None;
        }
        if !cooldowns.can_act_on(participant, key) {
            tracing::debug!("{} cannot claim {} yet", participant, key);
            return None;
        }

        if !self.cache.record_conquest(key, participant) {
            tracing::warn!("{} has no settlement record, not paying {}", key, participant);
            return None;
        }
        let amount = self.config.reward_for(state.tier);
        state.claimed = true;
        cooldowns.record(participant, key);
        rewards.grant(participant, key, amount);

        tracing::info!("{} claimed {} for {}", participant, key, amount);
        Some(amount)
    }

    /// Return a settlement to Idle, keeping its tier and location
    ///
    /// Returns false if the settlement never had raid state.
    pub fn reset_settlement(&mut self, key: &SettlementKey) -> bool {
        let Some(state) = self.states.get_mut(key) else {
            return false;
        };
        if !state.is_conquered {
            tracing::debug!("Resetting {} before it was conquered", key);
        }
        state.reset();
        tracing::info!("{} reset", key);
        true
    }

    /// Keys of settlements in the Active or Conquered phase
    pub fn get_active_settlements(&self) -> Vec<SettlementKey> {
        self.states
            .iter()
            .filter(|(_, s)| s.is_active)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn raid_state(&self, key: &SettlementKey) -> Option<&RaidState> {
        self.states.get(key)
    }

    /// Tier `participant` would face at `key` right now
    pub fn difficulty_for(
        &self,
        participant: ParticipantId,
        key: &SettlementKey,
        power: &dyn PowerEstimator,
    ) -> Option<Tier> {
        let record = self.cache.get(key)?;
        Some(
            self.difficulty
                .tier_for(participant, record.location, &self.cache, power),
        )
    }

    /// Known settlements that are not currently conquered, easiest and nearest first
    pub fn suggested_settlements(
        &self,
        participant: &Participant,
        power: &dyn PowerEstimator,
    ) -> Vec<RankedSettlement> {
        let candidates: Vec<SettlementRecord> = self
            .cache
            .all_settlements()
            .into_iter()
            .filter(|r| !self.states.get(&r.key).is_some_and(|s| s.is_conquered))
            .collect();

        let mut ranked = self
            .difficulty
            .rank(participant, &candidates, &self.cache, power);
        ranked.truncate(self.config.suggestion_limit);
        ranked
    }

    /// Advance queued platform floors by one block each
    pub fn tick_platforms(&mut self, world: &mut dyn WorldAccess) -> PlatformTick {
        self.placer.tick_platforms(world)
    }

    pub fn pending_platforms(&self) -> usize {
        self.placer.pending_platforms()
    }
}

impl std::fmt::Debug for RaidOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaidOrchestrator")
            .field("cache", &self.cache)
            .field("states", &self.states.len())
            .field("strategy", &self.difficulty.strategy())
            .finish()
    }
}
