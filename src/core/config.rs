//! Raid configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every field has a default, so a
//! TOML file only needs to name what it overrides.

use crate::core::error::{RaidError, Result};
use serde::{Deserialize, Serialize};

/// Which policy decides a settlement's tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyStrategy {
    /// Tier grows with the participant's conquest history and power
    Progression,
    /// Tier grows with the settlement's distance from the world origin
    DistanceFromOrigin,
}

/// Configuration for the raid systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaidConfig {
    // === TERRAIN SEARCH ===
    /// Lowest block height the downward search will visit
    pub search_floor: i32,

    /// Highest block height the upward searches will visit
    pub search_ceiling: i32,

    /// How many blocks beneath a liquid surface are probed for solid ground
    ///
    /// Solid ground within this depth is the "shallow" case where a floor
    /// can be built; anything deeper is the "deep" case.
    pub liquid_probe_depth: i32,

    /// Ticks a cached ground result stays valid
    ///
    /// At 20 ticks per second the default of 6000 is five minutes. Terrain
    /// rarely changes that quickly around a settlement.
    pub ground_cache_ttl_ticks: u64,

    /// Maximum number of cached ground results before the oldest is evicted
    pub ground_cache_capacity: usize,

    /// Height of the column cleared of foliage and fluids above a spawn point
    pub clear_column_height: i32,

    // === SYNTHETIC PLATFORMS ===
    /// Half-width of a synthetic platform (1 = 3x3 floor)
    pub platform_radius: i32,

    /// Polls a platform job may take before it is abandoned half-built
    pub platform_poll_budget: u32,

    // === SETTLEMENTS ===
    /// Minimum horizontal separation between two settlement records
    pub clustering_radius: f64,

    /// Maximum number of settlement records kept (oldest evicted first)
    pub max_settlements: usize,

    /// Horizontal distance at which a participant wakes a settlement
    pub activation_radius: f64,

    /// Maximum number of entries returned by settlement suggestions
    pub suggestion_limit: usize,

    // === DIFFICULTY ===
    pub strategy: DifficultyStrategy,

    /// Power estimate at or above which the base tier is always raised once
    pub expert_power: f64,

    /// Power estimate at or above which experienced participants get one
    /// extra tier
    pub advanced_power: f64,

    /// Prior conquests required before the advanced boost applies
    pub advanced_min_conquests: usize,

    /// Upper bounds (exclusive) of distance bands for tiers 0, 1 and 2
    ///
    /// Only used with `DifficultyStrategy::DistanceFromOrigin`.
    pub distance_bands: [f64; 3],

    // === REWARDS ===
    /// Reward paid for conquering a tier 0 settlement
    pub base_reward: u64,

    /// Multiplier applied to `base_reward` per tier
    pub tier_reward_multipliers: [f64; 4],

    /// Seed for defender count rolls
    pub seed: u64,
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            // Terrain
            search_floor: -64,
            search_ceiling: 320,
            liquid_probe_depth: 8,
            ground_cache_ttl_ticks: 6000,
            ground_cache_capacity: 1024,
            clear_column_height: 3,

            // Platforms
            platform_radius: 1,
            platform_poll_budget: 40,

            // Settlements
            clustering_radius: 150.0,
            max_settlements: 500,
            activation_radius: 64.0,
            suggestion_limit: 10,

            // Difficulty
            strategy: DifficultyStrategy::Progression,
            expert_power: 0.75,
            advanced_power: 0.5,
            advanced_min_conquests: 3,
            distance_bands: [1000.0, 3000.0, 6000.0],

            // Rewards
            base_reward: 100,
            tier_reward_multipliers: [1.0, 1.5, 2.25, 3.5],

            seed: 0x5e77_1e,
        }
    }
}

impl RaidConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, filling unspecified fields with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RaidConfig = toml::from_str(content)?;
        config.validate().map_err(RaidError::Config)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.search_floor >= self.search_ceiling {
            return Err(format!(
                "search_floor ({}) must be below search_ceiling ({})",
                self.search_floor, self.search_ceiling
            ));
        }

        if self.clustering_radius <= 0.0 || self.activation_radius <= 0.0 {
            return Err("clustering_radius and activation_radius must be positive".into());
        }

        if self.max_settlements == 0 || self.ground_cache_capacity == 0 {
            return Err("max_settlements and ground_cache_capacity must be non-zero".into());
        }

        // Advanced boost must be reachable before the expert one
        if self.advanced_power > self.expert_power {
            return Err(format!(
                "advanced_power ({}) should be <= expert_power ({})",
                self.advanced_power, self.expert_power
            ));
        }

        if !self.distance_bands.windows(2).all(|w| w[0] < w[1]) {
            return Err("distance_bands must be strictly increasing".into());
        }

        Ok(())
    }

    /// Reward paid for a conquest at the given tier
    pub fn reward_for(&self, tier: crate::core::types::Tier) -> u64 {
        (self.base_reward as f64 * self.tier_reward_multipliers[tier.index()]).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Tier;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RaidConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RaidConfig::from_toml_str(
            r#"
            clustering_radius = 200.0
            strategy = "distance_from_origin"
            "#,
        )
        .unwrap();
        assert_eq!(config.clustering_radius, 200.0);
        assert_eq!(config.strategy, DifficultyStrategy::DistanceFromOrigin);
        assert_eq!(config.max_settlements, 500);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = RaidConfig::from_toml_str("search_floor = 400").unwrap_err();
        assert!(matches!(err, RaidError::Config(_)));
    }

    #[test]
    fn test_reward_scales_with_tier() {
        let config = RaidConfig::default();
        assert_eq!(config.reward_for(Tier::Outpost), 100);
        assert_eq!(config.reward_for(Tier::Fortified), 150);
        assert_eq!(config.reward_for(Tier::Citadel), 350);
    }
}
