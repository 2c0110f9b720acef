//! Tier configuration: which defenders guard a settlement at each tier
//!
//! Loaded once and never mutated. The built-in table leaves tier 0 empty, so
//! outposts have no defenders.

use crate::core::error::{RaidError, Result};
use crate::core::types::{CreatureType, Tier};
use crate::geometry::SpawnPattern;
use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range of defenders to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub fn exactly(n: u32) -> Self {
        Self { min: n, max: n }
    }

    pub fn between(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn roll(&self, rng: &mut impl Rng) -> usize {
        let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
        rng.gen_range(lo..=hi) as usize
    }
}

/// One group of defenders within a tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenderEntry {
    pub creature_type: CreatureType,
    pub count: CountRange,
    #[serde(default)]
    pub radius: f64,
    pub pattern: SpawnPattern,
    /// Trigger fired on each placed creature to stamp tier stats
    #[serde(default)]
    pub tier_event: Option<String>,
    /// Offsets from the settlement center for `SpawnPattern::Explicit`
    #[serde(default)]
    pub offsets: Vec<DVec2>,
}

impl DefenderEntry {
    pub fn new(creature: &str, count: CountRange, radius: f64, pattern: SpawnPattern) -> Self {
        Self {
            creature_type: CreatureType::new(creature),
            count,
            radius,
            pattern,
            tier_event: None,
            offsets: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: &str) -> Self {
        self.tier_event = Some(event.to_string());
        self
    }

    pub fn with_offsets(mut self, offsets: Vec<DVec2>) -> Self {
        self.offsets = offsets;
        self
    }
}

/// Defender groups for each tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierTable {
    pub tier0: Vec<DefenderEntry>,
    pub tier1: Vec<DefenderEntry>,
    pub tier2: Vec<DefenderEntry>,
    pub tier3: Vec<DefenderEntry>,
}

impl Default for TierTable {
    fn default() -> Self {
        use SpawnPattern::*;

        Self {
            tier0: Vec::new(),
            tier1: vec![
                DefenderEntry::new("raider", CountRange::between(3, 4), 8.0, Ring)
                    .with_event("raid_tier_1"),
            ],
            tier2: vec![
                DefenderEntry::new("raider", CountRange::between(4, 6), 10.0, Ring)
                    .with_event("raid_tier_2"),
                DefenderEntry::new("brute", CountRange::exactly(4), 6.0, Cross)
                    .with_event("raid_tier_2"),
            ],
            tier3: vec![
                DefenderEntry::new("raider", CountRange::between(6, 8), 12.0, Ring)
                    .with_event("raid_tier_3"),
                DefenderEntry::new("brute", CountRange::exactly(4), 8.0, DiagonalCross)
                    .with_event("raid_tier_3"),
                DefenderEntry::new("warlord", CountRange::exactly(1), 0.0, Explicit)
                    .with_event("raid_tier_3")
                    .with_offsets(vec![DVec2::new(2.0, 0.0)]),
            ],
        }
    }
}

impl TierTable {
    /// Parse a TOML document; omitted tiers have no defenders
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: TierTable = toml::from_str(content)?;
        table.validate().map_err(RaidError::Config)?;
        Ok(table)
    }

    pub fn entries(&self, tier: Tier) -> &[DefenderEntry] {
        match tier {
            Tier::Outpost => &self.tier0,
            Tier::Fortified => &self.tier1,
            Tier::Stronghold => &self.tier2,
            Tier::Citadel => &self.tier3,
        }
    }

    /// Whether a settlement of this tier gets any defenders at all
    pub fn has_defenders(&self, tier: Tier) -> bool {
        self.entries(tier).iter().any(|e| match e.pattern {
            SpawnPattern::Explicit => !e.offsets.is_empty(),
            SpawnPattern::Ring => e.count.max > 0,
            SpawnPattern::Cross | SpawnPattern::DiagonalCross => true,
        })
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        for tier in Tier::ALL {
            for entry in self.entries(tier) {
                if entry.pattern == SpawnPattern::Explicit {
                    if entry.offsets.is_empty() {
                        return Err(format!(
                            "{}: explicit {} entry has no offsets",
                            tier, entry.creature_type
                        ));
                    }
                } else if entry.radius <= 0.0 {
                    return Err(format!(
                        "{}: {} entry needs a positive radius",
                        tier, entry.creature_type
                    ));
                }
            }
        }
        Ok(())
    }
}
