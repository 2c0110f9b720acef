//! Settlement records as persisted

use crate::core::types::{BlockPos, ParticipantId, SettlementKey, Tick};
use serde::{Deserialize, Serialize};

/// How a settlement first came to be known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// A participant walked within activation range
    Proximity,
    /// Found by a structure locator sweep
    StructureScan,
    /// Registered by an operator or script
    Manual,
}

/// A raidable landmark known to the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub key: SettlementKey,
    pub location: BlockPos,
    pub discovered_at: Tick,
    pub discovery_method: DiscoveryMethod,
    #[serde(default)]
    pub last_conquered_by: Option<ParticipantId>,
    #[serde(default)]
    pub conquest_count: u32,
}

impl SettlementRecord {
    pub fn new(location: BlockPos, discovered_at: Tick, discovery_method: DiscoveryMethod) -> Self {
        Self {
            key: SettlementKey::from_location(location),
            location,
            discovered_at,
            discovery_method,
            last_conquered_by: None,
            conquest_count: 0,
        }
    }

    /// Check if the participant was the most recent conqueror
    pub fn was_last_conquered_by(&self, participant: ParticipantId) -> bool {
        self.last_conquered_by == Some(participant)
    }
}
