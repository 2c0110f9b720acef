//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Integer block coordinate (x, y, z) with y pointing up
pub type BlockPos = glam::IVec3;

/// Scheduler tick counter (simulation time unit)
pub type Tick = u64;

/// Unique identifier for materialized creatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a participant (a player raiding settlements)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable key identifying a settlement record
///
/// Derived from the block position where the settlement was first
/// discovered. Records never move, so the key never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementKey(pub String);

impl SettlementKey {
    pub fn from_location(location: BlockPos) -> Self {
        Self(format!("{}_{}_{}", location.x, location.y, location.z))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of creature to materialize (e.g. "raider", "brute")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureType(pub String);

impl CreatureType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A participant and where they currently stand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub position: BlockPos,
}

impl Participant {
    pub fn new(id: ParticipantId, position: BlockPos) -> Self {
        Self { id, position }
    }
}

/// Distance between two positions ignoring height
pub fn horizontal_distance(a: BlockPos, b: BlockPos) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dz = (a.z - b.z) as f64;
    (dx * dx + dz * dz).sqrt()
}

/// Discrete difficulty level of a settlement raid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Tier {
    Outpost = 0,
    Fortified = 1,
    Stronghold = 2,
    Citadel = 3,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Outpost, Tier::Fortified, Tier::Stronghold, Tier::Citadel];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Tier::Outpost,
            1 => Tier::Fortified,
            2 => Tier::Stronghold,
            _ => Tier::Citadel,
        }
    }

    /// One step harder, saturating at Citadel
    pub fn raised(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Outpost
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_key_from_location() {
        let key = SettlementKey::from_location(BlockPos::new(-12, 64, 300));
        assert_eq!(key.as_str(), "-12_64_300");
        assert_eq!(key, SettlementKey::from_location(BlockPos::new(-12, 64, 300)));
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = BlockPos::new(0, 10, 0);
        let b = BlockPos::new(3, 200, 4);
        assert_eq!(horizontal_distance(a, b), 5.0);
    }

    #[test]
    fn test_tier_raised_saturates() {
        assert_eq!(Tier::Outpost.raised(), Tier::Fortified);
        assert_eq!(Tier::Stronghold.raised(), Tier::Citadel);
        assert_eq!(Tier::Citadel.raised(), Tier::Citadel);
    }

    #[test]
    fn test_tier_ordering() {
        // Citadel > Stronghold > Fortified > Outpost
        assert!(Tier::Citadel > Tier::Stronghold);
        assert!(Tier::Stronghold > Tier::Fortified);
        assert!(Tier::Fortified > Tier::Outpost);
        assert_eq!(Tier::from_index(9), Tier::Citadel);
    }
}
