pub mod config;
pub mod error;
pub mod types;

pub use config::{DifficultyStrategy, RaidConfig};
pub use error::{RaidError, Result};
pub use types::{
    horizontal_distance, BlockPos, CreatureType, EntityId, Participant, ParticipantId, SettlementKey,
    Tick, Tier,
};
