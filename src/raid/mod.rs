//! Raid lifecycle: tier tables, per-settlement state, and the orchestrator

pub mod orchestrator;
pub mod state;
pub mod tiers;

pub use orchestrator::{RaidOrchestrator, ScanReport};
pub use state::{RaidPhase, RaidState};
pub use tiers::{CountRange, DefenderEntry, TierTable};
