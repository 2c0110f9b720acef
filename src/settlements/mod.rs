//! Settlement registry: discovery, clustering, persistence

pub mod cache;
pub mod grid;
pub mod record;
pub mod store;

pub use cache::{AddOutcome, SettlementCache};
pub use grid::SettlementGrid;
pub use record::{DiscoveryMethod, SettlementRecord};
pub use store::{FileStore, KeyValueStore, MemoryStore, SETTLEMENTS_KEY};
