//! Settlement Raids - discovery, difficulty and defence of raidable landmarks

pub mod core;
pub mod difficulty;
pub mod geometry;
pub mod placement;
pub mod raid;
pub mod services;
pub mod settlements;
pub mod terrain;
pub mod world;
