//! # ab_core - Deterministic Arena Battle Simulation Engine
//!
//! Real-time 1v1 arena battler core: two sides deploy units from a
//! cycling hand of cards, units path toward the opposing towers across a
//! bridged river, combat resolves under lock-on targeting with splash
//! and charge riders, and the match ends on king destruction or timeout.
//!
//! ## Features
//! - 100% deterministic simulation (same plan = same battle)
//! - Fixed-tick battle loop with a stall-proof frame clamp
//! - Owned, serializable snapshots for presentation layers
//! - Scripted opponent agent playing through the public deploy API
//! - JSON API for easy integration with game shells and tooling

pub mod api;
pub mod data;
pub mod engine;
pub mod error;

// Re-export the main API surface
pub use api::{simulate_battle, simulate_battle_json, BattleRequest, BattleResponse};
pub use data::{catalog, CardCatalog, CardDefinition, CardId};
pub use engine::{
    BattleEngine, BattleEvent, BattlePlan, BattleResult, BattleSnapshot, Difficulty, EntityId,
    Outcome, Side,
};
pub use error::{BattleError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
