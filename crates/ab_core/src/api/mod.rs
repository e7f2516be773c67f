//! External JSON API surface.

pub mod battle_json;

pub use battle_json::{simulate_battle, simulate_battle_json, BattleRequest, BattleResponse};
