//! Presentation read contract.
//!
//! A [`BattleSnapshot`] is an owned, serializable copy of everything a
//! renderer or UI needs for one frame: entity positions and health,
//! economy, clock and crowns. Because the simulation is single-threaded
//! and snapshots are taken between ticks, a snapshot is always
//! self-consistent. The opponent agent reads the same structure — it
//! sees exactly what a human player's screen would show.

use serde::{Deserialize, Serialize};

use crate::data::CardId;

use super::entity::{EntityId, Side};
use super::events::Outcome;
use super::geometry;
use super::tower::TowerKind;
use super::unit::UnitState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: EntityId,
    pub card: CardId,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub state: UnitState,
    pub charging: bool,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerView {
    pub id: EntityId,
    pub kind: TowerKind,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub alive: bool,
    pub activated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub side: Side,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSnapshot {
    pub side: Side,
    pub elixir: f32,
    pub crowns: u8,
    pub hand: Vec<CardId>,
    pub next_card: CardId,
    pub units: Vec<UnitView>,
    pub towers: Vec<TowerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub elapsed: f32,
    pub time_remaining: f32,
    pub overtime: bool,
    pub paused: bool,
    pub finished: bool,
    pub winner: Outcome,
    /// Indexed as `[home, away]`.
    pub sides: [SideSnapshot; 2],
    pub projectiles: Vec<ProjectileView>,
}

impl BattleSnapshot {
    pub fn side(&self, side: Side) -> &SideSnapshot {
        &self.sides[side.index()]
    }

    /// Remaining time formatted for a clock display.
    pub fn clock_label(&self) -> String {
        geometry::format_clock(self.time_remaining)
    }
}
