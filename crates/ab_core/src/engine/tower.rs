//! Defensive towers.
//!
//! Each side starts with two guard towers and one king tower. Guards are
//! active from the first tick; the king sleeps until a same-side guard
//! falls or the king itself takes damage, and activation is permanent.

use serde::{Deserialize, Serialize};

use super::constants::towers;
use super::entity::{Combatant, EntityIdAlloc, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    Guard,
    King,
}

#[derive(Debug, Clone)]
pub struct Tower {
    pub combat: Combatant,
    pub kind: TowerKind,
    /// Guards start active; the king starts dormant.
    pub activated: bool,
    pub activation_range: f32,
    /// Set once this tower's destruction has been scored.
    pub crown_awarded: bool,
}

/// What a single application of damage did to the tower.
#[derive(Debug, Clone, Copy, Default)]
pub struct TowerHit {
    pub destroyed: bool,
    /// The hit woke a dormant king.
    pub activated_now: bool,
}

impl Tower {
    pub fn guard(ids: &mut EntityIdAlloc, side: Side, x: f32, y: f32) -> Self {
        Self {
            combat: Combatant::new(
                ids.allocate(),
                side,
                (x, y),
                towers::GUARD_HP,
                towers::GUARD_DAMAGE,
                towers::GUARD_HITS_PER_SEC,
                towers::GUARD_RANGE,
                towers::GUARD_RADIUS,
            ),
            kind: TowerKind::Guard,
            activated: true,
            activation_range: 0.0,
            crown_awarded: false,
        }
    }

    pub fn king(ids: &mut EntityIdAlloc, side: Side, x: f32, y: f32) -> Self {
        Self {
            combat: Combatant::new(
                ids.allocate(),
                side,
                (x, y),
                towers::KING_HP,
                towers::KING_DAMAGE,
                towers::KING_HITS_PER_SEC,
                towers::KING_RANGE,
                towers::KING_RADIUS,
            ),
            kind: TowerKind::King,
            activated: false,
            activation_range: towers::KING_ACTIVATION_RANGE,
            crown_awarded: false,
        }
    }

    /// The standard three-tower lineup for one side: left and right
    /// guards at the lane mouths, king at the back edge.
    pub fn standard_lineup(ids: &mut EntityIdAlloc, side: Side) -> Vec<Tower> {
        let (guard_y, king_y) = if side.is_home() {
            (towers::HOME_GUARD_Y, towers::HOME_KING_Y)
        } else {
            (towers::AWAY_GUARD_Y, towers::AWAY_KING_Y)
        };
        vec![
            Tower::guard(ids, side, towers::GUARD_LEFT_X, guard_y),
            Tower::guard(ids, side, towers::GUARD_RIGHT_X, guard_y),
            Tower::king(ids, side, towers::KING_X, king_y),
        ]
    }

    /// One-way activation; returns `true` only on the waking transition.
    pub fn activate(&mut self) -> bool {
        if self.activated {
            return false;
        }
        self.activated = true;
        true
    }

    /// Apply damage, waking a dormant king before the health change lands.
    pub fn absorb_damage(&mut self, amount: f32) -> TowerHit {
        if !self.combat.alive {
            return TowerHit::default();
        }
        let activated_now = self.kind == TowerKind::King && self.activate();
        let destroyed = self.combat.take_damage(amount);
        TowerHit {
            destroyed,
            activated_now,
        }
    }
}
