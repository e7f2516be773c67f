//! Deployed units.
//!
//! A unit is a [`Combatant`] plus the card-derived behavior that drives
//! its per-tick state machine: seeking → moving → attacking, with an
//! optional charging overlay for cards that carry a charge rider.

use serde::{Deserialize, Serialize};

use crate::data::{AttackMode, CardId, ChargeSpec, SplashSpec, TargetDomain, TargetFilter, UnitStats};

use super::entity::{Combatant, EntityId, Side};
use super::geometry::ArenaPos;

/// Behavioral state, re-derived every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// No live target; advancing toward the opposing territory.
    Seeking,
    /// Target locked, closing distance.
    Moving,
    /// Target locked and in range.
    Attacking,
    /// Closing distance at charge speed.
    Charging,
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub combat: Combatant,
    /// Card this unit was spawned from.
    pub card: CardId,
    pub attack: AttackMode,
    pub target_domain: TargetDomain,
    pub target_filter: TargetFilter,
    pub move_speed: f32,
    pub splash: Option<SplashSpec>,
    pub charge: Option<ChargeSpec>,
    pub crosses_river: bool,
    pub state: UnitState,
    /// Charge overlay: armed once the charged target enters the trigger
    /// window, spent on the first hit against that target.
    pub charging: bool,
    pub charge_target: Option<EntityId>,
    /// Last acquisition attempt, throttled while the unit is unlocked.
    pub last_retarget_at: Option<f32>,
    /// Set once the dead unit has been observable for a full tick;
    /// pruning removes it on the following sweep.
    pub reaped: bool,
}

impl Unit {
    pub fn from_card(
        id: EntityId,
        side: Side,
        pos: ArenaPos,
        card: &str,
        stats: &UnitStats,
    ) -> Self {
        Self {
            combat: Combatant::new(
                id,
                side,
                pos,
                stats.hp,
                stats.damage,
                stats.hits_per_sec,
                stats.range,
                stats.radius,
            ),
            card: card.to_string(),
            attack: stats.attack,
            target_domain: stats.target_domain,
            target_filter: stats.target_filter,
            move_speed: stats.move_speed,
            splash: stats.splash,
            charge: stats.charge,
            crosses_river: stats.crosses_river,
            state: UnitState::Seeking,
            charging: false,
            charge_target: None,
            last_retarget_at: None,
            reaped: false,
        }
    }

    /// Movement speed for this tick; the charge rider overrides the base
    /// speed while the charge is armed.
    pub fn current_speed(&self) -> f32 {
        match (self.charging, self.charge) {
            (true, Some(charge)) => charge.speed,
            _ => self.move_speed,
        }
    }

    pub fn begin_charge(&mut self, target: EntityId) {
        self.charging = true;
        self.charge_target = Some(target);
    }

    pub fn end_charge(&mut self) {
        self.charging = false;
        self.charge_target = None;
    }

    /// Damage dealt by the next landed hit against `target`.
    ///
    /// An armed charge against its original target multiplies the base
    /// damage and is spent in the process; any other hit is unmodified.
    pub fn strike_damage(&mut self, target: EntityId) -> f32 {
        let mut damage = self.combat.damage;
        if self.charging && self.charge_target == Some(target) {
            if let Some(charge) = self.charge {
                damage *= charge.damage_multiplier;
            }
            self.end_charge();
        }
        damage
    }
}
