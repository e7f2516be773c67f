//! Battlefield actor primitives.
//!
//! Every unit and tower embeds a [`Combatant`]: the shared mutable combat
//! state (health, cooldown, range, lock-on target). Entities live in
//! per-side collections and refer to each other only through [`EntityId`]
//! lookups, never through owning pointers, so a reference to a removed
//! entity simply resolves to nothing on the next tick.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::geometry::{self, ArenaPos};

/// Stable identifier for a battlefield actor (unit, tower or projectile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Monotonic id source owned by the battle engine.
#[derive(Debug, Default, Clone)]
pub struct EntityIdAlloc {
    next: u32,
}

impl EntityIdAlloc {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Side identifier (home = south half, away = north half).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Side(pub bool);

impl Side {
    pub const HOME: Self = Self(true);
    pub const AWAY: Self = Self(false);

    pub fn is_home(self) -> bool {
        self.0
    }

    pub fn opponent(self) -> Self {
        Self(!self.0)
    }

    /// Collection index used by the engine's `[SideState; 2]` layout.
    pub fn index(self) -> usize {
        usize::from(!self.0)
    }

    pub fn label(self) -> &'static str {
        if self.is_home() {
            "home"
        } else {
            "away"
        }
    }
}

impl Serialize for Side {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "home" => Ok(Side::HOME),
            "away" => Ok(Side::AWAY),
            other => Err(serde::de::Error::custom(format!("unknown side: {other}"))),
        }
    }
}

/// Shared combat state embedded in every unit and tower.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: EntityId,
    pub side: Side,
    pub pos: ArenaPos,
    pub hp: f32,
    pub max_hp: f32,
    pub damage: f32,
    pub hits_per_sec: f32,
    pub range: f32,
    /// Collision radius; range is measured to the target's surface.
    pub radius: f32,
    pub alive: bool,
    pub active: bool,
    /// Battle-clock timestamp of the last attack. `None` means never
    /// attacked, which leaves the first attack ungated.
    pub last_attack_at: Option<f32>,
    /// Lock-on target, held until it dies or deactivates.
    pub target: Option<EntityId>,
}

impl Combatant {
    pub fn new(
        id: EntityId,
        side: Side,
        pos: ArenaPos,
        hp: f32,
        damage: f32,
        hits_per_sec: f32,
        range: f32,
        radius: f32,
    ) -> Self {
        Self {
            id,
            side,
            pos,
            hp,
            max_hp: hp,
            damage,
            hits_per_sec,
            range,
            radius,
            alive: true,
            active: true,
            last_attack_at: None,
            target: None,
        }
    }

    /// Apply damage, clamping health at zero.
    ///
    /// Returns `true` only on the call that crosses the death threshold;
    /// further calls on a dead combatant are no-ops. Death is one-way.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.alive = false;
            self.active = false;
            return true;
        }
        false
    }

    /// Seconds between attacks.
    pub fn attack_cooldown(&self) -> f32 {
        1.0 / self.hits_per_sec
    }

    /// Has the attack cooldown elapsed at battle time `now`?
    pub fn can_attack(&self, now: f32) -> bool {
        match self.last_attack_at {
            None => true,
            Some(last) => now - last >= self.attack_cooldown(),
        }
    }

    pub fn distance_to(&self, other: &Combatant) -> f32 {
        geometry::distance(self.pos, other.pos)
    }

    /// Range check measured center-to-surface: own range plus the target's
    /// collision radius.
    pub fn in_range(&self, other: &Combatant) -> bool {
        self.distance_to(other) <= self.range + other.radius
    }

    pub fn is_enemy(&self, other: &Combatant) -> bool {
        self.side != other.side
    }
}
