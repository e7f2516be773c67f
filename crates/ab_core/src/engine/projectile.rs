//! Projectile flight and impact.
//!
//! A projectile tracks a moving target: the destination is re-sampled
//! from the live target every tick, so it follows the victim rather than
//! flying at a stale point. Tower bolts carry a damage payload that lands
//! on impact; unit bolts are presentation echoes with no payload, since
//! their damage was already applied at attack time.

use super::constants::projectile as tuning;
use super::entity::{EntityId, Side};
use super::geometry::{self, ArenaPos};

/// Outcome of advancing a projectile by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileStep {
    InFlight,
    /// Reached the target point this tick.
    Impact,
    /// Left the arena without impacting; no damage.
    OutOfBounds,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    /// Side that fired it.
    pub side: Side,
    pub pos: ArenaPos,
    pub speed: f32,
    pub target: EntityId,
    /// Last known target position; refreshed while the target lives.
    pub dest: ArenaPos,
    /// Damage applied on impact; `None` marks a visual echo.
    pub payload: Option<f32>,
    pub active: bool,
}

impl Projectile {
    /// Damage-carrying bolt (tower fire).
    pub fn bolt(
        id: EntityId,
        side: Side,
        from: ArenaPos,
        target: EntityId,
        target_pos: ArenaPos,
        damage: f32,
    ) -> Self {
        Self {
            id,
            side,
            pos: from,
            speed: tuning::SPEED,
            target,
            dest: target_pos,
            payload: Some(damage),
            active: true,
        }
    }

    /// Payload-free echo of an already-resolved ranged attack.
    pub fn echo(id: EntityId, side: Side, from: ArenaPos, target: EntityId, target_pos: ArenaPos) -> Self {
        Self {
            id,
            side,
            pos: from,
            speed: tuning::SPEED,
            target,
            dest: target_pos,
            payload: None,
            active: true,
        }
    }

    /// Advance one tick toward the (possibly refreshed) destination.
    ///
    /// Deactivates on impact or on leaving the arena; the caller applies
    /// the payload, since only it can resolve the target id.
    pub fn advance(&mut self, live_target: Option<ArenaPos>, dt: f32) -> ProjectileStep {
        if !self.active {
            return ProjectileStep::OutOfBounds;
        }
        if let Some(pos) = live_target {
            self.dest = pos;
        }

        let remaining = geometry::distance(self.pos, self.dest);
        let travel = self.speed * dt;
        if remaining < travel + tuning::HIT_EPSILON {
            self.active = false;
            return ProjectileStep::Impact;
        }

        let dir = geometry::direction(self.pos, self.dest);
        self.pos.0 += dir.0 * travel;
        self.pos.1 += dir.1 * travel;

        use super::constants::arena;
        if self.pos.0 < 0.0 || self.pos.0 > arena::WIDTH || self.pos.1 < 0.0 || self.pos.1 > arena::HEIGHT
        {
            self.active = false;
            return ProjectileStep::OutOfBounds;
        }
        ProjectileStep::InFlight
    }
}
