//! Battle tuning constants.
//!
//! Grouped by concern; all distances are in arena units (the arena is
//! 360x640), all times in seconds, all rates per second.

/// Arena layout: two territories separated by a river band with two bridges.
pub mod arena {
    pub const WIDTH: f32 = 360.0;
    pub const HEIGHT: f32 = 640.0;

    /// Center line of the river band.
    pub const RIVER_Y: f32 = 320.0;
    /// Full height of the river band.
    pub const RIVER_HEIGHT: f32 = 40.0;

    /// Bridge centers sit at 1/4 and 3/4 of the arena width.
    pub const LEFT_BRIDGE_X: f32 = WIDTH * 0.25;
    pub const RIGHT_BRIDGE_X: f32 = WIDTH * 0.75;
    pub const BRIDGE_WIDTH: f32 = 65.0;

    /// Side margin applied to deploy zones.
    pub const EDGE_MARGIN: f32 = 20.0;

    /// Deploy band for the home (south) side.
    pub const HOME_SPAWN_MIN_Y: f32 = 400.0;
    pub const HOME_SPAWN_MAX_Y: f32 = 600.0;

    /// Deploy band for the away (north) side.
    pub const AWAY_SPAWN_MIN_Y: f32 = 40.0;
    pub const AWAY_SPAWN_MAX_Y: f32 = 240.0;
}

/// Tower placement and combat stats.
pub mod towers {
    pub const GUARD_LEFT_X: f32 = 72.0;
    pub const GUARD_RIGHT_X: f32 = 288.0;
    pub const KING_X: f32 = 180.0;

    pub const HOME_GUARD_Y: f32 = 520.0;
    pub const HOME_KING_Y: f32 = 590.0;
    pub const AWAY_GUARD_Y: f32 = 120.0;
    pub const AWAY_KING_Y: f32 = 50.0;

    pub const GUARD_HP: f32 = 1400.0;
    pub const GUARD_DAMAGE: f32 = 90.0;
    pub const GUARD_HITS_PER_SEC: f32 = 0.8;
    pub const GUARD_RANGE: f32 = 120.0;
    pub const GUARD_RADIUS: f32 = 35.0;

    pub const KING_HP: f32 = 2400.0;
    pub const KING_DAMAGE: f32 = 110.0;
    pub const KING_HITS_PER_SEC: f32 = 1.0;
    pub const KING_RANGE: f32 = 130.0;
    pub const KING_RADIUS: f32 = 45.0;
    /// Radius inside which a waking king scans for hostiles.
    pub const KING_ACTIVATION_RANGE: f32 = 150.0;
}

/// Elixir economy.
pub mod elixir {
    pub const MAX: f32 = 10.0;
    pub const START: f32 = 5.0;
    pub const REGEN_PER_SEC: f32 = 2.0;
    /// Regeneration during overtime (2x the base rate).
    pub const OVERTIME_REGEN_PER_SEC: f32 = 4.0;
}

/// Battle clock.
pub mod timer {
    pub const BATTLE_DURATION_SEC: f32 = 180.0;
    pub const OVERTIME_DURATION_SEC: f32 = 60.0;
}

/// Unit behavior tuning.
pub mod gameplay {
    /// Radius inside which a unit aggroes onto enemy units.
    pub const AGGRO_RANGE: f32 = 150.0;
    /// Minimum delay between target acquisition attempts while unlocked.
    pub const RETARGET_COOLDOWN_SEC: f32 = 0.5;
    /// Fraction of the overlap depth applied per tick when separating units.
    pub const COLLISION_PUSH_FORCE: f32 = 0.5;
    /// Units stop advancing once this close to a waypoint.
    pub const ARRIVAL_EPSILON: f32 = 5.0;
    /// Splash victims take this fraction of the primary hit.
    pub const SPLASH_FALLOFF: f32 = 0.5;
    pub const CROWN_CAP: u8 = 3;
}

/// Projectile flight.
pub mod projectile {
    pub const SPEED: f32 = 400.0;
    /// Impact is resolved once the target is within one tick of travel
    /// plus this slack.
    pub const HIT_EPSILON: f32 = 5.0;
}

/// Trophy deltas reported with the battle result.
pub mod trophies {
    pub const WIN: i32 = 30;
    pub const LOSS: i32 = -20;
    pub const DRAW: i32 = 0;
    pub const THREE_CROWN_BONUS: i32 = 10;
}
