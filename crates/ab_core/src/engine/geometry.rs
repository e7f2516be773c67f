//! Arena geometry and spatial predicates.
//!
//! Positions are plain `(x, y)` tuples in arena units. The y axis grows
//! southward: the away side holds the top of the arena, the home side the
//! bottom, and the river band separates the two halves.

use super::constants::arena;

/// Position in arena units.
pub type ArenaPos = (f32, f32);

/// Euclidean distance between two points.
pub fn distance(a: ArenaPos, b: ArenaPos) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

/// Unit-length direction from `from` to `to`; zero when the points coincide.
pub fn direction(from: ArenaPos, to: ArenaPos) -> ArenaPos {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON {
        (0.0, 0.0)
    } else {
        (dx / len, dy / len)
    }
}

/// Clamp a position into the arena, keeping `margin` away from every edge.
pub fn clamp_to_arena(pos: ArenaPos, margin: f32) -> ArenaPos {
    (
        pos.0.clamp(margin, arena::WIDTH - margin),
        pos.1.clamp(margin, arena::HEIGHT - margin),
    )
}

/// Is this y coordinate inside the river band?
pub fn in_river_band(y: f32) -> bool {
    let half = arena::RIVER_HEIGHT / 2.0;
    y >= arena::RIVER_Y - half && y <= arena::RIVER_Y + half
}

/// Is this position on one of the two bridges?
///
/// Only meaningful inside the river band; positions outside the band are
/// never "on" a bridge.
pub fn on_bridge(pos: ArenaPos) -> bool {
    if !in_river_band(pos.1) {
        return false;
    }
    let half = arena::BRIDGE_WIDTH / 2.0;
    (pos.0 - arena::LEFT_BRIDGE_X).abs() < half || (pos.0 - arena::RIGHT_BRIDGE_X).abs() < half
}

/// Center of the bridge closest to `pos`.
pub fn nearest_bridge(pos: ArenaPos) -> ArenaPos {
    let x = if (pos.0 - arena::LEFT_BRIDGE_X).abs() < (pos.0 - arena::RIGHT_BRIDGE_X).abs() {
        arena::LEFT_BRIDGE_X
    } else {
        arena::RIGHT_BRIDGE_X
    };
    (x, arena::RIVER_Y)
}

/// Is `pos` inside the deploy band of the given side?
pub fn in_spawn_zone(is_home: bool, pos: ArenaPos) -> bool {
    let (min_y, max_y) = if is_home {
        (arena::HOME_SPAWN_MIN_Y, arena::HOME_SPAWN_MAX_Y)
    } else {
        (arena::AWAY_SPAWN_MIN_Y, arena::AWAY_SPAWN_MAX_Y)
    };
    pos.1 >= min_y
        && pos.1 <= max_y
        && pos.0 >= arena::EDGE_MARGIN
        && pos.0 <= arena::WIDTH - arena::EDGE_MARGIN
}

/// Lane index from an x coordinate (0 = left, 1 = right).
pub fn lane_of(x: f32) -> usize {
    usize::from(x >= arena::WIDTH / 2.0)
}

/// Center x of a lane.
pub fn lane_center(lane: usize) -> f32 {
    if lane == 0 {
        arena::LEFT_BRIDGE_X
    } else {
        arena::RIGHT_BRIDGE_X
    }
}

/// Format a number of seconds as `M:SS` for presentation surfaces.
pub fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0) as u32;
    format!("{}:{:02}", total / 60, total % 60)
}
