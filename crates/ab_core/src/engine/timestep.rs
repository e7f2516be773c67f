//! Fixed timestep constants.
//!
//! The battle advances in fixed ticks; presentation layers may call
//! `tick` with a measured frame delta, which is clamped so a stalled
//! host (for example a backgrounded tab) can never trigger a runaway
//! catch-up step.

/// Canonical simulation timestep (60 Hz).
pub const TICK_DT: f32 = 1.0 / 60.0;

/// Upper clamp applied to any externally supplied frame delta.
pub const MAX_TICK_DT: f32 = 0.1;

/// Ticks per simulated second at the canonical rate.
pub const TICKS_PER_SEC: u32 = 60;
