//! Kinematic integration primitives.
//!
//! All functions are pure and clamp to the target instead of overshooting when the
//! remaining delta is smaller than one tick's maximum change.

use crate::geo;
use crate::types::{ Position, TurnDirection };

/// Normalize a heading into [0, 360).
pub fn normalize_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360.0 { 0.0 } else { h }
}

/// Signed shortest angular difference `to - from`, in [-180, 180).
pub fn heading_difference(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Converge `current` toward `target` at `accel` knots per second.
pub fn update_speed(current: f64, target: f64, accel: f64, dt: f64) -> f64 {
    converge(current, target, accel.abs() * dt)
}

/// Converge `current` toward `target` at `rate_fpm` feet per minute.
pub fn update_altitude(current: f64, target: f64, rate_fpm: f64, dt: f64) -> f64 {
    converge(current, target, rate_fpm.abs() / 60.0 * dt)
}

/// Converge `current` toward `target` at `turn_rate` degrees per second along the shorter arc.
pub fn update_heading(current: f64, target: f64, turn_rate: f64, dt: f64) -> f64 {
    turn_toward(current, target, turn_rate, dt, TurnDirection::Auto)
}

/// Heading convergence honoring a forced turn direction.
///
/// Never changes the heading by more than `turn_rate * dt` and never passes the target.
pub fn turn_toward(
    current: f64,
    target: f64,
    turn_rate: f64,
    dt: f64,
    direction: TurnDirection,
) -> f64 {
    let max_step = turn_rate.abs() * dt;
    let current = normalize_heading(current);
    let target = normalize_heading(target);

    let delta = match direction {
        TurnDirection::Auto => heading_difference(current, target),
        TurnDirection::Right => (target - current).rem_euclid(360.0),
        TurnDirection::Left => -(current - target).rem_euclid(360.0),
    };

    if delta.abs() <= max_step {
        target
    } else {
        normalize_heading(current + max_step.copysign(delta))
    }
}

/// Great-circle position update for `dt` seconds at `speed_kt` ground speed along `heading`.
pub fn update_position(position: Position, heading: f64, speed_kt: f64, dt: f64) -> Position {
    if speed_kt <= 0.0 || dt <= 0.0 {
        return position;
    }
    geo::destination(position, heading, speed_kt * dt / 3600.0)
}

fn converge(current: f64, target: f64, max_step: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(delta)
    }
}
