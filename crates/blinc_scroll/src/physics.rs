//! Velocity and distance math shared by the gesture and wheel paths
//!
//! Velocities are in points per second, times in milliseconds, and positions
//! in whole points.

use blinc_animation::ControlPoints;

/// Cap applied to drag deltas before boosting a gesture release
pub const GESTURE_VELOCITY_BOUND: f32 = 300.0;

/// Fraction of the boosted delta used as roll-out velocity
pub const ROLL_OUT_FACTOR: f32 = 0.34;

/// Roll-out fraction under Shift ("fine scroll")
pub const FINE_ROLL_OUT_FACTOR: f32 = 0.1;

fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Fold a new delta into an exponential moving average velocity
///
/// The result carries the sign of the new delta. Returns `false` (leaving
/// `pps` untouched) when `delta` is zero.
pub fn average_velocity(pps: &mut f32, delta: f32, elapsed_ms: f64) -> bool {
    if delta == 0.0 || elapsed_ms <= 0.0 {
        return false;
    }
    let current = (delta.abs() as f64 / elapsed_ms * 1000.0) as f32;
    *pps = (0.6 * current + 0.4 * pps.abs()) * sign(delta);
    true
}

/// Extra travel for fast movements over large ranges
pub fn boosted_delta(delta: f32, pps: f32, max_range: i32) -> f32 {
    let range_factor = (max_range / 100) as f32;
    let curve_factor = pps.abs().min(1000.0) / 1000.0;
    let boost = range_factor * curve_factor.powf(range_factor / 2.0) * 2.0;
    delta + delta * boost
}

/// Scale a velocity into the useful range of roll-out animations
///
/// Slow movements are amplified up to five times; the result never exceeds
/// `max_pps` in magnitude.
pub fn bounded_velocity(velocity: f32, max_pps: f32) -> f32 {
    let velocity = velocity.clamp(-max_pps, max_pps);
    let magnitude = velocity.clamp(-15.0, 15.0).abs();
    let factor = (25.0 - magnitude.max(10.0)) / 15.0 * 5.0;
    (velocity * factor).clamp(-max_pps, max_pps)
}

/// Glide distance for a release velocity: `sign(v) * round((v / 10)^2)`
pub fn roll_out_distance(velocity: f32) -> i32 {
    let scaled = velocity / 10.0;
    sign(velocity) as i32 * (scaled * scaled).round() as i32
}

/// Seconds to cover `distance` when starting at `velocity` and decelerating
/// to rest; one second for a zero velocity
pub fn animation_duration(distance: i64, velocity: f32) -> f64 {
    if velocity == 0.0 {
        return 1.0;
    }
    distance.unsigned_abs() as f64 / (2.0 * velocity as f64).abs()
}

/// Ease-out control points ending with `slope` (0 = at rest, 1 = full speed)
pub fn ease_out_points(slope: f32) -> ControlPoints {
    let y2 = (1.0 - slope.clamp(0.0, 1.0) as f64) * 0.42 + 0.58;
    ControlPoints::new(0.0, 0.0, 0.58, y2)
}

/// Part of the velocity left when a glide from `start` to `end` leaves
/// `[min, max]`; zero when `end` is inside
///
/// Takes `i64` so glides far beyond the `i32` position range stay exact.
pub fn exit_slope(start: i64, end: i64, min: i64, max: i64) -> f32 {
    let (desired, available) = if end > max {
        (end - start, max - start)
    } else if end < min {
        (start - end, start - min)
    } else {
        return 0.0;
    };
    if desired == 0 {
        return 0.0;
    }
    1.0 - available as f32 / desired as f32
}

/// Roll-out velocity of a released gesture
///
/// `delta` is the last movement, `pps` the averaged velocity and `boost_range`
/// the cap of the result. The sign is flipped so a drag towards the start
/// glides towards the end.
pub fn release_velocity(delta: f32, pps: f32, boost_range: i32, fine: bool) -> f32 {
    let boosted = boosted_delta(
        bounded_velocity(delta, GESTURE_VELOCITY_BOUND),
        pps,
        boost_range,
    );
    let factor = if fine { FINE_ROLL_OUT_FACTOR } else { ROLL_OUT_FACTOR };
    let mut velocity = boosted * factor;
    // never zero
    velocity += if boosted < 0.0 { -1.0 } else { 1.0 };
    let bound = boost_range as f32;
    (-velocity).clamp(-bound, bound)
}
