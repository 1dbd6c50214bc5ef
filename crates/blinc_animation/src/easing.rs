//! Easing / timing functions for animations
//!
//! A timing function maps linear progress `0..1` to eased progress `0..1`.
//! The CSS-style presets are cubic Béziers through `(0, 0)` and `(1, 1)`,
//! solved numerically with [`CurveApproacher`].

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::curve::{CubicBezierCurve, CubicCurve, Curve, CurveApproacher};

/// Precision of the Bézier x-inversion
const TIME_EPSILON: f64 = 1e-3;

/// Inner control points of a timing Bézier
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoints {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ControlPoints {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub const EASE_IN: ControlPoints = ControlPoints::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: ControlPoints = ControlPoints::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: ControlPoints = ControlPoints::new(0.42, 0.0, 0.58, 1.0);
}

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    /// Jumps from 0 to 1 at half time
    Toggle,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicBezier(ControlPoints),
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    ///
    /// Custom curves are prepared on every call; hold a [`TimingFunction`]
    /// when evaluating the same easing per frame.
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::Toggle => TimingFunction::Toggle.normalized_value(t),
            Easing::CubicBezier(points) => CubicBezierTiming::new(*points).time(t),
            preset => match standard_timing_function(*preset) {
                Some(timing) => timing.time(t),
                None => t,
            },
        }
    }

    /// Bézier control points, `None` for linear and toggle timing
    pub fn control_points(&self) -> Option<ControlPoints> {
        match self {
            Easing::Linear | Easing::Toggle => None,
            Easing::EaseIn => Some(ControlPoints::EASE_IN),
            Easing::EaseOut => Some(ControlPoints::EASE_OUT),
            Easing::EaseInOut => Some(ControlPoints::EASE_IN_OUT),
            Easing::CubicBezier(points) => Some(*points),
        }
    }
}

/// Cubic Bézier timing function through `(0, 0)` and `(1, 1)`
#[derive(Clone, Debug, PartialEq)]
pub struct CubicBezierTiming {
    points: ControlPoints,
    bezier_x: CubicBezierCurve,
    bezier_y: CubicBezierCurve,
    derivative_x: CubicCurve,
}

impl CubicBezierTiming {
    pub fn new(points: ControlPoints) -> Self {
        let mut timing = Self {
            points,
            bezier_x: CubicBezierCurve::default(),
            bezier_y: CubicBezierCurve::default(),
            derivative_x: CubicCurve::default(),
        };
        timing.set_control_points(points);
        timing
    }

    pub fn control_points(&self) -> ControlPoints {
        self.points
    }

    pub fn set_control_points(&mut self, points: ControlPoints) {
        self.points = points;
        self.bezier_x.assign(0.0, points.x1, points.x2, 1.0);
        self.bezier_y.assign(0.0, points.y1, points.y2, 1.0);
        self.derivative_x = self.bezier_x.derivative();
    }

    /// Rebuild from a preset; linear and toggle timing map to the identity curve
    pub fn set_easing(&mut self, easing: Easing) {
        let points = easing
            .control_points()
            .unwrap_or(ControlPoints::new(0.0, 0.0, 1.0, 1.0));
        self.set_control_points(points);
    }

    /// Eased progress at linear progress `x`
    pub fn time(&self, x: f64) -> f64 {
        let approacher = CurveApproacher::new(&self.bezier_x, &self.derivative_x, 0.0, 1.0);
        let t = approacher.x(x, TIME_EPSILON);
        self.bezier_y.y(t)
    }
}

/// Shared timing function for one of the standard presets
///
/// Returns `None` for linear, toggle and custom Bézier timing.
pub fn standard_timing_function(easing: Easing) -> Option<&'static CubicBezierTiming> {
    static EASE_IN: OnceLock<CubicBezierTiming> = OnceLock::new();
    static EASE_OUT: OnceLock<CubicBezierTiming> = OnceLock::new();
    static EASE_IN_OUT: OnceLock<CubicBezierTiming> = OnceLock::new();

    let (cell, points) = match easing {
        Easing::EaseIn => (&EASE_IN, ControlPoints::EASE_IN),
        Easing::EaseOut => (&EASE_OUT, ControlPoints::EASE_OUT),
        Easing::EaseInOut => (&EASE_IN_OUT, ControlPoints::EASE_IN_OUT),
        _ => return None,
    };
    Some(cell.get_or_init(|| CubicBezierTiming::new(points)))
}

/// An [`Easing`] with its curves prepared for repeated evaluation
#[derive(Clone, Debug)]
pub enum TimingFunction {
    Linear,
    Toggle,
    Standard(&'static CubicBezierTiming),
    Custom(Box<CubicBezierTiming>),
}

impl TimingFunction {
    pub fn normalized_value(&self, x: f64) -> f64 {
        match self {
            TimingFunction::Linear => x,
            TimingFunction::Toggle => {
                if x < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            TimingFunction::Standard(timing) => timing.time(x),
            TimingFunction::Custom(timing) => timing.time(x),
        }
    }
}

impl From<Easing> for TimingFunction {
    fn from(easing: Easing) -> Self {
        match easing {
            Easing::Linear => TimingFunction::Linear,
            Easing::Toggle => TimingFunction::Toggle,
            Easing::CubicBezier(points) => {
                TimingFunction::Custom(Box::new(CubicBezierTiming::new(points)))
            }
            preset => match standard_timing_function(preset) {
                Some(timing) => TimingFunction::Standard(timing),
                None => TimingFunction::Linear,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_and_toggle() {
        assert_eq!(Easing::Linear.apply(0.3), 0.3);
        assert_eq!(Easing::Toggle.apply(0.49), 0.0);
        assert_eq!(Easing::Toggle.apply(0.5), 1.0);
    }

    #[test]
    fn test_identity_bezier_is_linear() {
        let timing = CubicBezierTiming::new(ControlPoints::new(0.0, 0.0, 1.0, 1.0));
        for i in 0..=100 {
            let x = i as f64 / 100.0;
            assert!((timing.time(x) - x).abs() < 1e-3, "time({x}) = {}", timing.time(x));
        }
    }

    #[test]
    fn test_presets_hit_endpoints_and_are_monotonic() {
        for easing in [Easing::EaseIn, Easing::EaseOut, Easing::EaseInOut] {
            let timing = standard_timing_function(easing).unwrap();
            assert!(timing.time(0.0).abs() < 1e-9);
            assert!((timing.time(1.0) - 1.0).abs() < 1e-9);

            let mut previous = 0.0;
            for i in 1..=100 {
                let value = timing.time(i as f64 / 100.0);
                assert!(value >= previous - 2e-3, "{easing:?} decreases at {i}");
                previous = value;
            }
        }
    }

    #[test]
    fn test_presets_are_shared() {
        let a = standard_timing_function(Easing::EaseOut).unwrap();
        let b = standard_timing_function(Easing::EaseOut).unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(standard_timing_function(Easing::Linear).is_none());
    }

    #[test]
    fn test_ease_in_starts_slow() {
        assert!(Easing::EaseIn.apply(0.25) < 0.25);
        assert!(Easing::EaseOut.apply(0.25) > 0.25);
    }

    #[test]
    fn test_apply_matches_prepared_timing() {
        let easings = [
            Easing::Toggle,
            Easing::EaseInOut,
            Easing::CubicBezier(ControlPoints::new(0.0, 0.0, 0.58, 0.8)),
        ];
        for easing in easings {
            let timing = TimingFunction::from(easing);
            for x in [0.1, 0.5, 0.9] {
                assert_eq!(easing.apply(x), timing.normalized_value(x), "{easing:?} at {x}");
            }
        }
    }

    #[test]
    fn test_set_easing_rebuilds_curves() {
        let mut timing = CubicBezierTiming::new(ControlPoints::EASE_IN);
        timing.set_easing(Easing::EaseOut);
        assert_eq!(timing.control_points(), ControlPoints::EASE_OUT);
        let preset = standard_timing_function(Easing::EaseOut).unwrap();
        assert_eq!(timing.time(0.3), preset.time(0.3));
    }
}
