//! Piecewise interpolation through control points
//!
//! All splines keep their points sorted by `x` and cache the segment of the
//! last lookup, so monotonically increasing queries (the common case while an
//! animation runs) cost O(1) amortized.

use std::cell::Cell;

use crate::curve::{CubicCurve, Curve};
use crate::error::CurveError;

/// Bounding box of a spline's control points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplineLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Sorted control points plus the cached segment index
#[derive(Clone, Debug, Default)]
struct ControlPoints {
    points: Vec<(f64, f64)>,
    current: Cell<usize>,
}

impl ControlPoints {
    fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, CurveError> {
        let mut sorted = Self::default();
        for (x, y) in points {
            sorted.insert(x, y)?;
        }
        Ok(sorted)
    }

    fn insert(&mut self, x: f64, y: f64) -> Result<(), CurveError> {
        let index = self.points.partition_point(|&(px, _)| px < x);
        if self.points.get(index).is_some_and(|&(px, _)| px == x) {
            return Err(CurveError::DuplicateAbscissa);
        }
        self.points.insert(index, (x, y));
        self.current.set(0);
        Ok(())
    }

    /// Index of the point starting the segment containing `x`
    ///
    /// `segments` bounds the result; queries left of the first point return 0.
    fn segment(&self, x: f64, segments: usize) -> usize {
        let mut index = self.current.get();
        if index >= segments || x < self.points[index].0 {
            index = 0;
        }
        while index + 1 < segments && x >= self.points[index + 1].0 {
            index += 1;
        }
        self.current.set(index);
        index
    }

    fn limits(&self) -> Option<SplineLimits> {
        let (&(x_min, _), &(x_max, _)) = (self.points.first()?, self.points.last()?);
        let (y_min, y_max) = self
            .points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
                (lo.min(y), hi.max(y))
            });
        Some(SplineLimits {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Natural cubic spline
// ─────────────────────────────────────────────────────────────────────────────

/// Natural cubic spline (zero curvature at both ends)
///
/// Each segment `i` is a cubic in the local coordinate `x - x_i`. Outside the
/// control points the first/last segment is extrapolated.
#[derive(Clone, Debug, Default)]
pub struct NaturalSpline {
    points: ControlPoints,
    segments: Vec<CubicCurve>,
}

impl NaturalSpline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, CurveError> {
        let mut spline = Self {
            points: ControlPoints::from_points(points)?,
            segments: Vec::new(),
        };
        spline.rebuild();
        Ok(spline)
    }

    /// Insert a control point keeping `x` strictly increasing
    pub fn add_point(&mut self, x: f64, y: f64) -> Result<(), CurveError> {
        self.points.insert(x, y)?;
        self.rebuild();
        Ok(())
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points.points
    }

    /// Number of segments
    pub fn degree(&self) -> usize {
        self.points.points.len().saturating_sub(1)
    }

    pub fn limits(&self) -> Option<SplineLimits> {
        self.points.limits()
    }

    fn rebuild(&mut self) {
        let p = &self.points.points;
        let n = self.degree();
        self.segments.clear();
        if n < 2 {
            return;
        }

        let h: Vec<f64> = p.windows(2).map(|w| w[1].0 - w[0].0).collect();
        let slope = |i: usize| (p[i + 1].1 - p[i].1) / h[i];

        // Second derivatives at every control point, zero at both ends
        let mut f2 = vec![0.0; n + 1];
        if n == 2 {
            let b1 = 3.0 * (slope(1) - slope(0)) / (2.0 * (p[2].0 - p[0].0));
            f2[1] = 2.0 * b1;
        } else {
            // Thomas algorithm over the n - 1 interior unknowns
            let m = n - 1;
            let mut diag: Vec<f64> = (0..m).map(|k| 2.0 * (h[k] + h[k + 1])).collect();
            let mut rhs: Vec<f64> = (0..m).map(|k| 6.0 * (slope(k + 1) - slope(k))).collect();
            for k in 1..m {
                let w = h[k] / diag[k - 1];
                diag[k] -= w * h[k];
                rhs[k] -= w * rhs[k - 1];
            }
            f2[m] = rhs[m - 1] / diag[m - 1];
            for k in (0..m - 1).rev() {
                f2[k + 1] = (rhs[k] - h[k + 1] * f2[k + 2]) / diag[k];
            }
        }

        self.segments = (0..n)
            .map(|i| {
                CubicCurve::new(
                    (f2[i + 1] - f2[i]) / (6.0 * h[i]),
                    f2[i] / 2.0,
                    slope(i) - h[i] / 6.0 * (f2[i + 1] + 2.0 * f2[i]),
                    p[i].1,
                )
            })
            .collect();
    }
}

impl Curve for NaturalSpline {
    fn y(&self, x: f64) -> f64 {
        let p = &self.points.points;
        match self.degree() {
            0 => x,
            1 => {
                let (x1, y1) = p[0];
                let (x2, y2) = p[1];
                y1 + (x - x1) * (y2 - y1) / (x2 - x1)
            }
            n => {
                let i = self.points.segment(x, n);
                self.segments[i].y(x - p[i].0)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Linear / step splines
// ─────────────────────────────────────────────────────────────────────────────

/// Straight lines between control points, flat outside them
#[derive(Clone, Debug, Default)]
pub struct LinearSpline {
    points: ControlPoints,
}

impl LinearSpline {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, CurveError> {
        Ok(Self {
            points: ControlPoints::from_points(points)?,
        })
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> Result<(), CurveError> {
        self.points.insert(x, y)
    }

    pub fn limits(&self) -> Option<SplineLimits> {
        self.points.limits()
    }
}

impl Curve for LinearSpline {
    fn y(&self, x: f64) -> f64 {
        let p = &self.points.points;
        let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) = (p.first(), p.last()) else {
            return 0.0;
        };
        if x < first_x {
            return first_y;
        }
        if x >= last_x {
            return last_y;
        }
        let i = self.points.segment(x, p.len() - 1);
        let (x1, y1) = p[i];
        let (x2, y2) = p[i + 1];
        y1 + (x - x1) * (y2 - y1) / (x2 - x1)
    }
}

/// Holds each control point's value until the next one
#[derive(Clone, Debug, Default)]
pub struct StepSpline {
    points: ControlPoints,
}

impl StepSpline {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, CurveError> {
        Ok(Self {
            points: ControlPoints::from_points(points)?,
        })
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> Result<(), CurveError> {
        self.points.insert(x, y)
    }

    pub fn limits(&self) -> Option<SplineLimits> {
        self.points.limits()
    }
}

impl Curve for StepSpline {
    fn y(&self, x: f64) -> f64 {
        let p = &self.points.points;
        let Some(&(first_x, first_y)) = p.first() else {
            return 0.0;
        };
        if x < first_x {
            return first_y;
        }
        let i = self.points.segment(x, p.len());
        p[i].1
    }
}
