//! Scalar curves
//!
//! Pure `y = f(x)` functions used to shape motion and to invert parametric
//! curves. All math is done in `f64`; fitting functions return a
//! [`CurveError`] for degenerate input and leave the curve untouched.

use crate::error::CurveError;

/// A scalar function `y = f(x)`
pub trait Curve {
    /// Evaluate the curve at `x`
    fn y(&self, x: f64) -> f64;
}

impl<F> Curve for F
where
    F: Fn(f64) -> f64,
{
    fn y(&self, x: f64) -> f64 {
        self(x)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Linear
// ─────────────────────────────────────────────────────────────────────────────

/// `y = k·x + d`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearCurve {
    pub k: f64,
    pub d: f64,
}

impl Default for LinearCurve {
    fn default() -> Self {
        Self { k: 1.0, d: 0.0 }
    }
}

impl LinearCurve {
    pub const fn new(k: f64, d: f64) -> Self {
        Self { k, d }
    }

    /// Line through two points
    pub fn through(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, CurveError> {
        let mut curve = Self::default();
        curve.set_points(x1, y1, x2, y2)?;
        Ok(curve)
    }

    pub fn set_points(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), CurveError> {
        if x1 == x2 {
            return Err(CurveError::CoincidentAbscissae);
        }
        let k = (y2 - y1) / (x2 - x1);
        self.k = k;
        self.d = y1 - k * x1;
        Ok(())
    }
}

impl Curve for LinearCurve {
    fn y(&self, x: f64) -> f64 {
        self.k * x + self.d
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logarithmic / exponential
// ─────────────────────────────────────────────────────────────────────────────

/// `y = k·ln(m·x + c) + d`
///
/// `k` and `m` shape the curve; `c` and `d` are solved by [`set_points`].
///
/// [`set_points`]: LogarithmicCurve::set_points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogarithmicCurve {
    pub k: f64,
    pub m: f64,
    pub c: f64,
    pub d: f64,
}

impl LogarithmicCurve {
    pub const fn new(k: f64, m: f64) -> Self {
        Self { k, m, c: 1.0, d: 0.0 }
    }

    pub fn set_points(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), CurveError> {
        if x1 == x2 {
            return Err(CurveError::CoincidentAbscissae);
        }
        if y1 == y2 {
            return Err(CurveError::CoincidentOrdinates);
        }
        if self.k == 0.0 || self.m == 0.0 {
            return Err(CurveError::ZeroScale);
        }

        // (m·x2 + c) = helper · (m·x1 + c)
        let helper = ((y2 - y1) / self.k).exp();
        if !helper.is_finite() || helper == 1.0 {
            return Err(CurveError::DegenerateFit);
        }
        let c = (self.m * x2 - self.m * x1 * helper) / (helper - 1.0);
        let arg1 = self.m * x1 + c;
        let arg2 = self.m * x2 + c;
        if arg1 <= 0.0 || arg2 <= 0.0 {
            return Err(CurveError::NonPositiveLogArgument);
        }

        self.c = c;
        self.d = y1 - self.k * arg1.ln();
        Ok(())
    }
}

impl Curve for LogarithmicCurve {
    fn y(&self, x: f64) -> f64 {
        self.k * (self.m * x + self.c).ln() + self.d
    }
}

/// `y = k·e^(m·x) + d`
///
/// `m` shapes the curve; `k` and `d` are solved by [`set_points`].
///
/// [`set_points`]: ExponentialCurve::set_points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialCurve {
    pub k: f64,
    pub m: f64,
    pub d: f64,
}

impl ExponentialCurve {
    pub const fn new(m: f64) -> Self {
        Self { k: 1.0, m, d: 0.0 }
    }

    pub fn set_points(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<(), CurveError> {
        if x1 == x2 {
            return Err(CurveError::CoincidentAbscissae);
        }
        if y1 == y2 {
            return Err(CurveError::CoincidentOrdinates);
        }
        // m == 0 is a constant function
        if self.m == 0.0 {
            return Err(CurveError::DegenerateFit);
        }

        let e1 = (self.m * x1).exp();
        let divisor = (self.m * x2).exp() - e1;
        if divisor == 0.0 || !divisor.is_finite() {
            return Err(CurveError::DegenerateFit);
        }

        let k = (y2 - y1) / divisor;
        self.k = k;
        self.d = y1 - k * e1;
        Ok(())
    }
}

impl Curve for ExponentialCurve {
    fn y(&self, x: f64) -> f64 {
        self.k * (self.m * x).exp() + self.d
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Polynomials
// ─────────────────────────────────────────────────────────────────────────────

/// Real roots of a quadratic equation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum QuadraticRoots {
    None,
    One(f64),
    Two(f64, f64),
}

impl QuadraticRoots {
    pub fn count(&self) -> usize {
        match self {
            QuadraticRoots::None => 0,
            QuadraticRoots::One(_) => 1,
            QuadraticRoots::Two(..) => 2,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let (roots, n) = match *self {
            QuadraticRoots::None => ([0.0; 2], 0),
            QuadraticRoots::One(r) => ([r, 0.0], 1),
            QuadraticRoots::Two(r1, r2) => ([r1, r2], 2),
        };
        roots.into_iter().take(n)
    }
}

/// `y = a·x² + b·x + c`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QuadraticCurve {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticCurve {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// All real `x` with `f(x) = y`
    pub fn roots(&self, y: f64) -> QuadraticRoots {
        let c = self.c - y;
        if self.a == 0.0 {
            if self.b == 0.0 {
                return QuadraticRoots::None;
            }
            return QuadraticRoots::One(-c / self.b);
        }

        let discriminant = self.b * self.b - 4.0 * self.a * c;
        if discriminant > 0.0 {
            let root = discriminant.sqrt();
            QuadraticRoots::Two(
                (-self.b + root) / (2.0 * self.a),
                (-self.b - root) / (2.0 * self.a),
            )
        } else if discriminant == 0.0 {
            QuadraticRoots::One(-self.b / (2.0 * self.a))
        } else {
            QuadraticRoots::None
        }
    }

    /// `f'(x) = 2a·x + b`
    pub fn derivative(&self) -> QuadraticCurve {
        QuadraticCurve::new(0.0, 2.0 * self.a, self.b)
    }
}

impl Curve for QuadraticCurve {
    fn y(&self, x: f64) -> f64 {
        self.c + x * (self.b + self.a * x)
    }
}

/// `y = a·x³ + b·x² + c·x + d`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CubicCurve {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CubicCurve {
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Principal real `x` with `f(x) = y`
    ///
    /// Closed-form Cardano solution. With three real roots the largest one is
    /// returned. Lower-degree polynomials fall back to the quadratic or linear
    /// solution; a constant polynomial has no answer.
    pub fn real_x(&self, y: f64) -> Option<f64> {
        if self.a == 0.0 {
            return match QuadraticCurve::new(self.b, self.c, self.d).roots(y) {
                QuadraticRoots::None => None,
                QuadraticRoots::One(r) => Some(r),
                QuadraticRoots::Two(r1, r2) => Some(r1.max(r2)),
            };
        }

        let b = self.b / self.a;
        let c = self.c / self.a;
        let d = (self.d - y) / self.a;

        // Depressed cubic t³ + p·t + q = 0 with x = t - b/3
        let shift = b / 3.0;
        let p = c - b * b / 3.0;
        let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
        let discriminant = (q / 2.0).powi(2) + (p / 3.0).powi(3);

        let t = if discriminant >= 0.0 {
            let root = discriminant.sqrt();
            (-q / 2.0 + root).cbrt() + (-q / 2.0 - root).cbrt()
        } else {
            // Three real roots: trigonometric form, k = 0
            let r = (-p / 3.0).sqrt();
            let phi = ((3.0 * q) / (2.0 * p) * (-3.0 / p).sqrt()).clamp(-1.0, 1.0).acos();
            2.0 * r * (phi / 3.0).cos()
        };
        Some(t - shift)
    }

    /// `f'(x) = 3a·x² + 2b·x + c`
    pub fn derivative(&self) -> CubicCurve {
        CubicCurve::new(0.0, 3.0 * self.a, 2.0 * self.b, self.c)
    }
}

impl Curve for CubicCurve {
    fn y(&self, x: f64) -> f64 {
        self.d + x * (self.c + x * (self.b + self.a * x))
    }
}

/// One coordinate of a cubic Bézier segment as a polynomial in `t`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CubicBezierCurve {
    polynomial: CubicCurve,
}

impl CubicBezierCurve {
    pub fn new(p0: f64, p1: f64, p2: f64, p3: f64) -> Self {
        let mut curve = Self::default();
        curve.assign(p0, p1, p2, p3);
        curve
    }

    /// Rebuild from the four control values
    pub fn assign(&mut self, p0: f64, p1: f64, p2: f64, p3: f64) {
        let a = 3.0 * p0;
        let b = 3.0 * p1;
        let c = 3.0 * p2;
        self.polynomial = CubicCurve::new(p3 - p0 + b - c, a - 2.0 * b + c, b - a, p0);
    }

    pub fn polynomial(&self) -> &CubicCurve {
        &self.polynomial
    }

    pub fn derivative(&self) -> CubicCurve {
        self.polynomial.derivative()
    }
}

impl Curve for CubicBezierCurve {
    fn y(&self, t: f64) -> f64 {
        self.polynomial.y(t)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interval mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluates a unit curve over arbitrary intervals
///
/// `x` is normalized from `[x1, x2]` to `[0, 1]`, the inner curve is evaluated
/// and its result is scaled from `[0, 1]` into `[y1, y2]`.
#[derive(Clone, Debug)]
pub struct ScaledCurve<C> {
    pub curve: C,
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

impl<C: Curve> ScaledCurve<C> {
    pub fn new(curve: C, x1: f64, x2: f64, y1: f64, y2: f64) -> Result<Self, CurveError> {
        if x1 == x2 {
            return Err(CurveError::CoincidentAbscissae);
        }
        Ok(Self {
            curve,
            x1,
            x2,
            y1,
            y2,
        })
    }

    fn normalize_x(&self, x: f64) -> f64 {
        (x - self.x1) / (self.x2 - self.x1)
    }

    fn scale_y(&self, y: f64) -> f64 {
        self.y1 + y * (self.y2 - self.y1)
    }
}

impl<C: Curve> Curve for ScaledCurve<C> {
    fn y(&self, x: f64) -> f64 {
        self.scale_y(self.curve.y(self.normalize_x(x)))
    }
}

/// Inverse of [`ScaledCurve`]: presents a curve over `[x1, x2] -> [y1, y2]`
/// as a unit curve
#[derive(Clone, Debug)]
pub struct CurveNormalizer<C> {
    pub curve: C,
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

impl<C: Curve> CurveNormalizer<C> {
    pub fn new(curve: C, x1: f64, x2: f64, y1: f64, y2: f64) -> Result<Self, CurveError> {
        if y1 == y2 {
            return Err(CurveError::CoincidentOrdinates);
        }
        Ok(Self {
            curve,
            x1,
            x2,
            y1,
            y2,
        })
    }
}

impl<C: Curve> Curve for CurveNormalizer<C> {
    fn y(&self, x: f64) -> f64 {
        let scaled_x = self.x1 + x * (self.x2 - self.x1);
        (self.curve.y(scaled_x) - self.y1) / (self.y2 - self.y1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inversion
// ─────────────────────────────────────────────────────────────────────────────

const NEWTON_ITERATIONS: usize = 8;
const MIN_SLOPE: f64 = 1e-6;
const MAX_BISECTIONS: usize = 128;

/// Numeric inverse of a monotonically increasing curve
///
/// Newton-Raphson is tried first; when the slope gets too flat (or Newton does
/// not converge) the answer is bisected within `[min, max]`.
pub struct CurveApproacher<'a> {
    curve: &'a dyn Curve,
    derivative: &'a dyn Curve,
    min: f64,
    max: f64,
}

impl<'a> CurveApproacher<'a> {
    pub fn new(curve: &'a dyn Curve, derivative: &'a dyn Curve, min: f64, max: f64) -> Self {
        Self {
            curve,
            derivative,
            min,
            max,
        }
    }

    /// Find `x` with `|f(x) - y| < epsilon`
    pub fn x(&self, y: f64, epsilon: f64) -> f64 {
        let mut t = y;
        for _ in 0..NEWTON_ITERATIONS {
            let error = self.curve.y(t) - y;
            if error.abs() < epsilon {
                return t;
            }
            let slope = self.derivative.y(t);
            if slope.abs() < MIN_SLOPE {
                break;
            }
            t -= error / slope;
        }

        let mut lo = self.min;
        let mut hi = self.max;
        let mut t = y;
        if t < lo {
            return lo;
        }
        if t > hi {
            return hi;
        }

        for _ in 0..MAX_BISECTIONS {
            if lo >= hi {
                break;
            }
            let value = self.curve.y(t);
            if (value - y).abs() < epsilon {
                return t;
            }
            if y > value {
                lo = t;
            } else {
                hi = t;
            }
            t = (hi - lo) * 0.5 + lo;
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_through_points() {
        let line = LinearCurve::through(1.0, 3.0, 3.0, 7.0).unwrap();
        assert!((line.k - 2.0).abs() < 1e-12);
        assert!((line.y(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_rejects_vertical_line() {
        let mut line = LinearCurve::new(2.0, 1.0);
        assert_eq!(
            line.set_points(1.0, 0.0, 1.0, 5.0),
            Err(CurveError::CoincidentAbscissae)
        );
        assert_eq!(line, LinearCurve::new(2.0, 1.0));
    }

    #[test]
    fn test_logarithmic_fit_passes_through_points() {
        let mut curve = LogarithmicCurve::new(2.0, 1.0);
        curve.set_points(1.0, 0.0, 10.0, 3.0).unwrap();
        assert!(curve.y(1.0).abs() < 1e-9);
        assert!((curve.y(10.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_logarithmic_zero_scale() {
        let mut curve = LogarithmicCurve::new(0.0, 1.0);
        assert_eq!(
            curve.set_points(0.0, 0.0, 1.0, 1.0),
            Err(CurveError::ZeroScale)
        );
    }

    #[test]
    fn test_exponential_fit_passes_through_points() {
        let mut curve = ExponentialCurve::new(0.5);
        curve.set_points(0.0, 1.0, 4.0, 20.0).unwrap();
        assert!((curve.y(0.0) - 1.0).abs() < 1e-9);
        assert!((curve.y(4.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_flat_shape_is_degenerate() {
        let mut curve = ExponentialCurve::new(0.0);
        let before = curve;
        assert_eq!(
            curve.set_points(0.0, 1.0, 1.0, 2.0),
            Err(CurveError::DegenerateFit)
        );
        assert_eq!(curve, before);
    }

    #[test]
    fn test_quadratic_root_counts() {
        // x² - 2x + 1: touches zero once
        let q = QuadraticCurve::new(1.0, -2.0, 1.0);
        assert_eq!(q.roots(0.0), QuadraticRoots::One(1.0));
        assert_eq!(q.roots(4.0).count(), 2);
        assert_eq!(q.roots(-1.0), QuadraticRoots::None);
    }

    #[test]
    fn test_quadratic_roots_satisfy_equation() {
        let q = QuadraticCurve::new(2.0, -3.0, -5.0);
        for y in [-2.0, 0.0, 7.5] {
            for r in q.roots(y).iter() {
                assert!((q.a * r * r + q.b * r + q.c - y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_quadratic_derivative() {
        let d = QuadraticCurve::new(3.0, 2.0, 1.0).derivative();
        assert_eq!(d, QuadraticCurve::new(0.0, 6.0, 2.0));
    }

    #[test]
    fn test_cubic_real_x() {
        let cubic = CubicCurve::new(1.0, 0.0, 0.0, 0.0);
        assert!((cubic.real_x(8.0).unwrap() - 2.0).abs() < 1e-9);
        assert!((cubic.real_x(-27.0).unwrap() + 3.0).abs() < 1e-9);

        // (x - 1)(x - 2)(x - 3): three real roots, largest one wins
        let cubic = CubicCurve::new(1.0, -6.0, 11.0, -6.0);
        let x = cubic.real_x(0.0).unwrap();
        assert!((x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_cubic_real_x_inverts_general_polynomial() {
        let cubic = CubicCurve::new(0.5, 0.25, 2.0, -1.0);
        for y in [-3.0, 0.0, 1.5, 10.0] {
            let x = cubic.real_x(y).unwrap();
            assert!((cubic.y(x) - y).abs() < 1e-7);
        }
    }

    #[test]
    fn test_bezier_endpoints() {
        let bezier = CubicBezierCurve::new(0.0, 0.42, 0.58, 1.0);
        assert!(bezier.y(0.0).abs() < 1e-12);
        assert!((bezier.y(1.0) - 1.0).abs() < 1e-12);
        // Symmetric control points meet in the middle
        assert!((bezier.y(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_curve_and_normalizer_invert() {
        let unit = |x: f64| x * x;
        let scaled = ScaledCurve::new(unit, 10.0, 20.0, 100.0, 200.0).unwrap();
        assert!((scaled.y(15.0) - 125.0).abs() < 1e-9);

        let normalized = CurveNormalizer::new(scaled, 10.0, 20.0, 100.0, 200.0).unwrap();
        assert!((normalized.y(0.5) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_approacher_inverts_cubic() {
        let cubic = CubicCurve::new(1.0, 0.0, 1.0, 0.0);
        let derivative = cubic.derivative();
        let approacher = CurveApproacher::new(&cubic, &derivative, 0.0, 10.0);
        let x = approacher.x(10.0, 1e-6);
        assert!((cubic.y(x) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_approacher_bisects_on_flat_slope() {
        let cubic = CubicCurve::new(1.0, 0.0, 0.0, 0.0);
        let flat = |_: f64| 0.0;
        let approacher = CurveApproacher::new(&cubic, &flat, -2.0, 2.0);
        let x = approacher.x(1e-3, 1e-6);
        assert!((cubic.y(x) - 1e-3).abs() < 1e-6);
    }

    #[test]
    fn test_approacher_clamps_outside_interval() {
        let flat = |_: f64| 0.5;
        let zero = |_: f64| 0.0;
        let approacher = CurveApproacher::new(&flat, &zero, 0.0, 1.0);
        assert_eq!(approacher.x(2.0, 1e-3), 1.0);
        assert_eq!(approacher.x(-1.0, 1e-3), 0.0);
    }
}
