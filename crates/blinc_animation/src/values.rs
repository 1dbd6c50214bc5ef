//! Animatable values
//!
//! [`AnimatedValue`] is the tagged union written to target properties. Basic
//! animations blend two values of the same kind; transform animations build an
//! [`Affine2D`] from a list of independently interpolated [`TransformOp`]s.

use blinc_core::{Affine2D, Color, Point, Rect, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Trait for values that can be blended linearly
pub trait Interpolate: Sized {
    /// Blend between `self` and `to`, `t = 0` yields `self`
    fn lerp(&self, to: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Point {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Point::lerp(self, *to, t as f32)
    }
}

impl Interpolate for Rect {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Rect::lerp(self, *to, t as f32)
    }
}

impl Interpolate for Vec3 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Vec3::lerp(self, *to, t as f32)
    }
}

impl Interpolate for Vec4 {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Vec4::lerp(self, *to, t as f32)
    }
}

impl Interpolate for Color {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Color::linear_gradient(*self, *to, t as f32)
    }
}

/// A value written to an animated property
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimatedValue {
    Scalar(f64),
    Point(Point),
    Rect(Rect),
    Color(Color),
    Vec3(Vec3),
    Vec4(Vec4),
    Transform(Affine2D),
}

impl AnimatedValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnimatedValue::Scalar(_) => "scalar",
            AnimatedValue::Point(_) => "point",
            AnimatedValue::Rect(_) => "rect",
            AnimatedValue::Color(_) => "color",
            AnimatedValue::Vec3(_) => "vec3",
            AnimatedValue::Vec4(_) => "vec4",
            AnimatedValue::Transform(_) => "transform",
        }
    }

    /// Whether a basic animation can blend this kind of value
    pub fn is_interpolable(&self) -> bool {
        !matches!(self, AnimatedValue::Transform(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AnimatedValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            AnimatedValue::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AnimatedValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<Affine2D> {
        match self {
            AnimatedValue::Transform(t) => Some(*t),
            _ => None,
        }
    }

    /// Blend towards `to`; `None` when the kinds differ or cannot be blended
    pub fn interpolate(&self, to: &AnimatedValue, t: f64) -> Option<AnimatedValue> {
        Some(match (self, to) {
            (AnimatedValue::Scalar(a), AnimatedValue::Scalar(b)) => {
                AnimatedValue::Scalar(Interpolate::lerp(a, b, t))
            }
            (AnimatedValue::Point(a), AnimatedValue::Point(b)) => {
                AnimatedValue::Point(Interpolate::lerp(a, b, t))
            }
            (AnimatedValue::Rect(a), AnimatedValue::Rect(b)) => {
                AnimatedValue::Rect(Interpolate::lerp(a, b, t))
            }
            (AnimatedValue::Color(a), AnimatedValue::Color(b)) => {
                AnimatedValue::Color(Interpolate::lerp(a, b, t))
            }
            (AnimatedValue::Vec3(a), AnimatedValue::Vec3(b)) => {
                AnimatedValue::Vec3(Interpolate::lerp(a, b, t))
            }
            (AnimatedValue::Vec4(a), AnimatedValue::Vec4(b)) => {
                AnimatedValue::Vec4(Interpolate::lerp(a, b, t))
            }
            _ => return None,
        })
    }
}

impl From<f64> for AnimatedValue {
    fn from(v: f64) -> Self {
        AnimatedValue::Scalar(v)
    }
}

impl From<Point> for AnimatedValue {
    fn from(v: Point) -> Self {
        AnimatedValue::Point(v)
    }
}

impl From<Rect> for AnimatedValue {
    fn from(v: Rect) -> Self {
        AnimatedValue::Rect(v)
    }
}

impl From<Color> for AnimatedValue {
    fn from(v: Color) -> Self {
        AnimatedValue::Color(v)
    }
}

impl From<Vec3> for AnimatedValue {
    fn from(v: Vec3) -> Self {
        AnimatedValue::Vec3(v)
    }
}

impl From<Vec4> for AnimatedValue {
    fn from(v: Vec4) -> Self {
        AnimatedValue::Vec4(v)
    }
}

impl From<Affine2D> for AnimatedValue {
    fn from(v: Affine2D) -> Self {
        AnimatedValue::Transform(v)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform operations
// ─────────────────────────────────────────────────────────────────────────────

/// Elementary 2D transform; angles are in degrees
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformOpKind {
    TranslateX,
    TranslateY,
    ScaleX,
    ScaleY,
    Rotate,
    SkewX,
    SkewY,
}

impl TransformOpKind {
    fn matrix(self, v: f64) -> Affine2D {
        let v = v as f32;
        match self {
            TransformOpKind::TranslateX => Affine2D::translation(v, 0.0),
            TransformOpKind::TranslateY => Affine2D::translation(0.0, v),
            TransformOpKind::ScaleX => Affine2D::scale(v, 1.0),
            TransformOpKind::ScaleY => Affine2D::scale(1.0, v),
            TransformOpKind::Rotate => Affine2D::rotation(v.to_radians()),
            TransformOpKind::SkewX => Affine2D::skew_x(v.to_radians()),
            TransformOpKind::SkewY => Affine2D::skew_y(v.to_radians()),
        }
    }
}

/// One interpolated transform operation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformOp {
    pub kind: TransformOpKind,
    pub from: f64,
    pub to: f64,
}

impl TransformOp {
    pub const fn new(kind: TransformOpKind, from: f64, to: f64) -> Self {
        Self { kind, from, to }
    }

    pub fn value_at(&self, t: f64) -> f64 {
        Interpolate::lerp(&self.from, &self.to, t)
    }
}

/// Ordered transform operations of a transform animation
pub type TransformOps = SmallVec<[TransformOp; 4]>;

/// Compose the operations at progress `t`
///
/// Operations are concatenated in reverse declaration order, so the first
/// declared operation is the first one applied to a point.
pub fn compose_transform(ops: &[TransformOp], t: f64) -> Affine2D {
    ops.iter().rev().fold(Affine2D::IDENTITY, |acc, op| {
        acc.then(&op.kind.matrix(op.value_at(t)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_interpolation() {
        let a = AnimatedValue::Scalar(10.0);
        let b = AnimatedValue::Scalar(20.0);
        assert_eq!(a.interpolate(&b, 0.25), Some(AnimatedValue::Scalar(12.5)));
    }

    #[test]
    fn test_mismatched_kinds_do_not_interpolate() {
        let a = AnimatedValue::Scalar(1.0);
        let b = AnimatedValue::Point(Point::new(1.0, 1.0));
        assert_eq!(a.interpolate(&b, 0.5), None);

        let t = AnimatedValue::Transform(Affine2D::IDENTITY);
        assert_eq!(t.interpolate(&t, 0.5), None);
        assert!(!t.is_interpolable());
    }

    #[test]
    fn test_color_interpolation_uses_gradient() {
        let a = AnimatedValue::Color(Color::BLACK);
        let b = AnimatedValue::Color(Color::WHITE);
        let mid = a.interpolate(&b, 0.5).and_then(|v| v.as_color()).unwrap();
        assert!((mid.g - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_compose_applies_first_op_first() {
        let ops = [
            TransformOp::new(TransformOpKind::TranslateX, 0.0, 10.0),
            TransformOp::new(TransformOpKind::ScaleX, 1.0, 3.0),
        ];
        let m = compose_transform(&ops, 1.0);
        let p = m.transform_point(Point::new(1.0, 0.0));
        assert!((p.x - 33.0).abs() < 1e-4);

        let start = compose_transform(&ops, 0.0);
        assert!(start.approx_eq(&Affine2D::IDENTITY, 1e-6));
    }

    #[test]
    fn test_rotate_in_degrees() {
        let ops = [TransformOp::new(TransformOpKind::Rotate, 0.0, 90.0)];
        let p = compose_transform(&ops, 1.0).transform_point(Point::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }
}
