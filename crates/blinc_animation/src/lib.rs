//! Blinc Animation System
//!
//! Property animations driven by clocks, with the curve math behind them.
//!
//! # Features
//!
//! - **Curves**: Linear, logarithmic, exponential, polynomial and cubic Bézier
//!   curves, natural splines, and numeric curve inversion
//! - **Timing Functions**: CSS-style ease presets and custom cubic Béziers
//! - **Animations**: Repeating, auto-reversing animations of scalars, points,
//!   rects, colors, vectors and composed 2D transforms
//! - **Scheduler**: One animation per property, shared clocks, completion
//!   chaining, and pluggable handlers for external animation engines

pub mod animation;
pub mod clock;
pub mod curve;
pub mod easing;
pub mod error;
pub mod property;
pub mod scheduler;
pub mod spline;
pub mod values;

pub use animation::{
    AnimationCompletionHandler, AnimationDescription, AnimationId, AnimationInstance,
    AnimationKind, AnimationSpec, AnimationState, CompletionHandlerList, RepeatCount, ResetMode,
};
pub use clock::{
    AnimatePhase, AnimationClock, ClockId, ClockObserver, ClockScope, ManualTimeSource,
    SystemTimeSource, TimeSource,
};
pub use curve::{
    CubicBezierCurve, CubicCurve, Curve, CurveApproacher, CurveNormalizer, ExponentialCurve,
    LinearCurve, LogarithmicCurve, QuadraticCurve, QuadraticRoots, ScaledCurve,
};
pub use easing::{standard_timing_function, ControlPoints, CubicBezierTiming, Easing, TimingFunction};
pub use error::{AnimationError, CurveError, Result};
pub use property::{AnimationTarget, Property, PropertyId, TargetKey, WriteMode};
pub use scheduler::{AddOutcome, AnimationHandler, AnimationScheduler, HandlerOutcome, RemoveOutcome};
pub use spline::{LinearSpline, NaturalSpline, SplineLimits, StepSpline};
pub use values::{
    compose_transform, AnimatedValue, Interpolate, TransformOp, TransformOpKind, TransformOps,
};
