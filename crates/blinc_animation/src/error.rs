//! Animation error types

use thiserror::Error;

/// Errors raised by the animation scheduler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("property id must not be empty")]
    EmptyPropertyId,

    #[error("animation target has been dropped")]
    TargetDropped,

    #[error("start and end values have different kinds ({from} vs {to})")]
    ValueMismatch {
        from: &'static str,
        to: &'static str,
    },

    #[error("{0} values cannot be animated by a basic animation")]
    NotAnimatable(&'static str),

    #[error("animation handler is already registered")]
    HandlerAlreadyRegistered,

    #[error("animation handler is not registered")]
    HandlerNotRegistered,

    #[error("shared clock name must not be empty")]
    EmptyClockName,
}

/// Errors raised when fitting curve parameters
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    #[error("fit points share the same x coordinate")]
    CoincidentAbscissae,

    #[error("fit points share the same y coordinate")]
    CoincidentOrdinates,

    #[error("curve scale factor must not be zero")]
    ZeroScale,

    #[error("logarithm argument is not positive")]
    NonPositiveLogArgument,

    #[error("curve parameters cannot be solved for the given points")]
    DegenerateFit,

    #[error("spline already contains a point at this x coordinate")]
    DuplicateAbscissa,
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, AnimationError>;
