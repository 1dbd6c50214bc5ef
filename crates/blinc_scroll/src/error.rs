//! Overscroll error types

use thiserror::Error;

use crate::config::Axis;

/// Errors raised by the overscroll animator
#[derive(Error, Debug)]
pub enum ScrollError {
    /// Configuration text could not be parsed
    #[error("invalid overscroll configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configured direction needs a scroll parameter that was not supplied
    #[error("no scroll parameter for the {0:?} axis")]
    MissingAxis(Axis),

    /// A scroll phase could not be submitted to the scheduler
    #[error("animation error: {0}")]
    Animation(#[from] blinc_animation::AnimationError),
}

/// Result type for overscroll operations
pub type Result<T> = std::result::Result<T, ScrollError>;
