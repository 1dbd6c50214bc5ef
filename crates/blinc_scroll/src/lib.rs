//! Blinc Overscroll
//!
//! Rubber-band scrolling for scrollables with optional snapping and
//! wrap-around, built on the [`blinc_animation`] scheduler.
//!
//! # Features
//!
//! - **Rollout**: Releasing a drag glides on with the release velocity and
//!   settles on the snap grid
//! - **Bounce**: Glides that hit an edge continue into the margin and ease
//!   back to the boundary
//! - **Wheel**: Discrete notches step the scroll value; trackpad deltas move
//!   directly, settle on the grid and hand momentum over to a rollout
//! - **Key steps**: Increment and decrement animate to the next value
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use blinc_animation::AnimationScheduler;
//! use blinc_core::Point;
//! use blinc_scroll::{Axis, OverScrollAnimator, OverScrollConfig, ScrollParam};
//!
//! let scheduler = Rc::new(AnimationScheduler::new());
//! let param = Rc::new(ScrollParam::new(0, 1000));
//! let animator = OverScrollAnimator::new(
//!     scheduler.clone(),
//!     OverScrollConfig::vertical(1000, 50),
//!     Some(param),
//!     None,
//! )
//! .unwrap();
//!
//! animator.start_scroll_animation(Point::new(0.0, -300.0)).unwrap();
//! assert!(animator.is_animating(Axis::Vertical));
//! ```

pub mod animator;
pub mod config;
pub mod error;
pub mod gesture;
pub mod param;
pub mod physics;

pub use animator::{
    position_property, OverScrollAnimator, OverScrollObserver, H_SCROLL_POSITION,
    V_SCROLL_POSITION,
};
pub use config::{Axis, Margins, OverScrollConfig, ScrollDirection};
pub use error::{Result, ScrollError};
pub use gesture::{GestureKind, OverScrollGesture};
pub use param::ScrollParam;
