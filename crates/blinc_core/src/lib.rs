//! Blinc Core Types
//!
//! Foundational value types shared by the Blinc motion crates:
//!
//! - **Geometry**: points, rectangles, vectors, colors and 2D affine transforms
//! - **Events**: keyboard modifiers and wheel/trackpad scroll events
//!
//! # Example
//!
//! ```rust
//! use blinc_core::{Affine2D, Point};
//!
//! let t = Affine2D::translation(10.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
//! assert_eq!(t.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
//! ```

pub mod events;
pub mod geometry;

pub use events::{Modifiers, WheelDirection, WheelEvent};
pub use geometry::{Affine2D, Color, Point, Rect, Size, Vec3, Vec4};
