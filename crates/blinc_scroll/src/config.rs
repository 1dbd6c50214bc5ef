//! Overscroll configuration
//!
//! Static geometry of a scrollable: which axes scroll, how far, the snap grid
//! and the margins the content may be pulled into before it bounces back.
//!
//! # Example
//!
//! ```rust
//! use blinc_scroll::{OverScrollConfig, ScrollDirection};
//!
//! let config = OverScrollConfig::from_toml_str(
//!     r#"
//!     direction = "vertical"
//!     range_y = 1000
//!     margins = { top = 50, bottom = 50 }
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.direction, ScrollDirection::Vertical);
//! assert_eq!(config.snap(blinc_scroll::Axis::Vertical), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ============================================================================
// Axes
// ============================================================================

/// One scroll axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::Vertical, Axis::Horizontal];
}

/// Scroll direction of an animator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollDirection {
    /// Vertical scrolling only (default)
    #[default]
    Vertical,
    /// Horizontal scrolling only
    Horizontal,
    /// Both directions
    Both,
}

impl ScrollDirection {
    pub fn includes(self, axis: Axis) -> bool {
        matches!(
            (self, axis),
            (ScrollDirection::Both, _)
                | (ScrollDirection::Vertical, Axis::Vertical)
                | (ScrollDirection::Horizontal, Axis::Horizontal)
        )
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Overscroll margins in points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

impl Margins {
    pub const fn uniform(margin: i32) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// Margin before the start of `axis`
    pub fn leading(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Vertical => self.top,
            Axis::Horizontal => self.left,
        }
    }

    /// Margin after the end of `axis`
    pub fn trailing(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Vertical => self.bottom,
            Axis::Horizontal => self.right,
        }
    }
}

/// Configuration of an [`OverScrollAnimator`](crate::OverScrollAnimator)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverScrollConfig {
    #[serde(default)]
    pub direction: ScrollDirection,
    /// Scrollable distance of the horizontal axis in points
    #[serde(default)]
    pub range_x: i32,
    /// Scrollable distance of the vertical axis in points
    #[serde(default)]
    pub range_y: i32,
    /// Horizontal snap grid; values below 1 mean no snapping
    #[serde(default = "default_snap")]
    pub snap_x: i32,
    /// Vertical snap grid; values below 1 mean no snapping
    #[serde(default = "default_snap")]
    pub snap_y: i32,
    #[serde(default)]
    pub margins: Margins,
    /// Scrolling past the end continues at the start; disables margins
    #[serde(default)]
    pub wrap_around: bool,
}

fn default_snap() -> i32 {
    1
}

impl Default for OverScrollConfig {
    fn default() -> Self {
        Self {
            direction: ScrollDirection::Vertical,
            range_x: 0,
            range_y: 0,
            snap_x: default_snap(),
            snap_y: default_snap(),
            margins: Margins::default(),
            wrap_around: false,
        }
    }
}

impl OverScrollConfig {
    /// Vertical list with the same margin at both ends
    pub fn vertical(range: i32, margin: i32) -> Self {
        Self {
            direction: ScrollDirection::Vertical,
            range_y: range,
            margins: Margins::uniform(margin),
            ..Default::default()
        }
    }

    /// Horizontal strip with the same margin at both ends
    pub fn horizontal(range: i32, margin: i32) -> Self {
        Self {
            direction: ScrollDirection::Horizontal,
            range_x: range,
            margins: Margins::uniform(margin),
            ..Default::default()
        }
    }

    /// Endless vertical wheel snapping to `snap`
    pub fn wheel(range: i32, snap: i32) -> Self {
        Self {
            direction: ScrollDirection::Vertical,
            range_y: range,
            snap_y: snap,
            wrap_around: true,
            ..Default::default()
        }
    }

    pub fn with_snap(mut self, axis: Axis, snap: i32) -> Self {
        match axis {
            Axis::Vertical => self.snap_y = snap,
            Axis::Horizontal => self.snap_x = snap,
        }
        self
    }

    /// Parse a configuration from TOML
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Scrollable distance, never negative
    pub fn range(&self, axis: Axis) -> i32 {
        let range = match axis {
            Axis::Vertical => self.range_y,
            Axis::Horizontal => self.range_x,
        };
        range.max(0)
    }

    /// Snap grid, at least 1
    pub fn snap(&self, axis: Axis) -> i32 {
        let snap = match axis {
            Axis::Vertical => self.snap_y,
            Axis::Horizontal => self.snap_x,
        };
        snap.max(1)
    }

    /// Margin before the valid range (0 with wrap-around)
    pub fn leading_margin(&self, axis: Axis) -> i32 {
        if self.wrap_around {
            0
        } else {
            self.margins.leading(axis).max(0)
        }
    }

    /// Margin after the valid range (0 with wrap-around)
    pub fn trailing_margin(&self, axis: Axis) -> i32 {
        if self.wrap_around {
            0
        } else {
            self.margins.trailing(axis).max(0)
        }
    }

    /// Upper end of the raw over-scroll position
    ///
    /// Wrap-around extends the range by one snap step instead of margins.
    pub fn position_max(&self, axis: Axis) -> i32 {
        let extension = if self.wrap_around {
            self.snap(axis)
        } else {
            self.leading_margin(axis) + self.trailing_margin(axis)
        };
        self.range(axis) + extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = OverScrollConfig::from_toml_str("").unwrap();
        assert_eq!(config, OverScrollConfig::default());
        assert_eq!(config.snap(Axis::Horizontal), 1);
    }

    #[test]
    fn test_position_max() {
        let config = OverScrollConfig::vertical(1000, 50);
        assert_eq!(config.position_max(Axis::Vertical), 1100);
        assert_eq!(config.leading_margin(Axis::Vertical), 50);

        let wheel = OverScrollConfig::wheel(1000, 100);
        assert_eq!(wheel.position_max(Axis::Vertical), 1100);
        assert_eq!(wheel.leading_margin(Axis::Vertical), 0);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = OverScrollConfig::from_toml_str("direction = 3").unwrap_err();
        assert!(err.to_string().starts_with("invalid overscroll configuration"));
    }

    #[test]
    fn test_direction_includes() {
        assert!(ScrollDirection::Both.includes(Axis::Horizontal));
        assert!(ScrollDirection::Vertical.includes(Axis::Vertical));
        assert!(!ScrollDirection::Vertical.includes(Axis::Horizontal));
    }
}
