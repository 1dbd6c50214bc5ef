//! Input event types
//!
//! The subset of platform input the motion controllers consume: keyboard
//! modifier state and mouse wheel / trackpad scroll events.

/// Keyboard modifier flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { bits: 0 };
    pub const SHIFT: u8 = 0b0001;
    pub const CTRL: u8 = 0b0010;
    pub const ALT: u8 = 0b0100;
    pub const META: u8 = 0b1000; // Cmd on macOS, Win on Windows

    /// Create new modifiers from flags
    pub const fn new(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Self {
        let mut bits = 0;
        if shift {
            bits |= Self::SHIFT;
        }
        if ctrl {
            bits |= Self::CTRL;
        }
        if alt {
            bits |= Self::ALT;
        }
        if meta {
            bits |= Self::META;
        }
        Self { bits }
    }

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    /// Check if shift is pressed
    pub const fn shift(&self) -> bool {
        self.bits & Self::SHIFT != 0
    }

    pub const fn ctrl(&self) -> bool {
        self.bits & Self::CTRL != 0
    }

    pub const fn alt(&self) -> bool {
        self.bits & Self::ALT != 0
    }

    pub const fn meta(&self) -> bool {
        self.bits & Self::META != 0
    }
}

/// Direction of a discrete wheel step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
    Left,
    Right,
}

impl WheelDirection {
    pub const fn is_vertical(self) -> bool {
        matches!(self, WheelDirection::Up | WheelDirection::Down)
    }
}

/// Mouse wheel or trackpad scroll event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WheelEvent {
    /// One notch of a classic scroll wheel
    Discrete {
        direction: WheelDirection,
        modifiers: Modifiers,
    },
    /// Pixel-precise scroll delta from a trackpad or smooth wheel
    Continuous {
        delta: f32,
        direction: WheelDirection,
        /// The platform reports natural (inverted) scrolling
        axis_inverted: bool,
        /// Momentum events emitted by the platform after the fingers lift
        roll_out_phase: bool,
        modifiers: Modifiers,
    },
}

impl WheelEvent {
    pub fn direction(&self) -> WheelDirection {
        match *self {
            WheelEvent::Discrete { direction, .. } => direction,
            WheelEvent::Continuous { direction, .. } => direction,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match *self {
            WheelEvent::Discrete { modifiers, .. } => modifiers,
            WheelEvent::Continuous { modifiers, .. } => modifiers,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, WheelEvent::Continuous { .. })
    }
}
