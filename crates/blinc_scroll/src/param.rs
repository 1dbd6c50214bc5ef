//! Logical scroll parameter
//!
//! The "real" scroll value of a scrollable, such as a first visible item
//! index or a pixel offset. The overscroll animator keeps it in sync with its
//! raw over-scroll position and commits it when a gesture or animation ends.

use std::cell::{Cell, RefCell};
use std::fmt;

/// Integer scroll value within `[min, max]` with edit bracketing
pub struct ScrollParam {
    min: Cell<i32>,
    max: Cell<i32>,
    value: Cell<i32>,
    edit_depth: Cell<u32>,
    on_commit: RefCell<Option<Box<dyn Fn(i32)>>>,
}

impl ScrollParam {
    pub fn new(min: i32, max: i32) -> Self {
        Self {
            min: Cell::new(min),
            max: Cell::new(max.max(min)),
            value: Cell::new(min),
            edit_depth: Cell::new(0),
            on_commit: RefCell::new(None),
        }
    }

    /// Called with the value on every [`perform_update`](Self::perform_update)
    pub fn set_on_commit(&self, callback: impl Fn(i32) + 'static) {
        *self.on_commit.borrow_mut() = Some(Box::new(callback));
    }

    pub fn min(&self) -> i32 {
        self.min.get()
    }

    pub fn max(&self) -> i32 {
        self.max.get()
    }

    /// `max - min`
    pub fn value_range(&self) -> i32 {
        self.max.get() - self.min.get()
    }

    pub fn set_range(&self, min: i32, max: i32) {
        self.min.set(min);
        self.max.set(max.max(min));
        self.set_value(self.value.get());
    }

    pub fn value(&self) -> i32 {
        self.value.get()
    }

    /// Set a value, clamped to the range; returns whether it changed
    pub fn set_value(&self, value: i32) -> bool {
        let value = value.clamp(self.min.get(), self.max.get());
        let changed = value != self.value.get();
        self.value.set(value);
        changed
    }

    pub fn normalized(&self) -> f64 {
        let range = self.value_range();
        if range == 0 {
            0.0
        } else {
            (self.value.get() - self.min.get()) as f64 / range as f64
        }
    }

    /// Value a normalized position maps to
    pub fn value_for_normalized(&self, normalized: f64) -> i32 {
        let normalized = normalized.clamp(0.0, 1.0);
        self.min.get() + (normalized * self.value_range() as f64).round() as i32
    }

    pub fn set_normalized(&self, normalized: f64) -> bool {
        self.set_value(self.value_for_normalized(normalized))
    }

    pub fn increment(&self) -> bool {
        self.set_value(self.value.get().saturating_add(1))
    }

    pub fn decrement(&self) -> bool {
        self.set_value(self.value.get().saturating_sub(1))
    }

    pub fn begin_edit(&self) {
        self.edit_depth.set(self.edit_depth.get() + 1);
    }

    /// Close an edit bracket; unbalanced calls are ignored
    pub fn end_edit(&self) {
        self.edit_depth.set(self.edit_depth.get().saturating_sub(1));
    }

    pub fn is_editing(&self) -> bool {
        self.edit_depth.get() > 0
    }

    /// Commit the current value to the owner of the parameter
    pub fn perform_update(&self) {
        if let Some(callback) = self.on_commit.borrow().as_ref() {
            callback(self.value.get());
        }
    }
}

impl fmt::Debug for ScrollParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollParam")
            .field("min", &self.min.get())
            .field("max", &self.max.get())
            .field("value", &self.value.get())
            .field("edit_depth", &self.edit_depth.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_value_is_clamped() {
        let param = ScrollParam::new(0, 10);
        assert!(param.set_value(15));
        assert_eq!(param.value(), 10);
        assert!(!param.increment());
        assert!(param.set_value(-3));
        assert_eq!(param.value(), 0);
    }

    #[test]
    fn test_normalized_round_trip() {
        let param = ScrollParam::new(0, 1000);
        param.set_normalized(0.25);
        assert_eq!(param.value(), 250);
        assert_eq!(param.normalized(), 0.25);
        assert_eq!(ScrollParam::new(5, 5).normalized(), 0.0);
    }

    #[test]
    fn test_edit_bracket_and_commit() {
        let committed = Rc::new(Cell::new(-1));
        let sink = committed.clone();
        let param = ScrollParam::new(0, 10);
        param.set_on_commit(move |v| sink.set(v));

        param.begin_edit();
        assert!(param.is_editing());
        param.set_value(4);
        param.perform_update();
        param.end_edit();
        param.end_edit();
        assert!(!param.is_editing());
        assert_eq!(committed.get(), 4);
    }
}
