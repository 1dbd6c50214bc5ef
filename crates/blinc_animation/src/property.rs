//! Animated properties
//!
//! A property is a `(target, id)` pair. Targets are shared UI objects
//! implementing [`AnimationTarget`]; the scheduler only keeps weak references
//! to them so an animation never extends its target's lifetime.

use std::borrow::Cow;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::animation::ResetMode;
use crate::error::{AnimationError, Result};
use crate::values::AnimatedValue;

/// Upper bound for redirection chains
const MAX_REDIRECTS: usize = 8;

/// Name of an animatable property
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(Cow<'static, str>);

impl PropertyId {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for PropertyId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for PropertyId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a value reaches a property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Regular per-frame animation output
    Animated,
    /// Value restored when an animation stops
    Reset(ResetMode),
}

/// An object whose properties can be animated
///
/// Writes are synchronous and may re-enter the scheduler (start or cancel
/// other animations).
pub trait AnimationTarget {
    fn set_property(&self, property: &PropertyId, value: &AnimatedValue, mode: WriteMode);

    /// Forward a property to the object that actually holds it
    fn redirect_property(
        &self,
        _property: &PropertyId,
    ) -> Option<(Rc<dyn AnimationTarget>, PropertyId)> {
        None
    }
}

/// Identity of a target object
///
/// Derived from the object's address; only meaningful while the object is
/// alive, which the scheduler checks through its weak reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetKey(usize);

impl TargetKey {
    /// Key of a target, usable from its own `Drop` implementation
    pub fn of<T: ?Sized>(target: &T) -> Self {
        Self(target as *const T as *const () as usize)
    }

    pub fn of_rc(target: &Rc<dyn AnimationTarget>) -> Self {
        Self(Rc::as_ptr(target) as *const () as usize)
    }

    pub(crate) fn raw(self) -> usize {
        self.0
    }
}

/// A resolved, weakly held property
#[derive(Clone)]
pub struct Property {
    target: Weak<dyn AnimationTarget>,
    key: TargetKey,
    id: PropertyId,
}

impl Property {
    /// Follow redirections to the holder of `id`
    pub fn resolve(target: &Rc<dyn AnimationTarget>, id: PropertyId) -> Result<Self> {
        if id.is_empty() {
            return Err(AnimationError::EmptyPropertyId);
        }

        let mut holder = Rc::clone(target);
        let mut id = id;
        for _ in 0..MAX_REDIRECTS {
            match holder.redirect_property(&id) {
                Some((next, next_id)) => {
                    if next_id.is_empty() {
                        return Err(AnimationError::EmptyPropertyId);
                    }
                    holder = next;
                    id = next_id;
                }
                None => {
                    return Ok(Self {
                        key: TargetKey::of_rc(&holder),
                        target: Rc::downgrade(&holder),
                        id,
                    });
                }
            }
        }
        Err(AnimationError::InvalidArgument("property redirection does not terminate"))
    }

    pub fn id(&self) -> &PropertyId {
        &self.id
    }

    pub fn key(&self) -> TargetKey {
        self.key
    }

    pub fn target(&self) -> Option<Rc<dyn AnimationTarget>> {
        self.target.upgrade()
    }

    pub(crate) fn weak_target(&self) -> Weak<dyn AnimationTarget> {
        self.target.clone()
    }

    /// Write a value; returns `false` when the target is gone
    pub fn set(&self, value: &AnimatedValue, mode: WriteMode) -> bool {
        match self.target.upgrade() {
            Some(target) => {
                target.set_property(&self.id, value, mode);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}
