//! Identifiers used as keys by motion sets and the string id pool.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Interned identifier produced by [`crate::StringIdPool`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringId(pub u32);

impl StringId {
    /// Sentinel for an entry that has no identifier assigned yet.
    pub const INVALID: StringId = StringId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Default for StringId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

/// Numeric identity of a motion set, unique across the live sets of a context.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MotionSetId(pub u32);

impl fmt::Display for MotionSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic allocator for MotionSetId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_set: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_set(&mut self) -> MotionSetId {
        let id = MotionSetId(self.next_set);
        self.next_set = self.next_set.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
