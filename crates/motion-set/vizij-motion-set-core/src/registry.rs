//! Registry of the live motion sets of a context ("motion manager").
//!
//! The registry only holds weak references, so it never keeps a set alive.
//! Lookups upgrade the references under the lock and run their filters after
//! releasing it: dropping the last handle of a set unregisters it, which needs
//! the write lock.

use std::sync::{Arc, Mutex, RwLock, Weak};

use log::debug;

use crate::ids::{IdAllocator, MotionSetId};
use crate::motion_set::MotionSet;
use crate::sync::{lock, read, write};

#[derive(Debug, Default)]
pub struct MotionSetRegistry {
    ids: Mutex<IdAllocator>,
    sets: RwLock<Vec<Weak<MotionSet>>>,
}

impl MotionSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&self) -> MotionSetId {
        lock(&self.ids).alloc_set()
    }

    pub fn register(&self, set: &Arc<MotionSet>) {
        let mut sets = write(&self.sets);
        sets.retain(|w| w.strong_count() > 0);
        if sets.iter().any(|w| std::ptr::eq(w.as_ptr(), Arc::as_ptr(set))) {
            return;
        }
        sets.push(Arc::downgrade(set));
    }

    /// Remove `set` by identity. Returns whether it was registered.
    pub fn unregister(&self, set: &MotionSet) -> bool {
        let target: *const MotionSet = set;
        let removed = {
            let mut sets = write(&self.sets);
            let before = sets.len();
            sets.retain(|w| !std::ptr::eq(w.as_ptr(), target));
            sets.len() != before
        };
        if removed {
            debug!("motion set registry: unregistered set {}", set.id());
        }
        removed
    }

    pub fn contains(&self, set: &MotionSet) -> bool {
        let target: *const MotionSet = set;
        read(&self.sets)
            .iter()
            .any(|w| w.strong_count() > 0 && std::ptr::eq(w.as_ptr(), target))
    }

    /// Live sets in registration order.
    pub fn motion_sets(&self) -> Vec<Arc<MotionSet>> {
        read(&self.sets).iter().filter_map(Weak::upgrade).collect()
    }

    /// Live sets without a parent.
    pub fn root_sets(&self) -> Vec<Arc<MotionSet>> {
        self.motion_sets()
            .into_iter()
            .filter(|s| s.parent_set().is_none())
            .collect()
    }

    pub fn find_by_id(&self, id: MotionSetId) -> Option<Arc<MotionSet>> {
        self.motion_sets().into_iter().find(|s| s.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<MotionSet>> {
        self.motion_sets().into_iter().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        read(&self.sets)
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
