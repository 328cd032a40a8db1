//! Motion sets: named, hierarchical maps from interned motion ids to entries.
//!
//! A set is shared as `Arc<MotionSet>`. It owns its entries and (strongly) its
//! child sets; the parent link is a `Weak` back-reference so a tree never forms
//! an ownership cycle.
//!
//! Locking: every set guards its own state with one mutex and never holds it
//! while locking another set. Recursive operations copy the child list out,
//! release the lock and then descend, so a search over a subtree that is being
//! edited concurrently observes each visited set consistently but not the
//! subtree as a whole. Entry locks may be taken while a set lock is held,
//! never the other way around.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use hashbrown::HashMap;
use log::{debug, info};

use crate::callback::MotionSetCallback;
use crate::context::MotionSetContext;
use crate::entry::MotionEntry;
use crate::error::MotionSetError;
use crate::ids::{MotionSetId, StringId};
use crate::motion::Motion;
use crate::sync::lock;
use crate::tree;

struct MotionSetState {
    id: MotionSetId,
    name: String,
    filename: String,
    dirty: bool,
    auto_unregister: bool,
    #[cfg(feature = "development")]
    owned_by_runtime: bool,
    entries: HashMap<StringId, Arc<MotionEntry>>,
    children: Vec<Arc<MotionSet>>,
    parent: Weak<MotionSet>,
    callback: Arc<dyn MotionSetCallback>,
}

pub struct MotionSet {
    ctx: Arc<MotionSetContext>,
    state: Mutex<MotionSetState>,
}

impl MotionSet {
    /// Creates a set registered with `ctx`, optionally appended to `parent`'s children.
    pub fn create(
        ctx: &Arc<MotionSetContext>,
        name: impl Into<String>,
        parent: Option<&Arc<MotionSet>>,
    ) -> Arc<Self> {
        let cfg = ctx.config();
        let set = Arc::new(Self {
            state: Mutex::new(MotionSetState {
                id: ctx.registry().allocate_id(),
                name: name.into(),
                filename: String::new(),
                dirty: false,
                auto_unregister: cfg.auto_unregister,
                #[cfg(feature = "development")]
                owned_by_runtime: false,
                entries: HashMap::with_capacity(cfg.entry_capacity),
                children: Vec::new(),
                parent: Weak::new(),
                callback: ctx.default_callback(),
            }),
            ctx: ctx.clone(),
        });
        ctx.registry().register(&set);
        if let Some(parent) = parent {
            // A brand-new set cannot be an ancestor of anything.
            let _tree = parent.ctx.tree_guard();
            parent.link_child(&set);
        }
        debug!("motion set '{}' ({}) created", set.name(), set.id());
        set
    }

    fn state(&self) -> MutexGuard<'_, MotionSetState> {
        lock(&self.state)
    }

    pub fn context(&self) -> &Arc<MotionSetContext> {
        &self.ctx
    }

    // ----- identity and bookkeeping -----

    pub fn id(&self) -> MotionSetId {
        self.state().id
    }

    /// Structural, so the dirty flag is left alone. Keeping ids unique within
    /// the registry is up to the caller.
    pub fn set_id(&self, id: MotionSetId) {
        self.state().id = id;
    }

    pub fn name(&self) -> String {
        self.state().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let mut state = self.state();
        state.name = name.into();
        state.dirty = true;
    }

    /// Origin path of the set's own definition, empty when never persisted.
    pub fn filename(&self) -> String {
        self.state().filename.clone()
    }

    pub fn set_filename(&self, filename: impl Into<String>) {
        let mut state = self.state();
        state.filename = filename.into();
        state.dirty = true;
    }

    pub fn dirty_flag(&self) -> bool {
        self.state().dirty
    }

    pub fn set_dirty_flag(&self, dirty: bool) {
        self.state().dirty = dirty;
    }

    pub fn auto_unregister(&self) -> bool {
        self.state().auto_unregister
    }

    pub fn set_auto_unregister(&self, enabled: bool) {
        self.state().auto_unregister = enabled;
    }

    /// Whether the set belongs to the engine runtime rather than the tool suite.
    /// Always `false` without the `development` feature.
    pub fn is_owned_by_runtime(&self) -> bool {
        #[cfg(feature = "development")]
        {
            self.state().owned_by_runtime
        }
        #[cfg(not(feature = "development"))]
        {
            false
        }
    }

    #[cfg_attr(not(feature = "development"), allow(unused_variables))]
    pub fn set_owned_by_runtime(&self, owned: bool) {
        #[cfg(feature = "development")]
        {
            self.state().owned_by_runtime = owned;
        }
    }

    pub fn callback(&self) -> Arc<dyn MotionSetCallback> {
        self.state().callback.clone()
    }

    /// Replaces the load strategy. Already loaded motions are kept.
    pub fn set_callback(&self, callback: Arc<dyn MotionSetCallback>) {
        self.state().callback = callback;
    }

    // ----- entries -----

    /// Inserts `entry` under its id, replacing any entry with the same id.
    pub fn add_motion_entry(&self, entry: Arc<MotionEntry>) -> Result<(), MotionSetError> {
        // Keys only mean something within the pool they were interned in.
        if !entry.uses_pool(self.ctx.pool()) {
            return Err(MotionSetError::ForeignContext {
                what: format!("motion entry '{}'", entry.location()),
            });
        }
        let mut state = self.state();
        let id = entry.string_id();
        if !id.is_valid() {
            return Err(MotionSetError::MissingIdentifier {
                location: entry.location(),
            });
        }
        state.entries.insert(id, entry);
        state.dirty = true;
        Ok(())
    }

    pub fn reserve_motion_entries(&self, additional: usize) {
        self.state().entries.reserve(additional);
    }

    pub fn num_motion_entries(&self) -> usize {
        self.state().entries.len()
    }

    /// Snapshot of all entries, ordered by string id.
    pub fn motion_entries(&self) -> Vec<(StringId, Arc<MotionEntry>)> {
        let mut entries: Vec<_> = self
            .state()
            .entries
            .iter()
            .map(|(id, e)| (*id, e.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Removes `entry` if this set holds that exact entry under its id.
    pub fn remove_motion_entry(&self, entry: &Arc<MotionEntry>) {
        let mut state = self.state();
        let id = entry.string_id();
        let owned = state
            .entries
            .get(&id)
            .is_some_and(|e| Arc::ptr_eq(e, entry));
        if owned {
            state.entries.remove(&id);
            state.dirty = true;
        }
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.dirty = true;
    }

    /// Re-keys `entry` under `new_id`. On error the set and the entry are unchanged.
    pub fn set_motion_entry_id(
        &self,
        entry: &Arc<MotionEntry>,
        new_id: &str,
    ) -> Result<(), MotionSetError> {
        let mut state = self.state();
        let old = entry.string_id();
        let owned = state
            .entries
            .get(&old)
            .is_some_and(|e| Arc::ptr_eq(e, entry));
        if !owned {
            return Err(MotionSetError::NotFound {
                what: format!(
                    "motion entry '{}' in motion set '{}'",
                    entry.identifier(),
                    state.name
                ),
            });
        }

        let new = self.ctx.pool().intern(new_id)?;
        if new == old {
            return Ok(());
        }
        if state.entries.contains_key(&new) {
            return Err(MotionSetError::DuplicateIdentifier {
                id: new_id.to_string(),
                set: state.name.clone(),
            });
        }

        if let Some(e) = state.entries.remove(&old) {
            e.set_string_id(new);
            state.entries.insert(new, e);
        }
        state.dirty = true;
        Ok(())
    }

    /// First entry whose loaded motion is `motion` (pointer identity).
    pub fn find_motion_entry(&self, motion: &Arc<Motion>) -> Option<Arc<MotionEntry>> {
        self.state()
            .entries
            .values()
            .find(|e| e.motion().is_some_and(|m| Arc::ptr_eq(&m, motion)))
            .cloned()
    }

    /// Entry with the given id in this set only.
    pub fn find_motion_entry_by_string_id(&self, id: &str) -> Option<Arc<MotionEntry>> {
        // Unknown text cannot be a key; avoid growing the pool on lookups.
        let string_id = self.ctx.pool().find(id)?;
        self.state().entries.get(&string_id).cloned()
    }

    /// Searches this set, then its descendants depth-first. Parents are never consulted.
    pub fn recursive_find_motion_entry_by_string_id(&self, id: &str) -> Option<Arc<MotionEntry>> {
        tree::find_entry(self, id)
    }

    /// Like [`Self::recursive_find_motion_entry_by_string_id`] but yields the
    /// motion, loading it through the owning set when `load_on_demand` is set.
    pub fn recursive_find_motion_by_string_id(
        &self,
        id: &str,
        load_on_demand: bool,
    ) -> Option<Arc<Motion>> {
        tree::find_motion(self, id, load_on_demand)
    }

    /// Identifiers of all entries, sorted.
    pub fn build_id_string_list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .motion_entries()
            .into_iter()
            .map(|(_, e)| e.identifier())
            .collect();
        ids.sort();
        ids
    }

    /// Number of entries whose loaded motion carries morph tracks. Entries are
    /// not loaded for this.
    pub fn num_morph_motions(&self) -> usize {
        self.motion_entries()
            .iter()
            .filter(|(_, e)| e.motion().is_some_and(|m| m.has_morph_data()))
            .count()
    }

    /// Every distinct loaded motion of this set and its descendants.
    pub fn recursive_get_motions(&self) -> Vec<Arc<Motion>> {
        tree::collect_motions(self)
    }

    // ----- tree -----

    /// Appends `child` and points its parent link at this set.
    ///
    /// Re-adding an existing child is a no-op. A child still attached to another
    /// set is detached from it first.
    pub fn add_child_set(self: &Arc<Self>, child: &Arc<MotionSet>) -> Result<(), MotionSetError> {
        if !Arc::ptr_eq(&self.ctx, &child.ctx) {
            return Err(MotionSetError::ForeignContext {
                what: format!("motion set '{}'", child.name()),
            });
        }
        let _tree = self.ctx.tree_guard();
        if self.ctx.config().detect_cycles && tree::is_self_or_ancestor(self, child) {
            return Err(MotionSetError::CycleDetected {
                parent: self.name(),
                child: child.name(),
            });
        }
        match child.parent_set() {
            Some(current) if Arc::ptr_eq(&current, self) => {
                if self.state().children.iter().any(|c| Arc::ptr_eq(c, child)) {
                    return Ok(());
                }
            }
            Some(current) => current.unlink_child(child),
            None => {}
        }
        self.link_child(child);
        Ok(())
    }

    fn link_child(self: &Arc<Self>, child: &Arc<MotionSet>) {
        child.state().parent = Arc::downgrade(self);
        self.state().children.push(child.clone());
        debug!("motion set '{}' added under '{}'", child.name(), self.name());
    }

    fn unlink_child(&self, child: &MotionSet) {
        let target: *const MotionSet = child;
        let mut state = self.state();
        if let Some(pos) = state
            .children
            .iter()
            .position(|c| std::ptr::eq(Arc::as_ptr(c), target))
        {
            state.children.remove(pos);
        }
    }

    pub fn num_child_sets(&self) -> usize {
        self.state().children.len()
    }

    pub fn child_set(&self, index: usize) -> Result<Arc<MotionSet>, MotionSetError> {
        let state = self.state();
        state
            .children
            .get(index)
            .cloned()
            .ok_or(MotionSetError::IndexOutOfBounds {
                index,
                len: state.children.len(),
            })
    }

    /// Snapshot of the direct children in insertion order.
    pub fn child_sets(&self) -> Vec<Arc<MotionSet>> {
        self.state().children.clone()
    }

    /// This set and all descendants, pre-order. `Some(flag)` keeps only sets
    /// whose `owned_by_runtime` equals `flag`.
    pub fn recursive_get_motion_sets(
        self: &Arc<Self>,
        owned_by_runtime: Option<bool>,
    ) -> Vec<Arc<MotionSet>> {
        tree::collect_sets(self, owned_by_runtime)
    }

    /// Detaches (does not destroy) the first child with the given id. The
    /// child's parent link is left as is.
    pub fn remove_child_set_by_id(&self, id: MotionSetId) {
        let _tree = self.ctx.tree_guard();
        // Child ids are read without holding our own lock.
        if let Some(child) = self.child_sets().into_iter().find(|c| c.id() == id) {
            self.unlink_child(&child);
        }
    }

    /// Clears the parent link. Does not touch the former parent's child list.
    pub fn clear_parent_set(&self) {
        self.state().parent = Weak::new();
    }

    pub fn parent_set(&self) -> Option<Arc<MotionSet>> {
        self.state().parent.upgrade()
    }

    pub fn find_root_motion_set(self: &Arc<Self>) -> Arc<MotionSet> {
        tree::find_root(self)
    }

    /// Exact, case-sensitive name match among this set and its descendants,
    /// restricted to sets whose `owned_by_runtime` equals the given flag.
    pub fn recursive_find_motion_set_by_name(
        self: &Arc<Self>,
        name: &str,
        owned_by_runtime: bool,
    ) -> Option<Arc<MotionSet>> {
        tree::find_set_by_name(self, name, owned_by_runtime)
    }

    // ----- lifecycle -----

    /// Releases all entries, detaches from the parent and, with
    /// `auto_unregister`, leaves the registry. Child sets are left untouched.
    pub fn destroy(&self) {
        let tree = self.ctx.tree_guard();
        let (parent, auto_unregister) = {
            let mut state = self.state();
            state.entries.clear();
            let parent = state.parent.upgrade();
            state.parent = Weak::new();
            (parent, state.auto_unregister)
        };
        if let Some(parent) = parent {
            parent.unlink_child(self);
        }
        drop(tree);
        if auto_unregister {
            self.ctx.registry().unregister(self);
        }
        debug!("motion set '{}' destroyed", self.name());
    }

    /// Dumps the set and its entries at info level.
    pub fn log(&self) {
        let entries = self.motion_entries();
        let (name, filename, children) = {
            let state = self.state();
            (state.name.clone(), state.filename.clone(), state.children.len())
        };
        info!(
            "motion set '{}' (id {}, file '{}'): {} entries, {} child sets",
            name,
            self.id(),
            filename,
            entries.len(),
            children
        );
        for (index, (_, entry)) in entries.iter().enumerate() {
            info!(
                "  #{index}: id='{}' location='{}' state={:?}",
                entry.identifier(),
                entry.location(),
                entry.load_state()
            );
        }
    }
}

impl fmt::Debug for MotionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MotionSet")
            .field("id", &state.id)
            .field("name", &state.name)
            .field("filename", &state.filename)
            .field("dirty", &state.dirty)
            .field("entries", &state.entries.len())
            .field("children", &state.children.len())
            .finish()
    }
}

impl Drop for MotionSet {
    fn drop(&mut self) {
        let auto_unregister = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .auto_unregister;
        if auto_unregister {
            self.ctx.registry().unregister(self);
        }
    }
}
