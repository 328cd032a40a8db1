//! Traversal helpers over motion set trees.
//!
//! Everything here goes through the public [`MotionSet`] API: each visited set
//! is locked only long enough to copy out what the walk needs. Traversals are
//! depth-first, pre-order, children in insertion order.

use std::ops::ControlFlow;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::entry::MotionEntry;
use crate::motion::Motion;
use crate::motion_set::MotionSet;

/// Visits every descendant of `set` (not `set` itself) until `visit` breaks.
pub fn visit_descendants<B>(
    set: &MotionSet,
    visit: &mut impl FnMut(&Arc<MotionSet>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    for child in set.child_sets() {
        visit(&child)?;
        visit_descendants(&child, visit)?;
    }
    ControlFlow::Continue(())
}

/// Walks parent links up to the set without a parent.
pub fn find_root(set: &Arc<MotionSet>) -> Arc<MotionSet> {
    let mut current = set.clone();
    while let Some(parent) = current.parent_set() {
        current = parent;
    }
    current
}

/// Whether `candidate` is `set` or one of its ancestors.
pub fn is_self_or_ancestor(set: &Arc<MotionSet>, candidate: &Arc<MotionSet>) -> bool {
    let mut current = Some(set.clone());
    while let Some(node) = current {
        if Arc::ptr_eq(&node, candidate) {
            return true;
        }
        current = node.parent_set();
    }
    false
}

pub fn collect_sets(set: &Arc<MotionSet>, owned_by_runtime: Option<bool>) -> Vec<Arc<MotionSet>> {
    let keep = |s: &MotionSet| owned_by_runtime.map_or(true, |flag| s.is_owned_by_runtime() == flag);
    let mut out = Vec::new();
    if keep(set) {
        out.push(set.clone());
    }
    let _ = visit_descendants::<()>(set, &mut |child| {
        if keep(child) {
            out.push(child.clone());
        }
        ControlFlow::Continue(())
    });
    out
}

pub fn find_entry(set: &MotionSet, id: &str) -> Option<Arc<MotionEntry>> {
    if let Some(entry) = set.find_motion_entry_by_string_id(id) {
        return Some(entry);
    }
    match visit_descendants(set, &mut |child| match child.find_motion_entry_by_string_id(id) {
        Some(entry) => ControlFlow::Break(entry),
        None => ControlFlow::Continue(()),
    }) {
        ControlFlow::Break(entry) => Some(entry),
        ControlFlow::Continue(()) => None,
    }
}

/// The first set holding `id` decides the result, even if its load fails.
pub fn find_motion(set: &MotionSet, id: &str, load_on_demand: bool) -> Option<Arc<Motion>> {
    let resolve = |owner: &MotionSet, entry: &MotionEntry| {
        if load_on_demand {
            owner.load_motion(entry).ok()
        } else {
            entry.motion()
        }
    };
    if let Some(entry) = set.find_motion_entry_by_string_id(id) {
        return resolve(set, &entry);
    }
    match visit_descendants(set, &mut |child| match child.find_motion_entry_by_string_id(id) {
        Some(entry) => ControlFlow::Break(resolve(child, &entry)),
        None => ControlFlow::Continue(()),
    }) {
        ControlFlow::Break(found) => found,
        ControlFlow::Continue(()) => None,
    }
}

pub fn find_set_by_name(
    set: &Arc<MotionSet>,
    name: &str,
    owned_by_runtime: bool,
) -> Option<Arc<MotionSet>> {
    let is_match = |s: &MotionSet| s.is_owned_by_runtime() == owned_by_runtime && s.name() == name;
    if is_match(set) {
        return Some(set.clone());
    }
    match visit_descendants(set, &mut |child| {
        if is_match(child) {
            ControlFlow::Break(child.clone())
        } else {
            ControlFlow::Continue(())
        }
    }) {
        ControlFlow::Break(found) => Some(found),
        ControlFlow::Continue(()) => None,
    }
}

/// Loaded motions of the subtree, deduplicated by identity, in visit order.
pub fn collect_motions(set: &MotionSet) -> Vec<Arc<Motion>> {
    let mut seen: HashSet<*const Motion> = HashSet::new();
    let mut out = Vec::new();
    let mut gather = |s: &MotionSet| {
        for (_, entry) in s.motion_entries() {
            if let Some(motion) = entry.motion() {
                if seen.insert(Arc::as_ptr(&motion)) {
                    out.push(motion);
                }
            }
        }
    };
    gather(set);
    let _ = visit_descendants::<()>(set, &mut |child| {
        gather(child);
        ControlFlow::Continue(())
    });
    out
}
