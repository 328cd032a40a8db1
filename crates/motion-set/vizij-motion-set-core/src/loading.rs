//! Lazy, failure-cached motion loading for motion sets.
//!
//! `load_motion` never holds a set or entry lock while the strategy runs, so a
//! strategy may query the requesting set. When two threads load the same entry
//! concurrently the first stored motion wins and both callers receive it.

use std::ops::{AddAssign, ControlFlow};
use std::sync::Arc;

use log::{debug, warn};

use crate::callback::MotionLoadRequest;
use crate::entry::{LoadState, MotionEntry};
use crate::error::MotionSetError;
use crate::motion::Motion;
use crate::motion_set::MotionSet;
use crate::tree;

/// Per-entry outcome counts of a bulk load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
    /// Entries that already had a motion or a cached failure.
    pub skipped: usize,
}

impl AddAssign for LoadSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.loaded += rhs.loaded;
        self.failed += rhs.failed;
        self.skipped += rhs.skipped;
    }
}

impl MotionSet {
    /// Fully qualified location of `entry`: absolute locations verbatim,
    /// relative ones joined onto the context's media root.
    pub fn construct_motion_filename(&self, entry: &MotionEntry) -> String {
        self.context().resolve_location(&entry.location())
    }

    /// Returns the entry's motion, loading it through this set's callback if
    /// needed. Failures are cached on the entry and not retried until
    /// [`MotionEntry::reset`].
    pub fn load_motion(&self, entry: &MotionEntry) -> Result<Arc<Motion>, MotionSetError> {
        match entry.load_state() {
            LoadState::Loaded(motion) => return Ok(motion),
            LoadState::Failed => {
                return Err(MotionSetError::LoadFailed {
                    id: entry.identifier(),
                    path: self.construct_motion_filename(entry),
                    reason: "previous load attempt failed".into(),
                })
            }
            LoadState::NotLoaded => {}
        }

        let path = self.construct_motion_filename(entry);
        let callback = self.callback();
        debug!(
            "motion set '{}': loading '{}' from '{}'",
            self.name(),
            entry.identifier(),
            path
        );
        let request = MotionLoadRequest {
            motion_set: self,
            entry,
            path: &path,
        };
        match callback.load_motion(&request) {
            Ok(motion) => Ok(entry.store_loaded(motion)),
            Err(err) => {
                if let Some(existing) = entry.store_failed() {
                    return Ok(existing);
                }
                warn!(
                    "motion set '{}': failed to load motion '{}' from '{}': {}",
                    self.name(),
                    entry.identifier(),
                    path,
                    err
                );
                Err(MotionSetError::LoadFailed {
                    id: entry.identifier(),
                    path,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Loads every entry of this set and its descendants that has neither a
    /// motion nor a cached failure. Individual failures do not stop the walk.
    pub fn preload(&self) -> LoadSummary {
        self.for_each_set(|set| set.preload_own_entries(false))
    }

    /// Resets every entry of the subtree and loads it again, e.g. after the
    /// media root changed.
    pub fn reload(&self) -> LoadSummary {
        self.for_each_set(|set| set.preload_own_entries(true))
    }

    fn for_each_set(&self, mut per_set: impl FnMut(&MotionSet) -> LoadSummary) -> LoadSummary {
        let mut summary = per_set(self);
        let _ = tree::visit_descendants::<()>(self, &mut |child| {
            summary += per_set(child);
            ControlFlow::Continue(())
        });
        summary
    }

    fn preload_own_entries(&self, reset_first: bool) -> LoadSummary {
        let mut summary = LoadSummary::default();
        for (_, entry) in self.motion_entries() {
            if reset_first {
                entry.reset();
            } else if !matches!(entry.load_state(), LoadState::NotLoaded) {
                summary.skipped += 1;
                continue;
            }
            match self.load_motion(&entry) {
                Ok(_) => summary.loaded += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }
}
