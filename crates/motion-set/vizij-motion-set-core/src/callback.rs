//! Load strategies ("motion set callbacks") that turn an entry into a motion.
//!
//! A strategy is injected per set (see [`crate::MotionSet::set_callback`]) or
//! per context as the default for new sets. The set it serves is passed with
//! every request instead of being stored, so strategies can be shared between
//! sets and never keep a set alive.

use std::fmt;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;

use crate::entry::MotionEntry;
use crate::error::LoadError;
use crate::motion::{parse_motion_json, Motion};
use crate::motion_set::MotionSet;
use crate::sync::{read, write};

/// Everything a strategy needs to produce the motion for one entry.
pub struct MotionLoadRequest<'a> {
    /// Set that owns the load (its callback is the one being invoked).
    pub motion_set: &'a MotionSet,
    pub entry: &'a MotionEntry,
    /// Fully resolved location: absolute, or joined onto the media root.
    pub path: &'a str,
}

impl fmt::Debug for MotionLoadRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionLoadRequest")
            .field("motion_set", &self.motion_set.name())
            .field("entry", &self.entry.identifier())
            .field("path", &self.path)
            .finish()
    }
}

/// Pluggable policy for loading motions.
///
/// Implementations may block (file IO). They are called without any set or
/// entry lock held, so they are free to query the requesting set.
pub trait MotionSetCallback: Send + Sync + fmt::Debug {
    fn load_motion(&self, request: &MotionLoadRequest<'_>) -> Result<Arc<Motion>, LoadError>;
}

/// Default strategy: read the resolved path from disk and decode it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileMotionLoader;

impl MotionSetCallback for FileMotionLoader {
    fn load_motion(&self, request: &MotionLoadRequest<'_>) -> Result<Arc<Motion>, LoadError> {
        let text = fs::read_to_string(request.path).map_err(|source| LoadError::Io {
            path: request.path.to_string(),
            source,
        })?;
        let motion = parse_motion_json(&text).map_err(|reason| LoadError::Decode {
            path: request.path.to_string(),
            reason,
        })?;
        Ok(Arc::new(motion))
    }
}

/// Strategy serving pre-built motions from memory.
///
/// Motions are looked up by resolved path first, then by entry identifier.
/// Every invocation is counted, hits and misses alike.
#[derive(Debug, Default)]
pub struct InMemoryMotionLoader {
    by_path: RwLock<HashMap<String, Arc<Motion>>>,
    by_id: RwLock<HashMap<String, Arc<Motion>>>,
    calls: AtomicUsize,
}

impl InMemoryMotionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(self, path: impl Into<String>, motion: Motion) -> Self {
        self.insert_path(path, Arc::new(motion));
        self
    }

    pub fn with_id(self, id: impl Into<String>, motion: Motion) -> Self {
        self.insert_id(id, Arc::new(motion));
        self
    }

    pub fn insert_path(&self, path: impl Into<String>, motion: Arc<Motion>) {
        write(&self.by_path).insert(path.into(), motion);
    }

    pub fn insert_id(&self, id: impl Into<String>, motion: Arc<Motion>) {
        write(&self.by_id).insert(id.into(), motion);
    }

    pub fn remove_path(&self, path: &str) -> Option<Arc<Motion>> {
        write(&self.by_path).remove(path)
    }

    /// Number of `load_motion` calls served so far.
    pub fn load_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MotionSetCallback for InMemoryMotionLoader {
    fn load_motion(&self, request: &MotionLoadRequest<'_>) -> Result<Arc<Motion>, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(motion) = read(&self.by_path).get(request.path) {
            return Ok(motion.clone());
        }
        let id = request.entry.identifier();
        read(&self.by_id)
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| LoadError::Missing {
                path: request.path.to_string(),
            })
    }
}
