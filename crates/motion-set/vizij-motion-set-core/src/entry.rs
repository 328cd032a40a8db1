//! Motion entries: one identifier → location → loaded motion binding.
//!
//! Entries are shared as `Arc<MotionEntry>` so callers can hold on to the exact
//! entry a set returned; identity is pointer identity (`Arc::ptr_eq`). The
//! mutable part sits behind its own mutex, which is always taken after (never
//! before) the owning set's lock.

use std::sync::{Arc, Mutex};

use crate::error::MotionSetError;
use crate::ids::StringId;
use crate::motion::Motion;
use crate::string_pool::StringIdPool;
use crate::sync::lock;

/// Load progress of an entry.
///
/// `Failed` carries no motion: a cached failure and a loaded motion can never
/// coexist.
#[derive(Clone, Debug, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loaded(Arc<Motion>),
    Failed,
}

impl LoadState {
    pub fn motion(&self) -> Option<&Arc<Motion>> {
        match self {
            LoadState::Loaded(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryState {
    location: String,
    string_id: StringId,
    load: LoadState,
}

#[derive(Debug)]
pub struct MotionEntry {
    pool: Arc<StringIdPool>,
    state: Mutex<EntryState>,
}

impl MotionEntry {
    /// Entry with no identifier and an empty location.
    pub fn new(pool: &Arc<StringIdPool>) -> Arc<Self> {
        Arc::new(Self {
            pool: pool.clone(),
            state: Mutex::new(EntryState::default()),
        })
    }

    /// Entry for `location`, keyed by the interned `id`.
    pub fn create(
        pool: &Arc<StringIdPool>,
        location: impl Into<String>,
        id: &str,
        motion: Option<Arc<Motion>>,
    ) -> Result<Arc<Self>, MotionSetError> {
        let string_id = pool.intern(id)?;
        Ok(Arc::new(Self {
            pool: pool.clone(),
            state: Mutex::new(EntryState {
                location: location.into(),
                string_id,
                load: motion.map(LoadState::Loaded).unwrap_or_default(),
            }),
        }))
    }

    pub fn location(&self) -> String {
        lock(&self.state).location.clone()
    }

    /// No existence check; the path is only resolved when loading.
    pub fn set_location(&self, location: impl Into<String>) {
        lock(&self.state).location = location.into();
    }

    pub fn motion(&self) -> Option<Arc<Motion>> {
        lock(&self.state).load.motion().cloned()
    }

    /// `Some` marks the entry loaded. `None` forgets a loaded motion but keeps
    /// a cached failure in place.
    pub fn set_motion(&self, motion: Option<Arc<Motion>>) {
        let mut state = lock(&self.state);
        match motion {
            Some(m) => state.load = LoadState::Loaded(m),
            None => {
                if matches!(state.load, LoadState::Loaded(_)) {
                    state.load = LoadState::NotLoaded;
                }
            }
        }
    }

    pub fn string_id(&self) -> StringId {
        lock(&self.state).string_id
    }

    pub(crate) fn set_string_id(&self, id: StringId) {
        lock(&self.state).string_id = id;
    }

    /// Identifier text, or an empty string when no id is assigned.
    pub fn identifier(&self) -> String {
        let id = self.string_id();
        self.pool
            .lookup(id)
            .map(|s| s.to_string())
            .unwrap_or_default()
    }

    pub fn load_state(&self) -> LoadState {
        lock(&self.state).load.clone()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(lock(&self.state).load, LoadState::Loaded(_))
    }

    pub fn is_load_failed(&self) -> bool {
        matches!(lock(&self.state).load, LoadState::Failed)
    }

    /// `true` drops any loaded motion and blocks on-demand loading;
    /// `false` clears a cached failure.
    pub fn set_load_failed(&self, failed: bool) {
        let mut state = lock(&self.state);
        if failed {
            state.load = LoadState::Failed;
        } else if matches!(state.load, LoadState::Failed) {
            state.load = LoadState::NotLoaded;
        }
    }

    /// Forget both the motion and any cached failure so the next access reloads.
    pub fn reset(&self) {
        lock(&self.state).load = LoadState::NotLoaded;
    }

    pub fn is_absolute_location(&self) -> bool {
        is_absolute_location(&lock(&self.state).location)
    }

    pub fn is_absolute_path(path: &str) -> bool {
        is_absolute_location(path)
    }

    /// Whether the identifier was interned in `pool`.
    pub(crate) fn uses_pool(&self, pool: &Arc<StringIdPool>) -> bool {
        Arc::ptr_eq(&self.pool, pool)
    }

    /// Store a freshly loaded motion unless another loader got there first.
    /// Returns the motion that ended up on the entry.
    pub(crate) fn store_loaded(&self, motion: Arc<Motion>) -> Arc<Motion> {
        let mut state = lock(&self.state);
        if let LoadState::Loaded(existing) = &state.load {
            return existing.clone();
        }
        state.load = LoadState::Loaded(motion.clone());
        motion
    }

    /// Record a failed attempt. A motion stored concurrently wins and is returned.
    pub(crate) fn store_failed(&self) -> Option<Arc<Motion>> {
        let mut state = lock(&self.state);
        if let LoadState::Loaded(existing) = &state.load {
            return Some(existing.clone());
        }
        state.load = LoadState::Failed;
        None
    }
}

/// Platform heuristic separating absolute paths from media-root relative ones.
///
/// A leading `/` or `\` is absolute everywhere. On Windows a drive letter
/// followed by `:` and a separator is absolute too.
pub fn is_absolute_location(path: &str) -> bool {
    let bytes = path.as_bytes();
    if matches!(bytes.first(), Some(b'/' | b'\\')) {
        return true;
    }
    cfg!(windows)
        && bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'/' | b'\\')
}
