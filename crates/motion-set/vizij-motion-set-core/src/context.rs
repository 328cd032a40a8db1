//! Shared state every motion set of one runtime agrees on: the string id pool,
//! the media root and the set registry.
//!
//! Nothing here is global. Hosts create one context at startup and hand it to
//! the sets they build; tests create an isolated context each.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::callback::{FileMotionLoader, MotionSetCallback};
use crate::config::Config;
use crate::entry::{is_absolute_location, MotionEntry};
use crate::error::MotionSetError;
use crate::motion::Motion;
use crate::registry::MotionSetRegistry;
use crate::string_pool::StringIdPool;
use crate::sync::{lock, read, write};

#[derive(Debug)]
pub struct MotionSetContext {
    config: Config,
    pool: Arc<StringIdPool>,
    media_root: RwLock<String>,
    default_callback: RwLock<Arc<dyn MotionSetCallback>>,
    registry: MotionSetRegistry,
    /// Serializes parent/child edits of every set in this context.
    tree: Mutex<()>,
}

impl MotionSetContext {
    pub fn new(config: Config) -> Arc<Self> {
        let pool = Arc::new(StringIdPool::with_limit(config.max_identifiers));
        Self::with_pool(config, pool)
    }

    /// Context that shares an existing pool (e.g. with another context).
    pub fn with_pool(config: Config, pool: Arc<StringIdPool>) -> Arc<Self> {
        Arc::new(Self {
            media_root: RwLock::new(config.media_root.clone()),
            config,
            pool,
            default_callback: RwLock::new(Arc::new(FileMotionLoader)),
            registry: MotionSetRegistry::new(),
            tree: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &Arc<StringIdPool> {
        &self.pool
    }

    pub fn registry(&self) -> &MotionSetRegistry {
        &self.registry
    }

    /// Held across the check and the link of a structural tree edit. Taken
    /// before any set lock.
    pub(crate) fn tree_guard(&self) -> MutexGuard<'_, ()> {
        lock(&self.tree)
    }

    pub fn media_root(&self) -> String {
        read(&self.media_root).clone()
    }

    /// Changing the root does not touch loaded motions; call
    /// [`crate::MotionSet::reload`] to re-resolve them.
    pub fn set_media_root(&self, root: impl Into<String>) {
        *write(&self.media_root) = root.into();
    }

    /// Strategy given to sets created from now on.
    pub fn default_callback(&self) -> Arc<dyn MotionSetCallback> {
        read(&self.default_callback).clone()
    }

    pub fn set_default_callback(&self, callback: Arc<dyn MotionSetCallback>) {
        *write(&self.default_callback) = callback;
    }

    /// Absolute locations are returned verbatim, relative ones are joined onto
    /// the media root.
    pub fn resolve_location(&self, location: &str) -> String {
        if is_absolute_location(location) {
            return location.to_string();
        }
        let root = read(&self.media_root);
        if root.is_empty() {
            return location.to_string();
        }
        if root.ends_with('/') || root.ends_with('\\') {
            format!("{root}{location}")
        } else {
            format!("{root}/{location}")
        }
    }

    /// Shorthand for [`MotionEntry::create`] against this context's pool.
    pub fn create_entry(
        &self,
        location: impl Into<String>,
        id: &str,
        motion: Option<Arc<Motion>>,
    ) -> Result<Arc<MotionEntry>, MotionSetError> {
        MotionEntry::create(&self.pool, location, id, motion)
    }
}
