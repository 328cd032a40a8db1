//! Append-only string interning used as the key space of motion sets.
//!
//! Every identifier string maps to one [`StringId`] for the lifetime of the pool.
//! Ids are dense indices into the backing vector and are never reused.

use std::sync::{Arc, RwLock};

use hashbrown::HashMap;

use crate::error::MotionSetError;
use crate::ids::StringId;
use crate::sync::{read, write};

#[derive(Debug, Default)]
struct PoolInner {
    by_text: HashMap<Arc<str>, StringId>,
    strings: Vec<Arc<str>>,
}

/// Thread-safe string id pool. Share it as `Arc<StringIdPool>`.
#[derive(Debug)]
pub struct StringIdPool {
    inner: RwLock<PoolInner>,
    limit: u32,
}

impl Default for StringIdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringIdPool {
    pub fn new() -> Self {
        Self::with_limit(u32::MAX - 1)
    }

    /// Pool that refuses to grow beyond `limit` strings.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            inner: RwLock::new(PoolInner::default()),
            // u32::MAX is StringId::INVALID and can never be handed out.
            limit: limit.min(u32::MAX - 1),
        }
    }

    /// Returns the id of `text`, interning it on first sight.
    pub fn intern(&self, text: &str) -> Result<StringId, MotionSetError> {
        if text.is_empty() {
            return Err(MotionSetError::InternFailure {
                text: String::new(),
                reason: "identifier is empty".into(),
            });
        }
        if let Some(id) = self.find(text) {
            return Ok(id);
        }

        let mut inner = write(&self.inner);
        // Another writer may have interned the same text between the two locks.
        if let Some(id) = inner.by_text.get(text) {
            return Ok(*id);
        }
        if inner.strings.len() as u64 >= u64::from(self.limit) {
            return Err(MotionSetError::InternFailure {
                text: text.to_string(),
                reason: format!("string id pool exhausted ({} entries)", self.limit),
            });
        }
        let id = StringId(inner.strings.len() as u32);
        let shared: Arc<str> = Arc::from(text);
        inner.strings.push(shared.clone());
        inner.by_text.insert(shared, id);
        Ok(id)
    }

    /// Id of an already interned string. Never grows the pool.
    pub fn find(&self, text: &str) -> Option<StringId> {
        read(&self.inner).by_text.get(text).copied()
    }

    /// Reverse lookup. `None` for [`StringId::INVALID`] and unknown ids.
    pub fn lookup(&self, id: StringId) -> Option<Arc<str>> {
        if !id.is_valid() {
            return None;
        }
        read(&self.inner).strings.get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.inner).strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
