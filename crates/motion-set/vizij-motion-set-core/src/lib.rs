//! Vizij Motion Set Core
//!
//! Hierarchical registry of named motion references. A [`MotionSet`] maps short
//! interned identifiers to [`MotionEntry`] values, loads their motions lazily
//! through a pluggable [`MotionSetCallback`], caches load failures per entry,
//! and can be arranged in a tree whose recursive lookups search downward from
//! the set they start at.
//!
//! All shared state (string id pool, media root, set registry) lives in a
//! [`MotionSetContext`] that is passed in explicitly.

pub mod callback;
pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod ids;
pub mod loading;
pub mod motion;
pub mod motion_set;
pub mod registry;
pub mod string_pool;
mod sync;
pub mod tree;

// Re-exports for consumers (adapters)
pub use callback::{FileMotionLoader, InMemoryMotionLoader, MotionLoadRequest, MotionSetCallback};
pub use config::Config;
pub use context::MotionSetContext;
pub use entry::{is_absolute_location, LoadState, MotionEntry};
pub use error::{LoadError, MotionSetError};
pub use ids::{IdAllocator, MotionSetId, StringId};
pub use loading::LoadSummary;
pub use motion::{parse_motion_json, Motion, MotionKey, MotionTrack, TrackKind};
pub use motion_set::MotionSet;
pub use registry::MotionSetRegistry;
pub use string_pool::StringIdPool;
