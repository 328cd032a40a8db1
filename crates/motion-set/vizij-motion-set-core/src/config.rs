//! Core configuration for vizij-motion-set-core.

use serde::{Deserialize, Serialize};

/// Context-wide settings applied when motion sets are created and resolved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base folder that relative motion locations are resolved against.
    #[serde(default)]
    pub media_root: String,

    /// Upper bound on the number of strings the id pool will intern.
    #[serde(default = "default_max_identifiers")]
    pub max_identifiers: u32,

    /// Initial `auto_unregister` flag for newly created sets.
    #[serde(default = "default_true")]
    pub auto_unregister: bool,

    /// Reject `add_child_set` calls that would turn the tree into a graph.
    #[serde(default = "default_true")]
    pub detect_cycles: bool,

    /// Capacity hint for the entry map of new sets.
    #[serde(default)]
    pub entry_capacity: usize,
}

fn default_max_identifiers() -> u32 {
    // u32::MAX is reserved for StringId::INVALID.
    u32::MAX - 1
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media_root: String::new(),
            max_identifiers: default_max_identifiers(),
            auto_unregister: true,
            detect_cycles: true,
            entry_capacity: 0,
        }
    }
}

impl Config {
    /// Parses config from JSON. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Convenience builder used by hosts that only care about the media root.
    pub fn with_media_root(mut self, media_root: impl Into<String>) -> Self {
        self.media_root = media_root.into();
        self
    }
}
