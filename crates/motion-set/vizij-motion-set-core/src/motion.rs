//! Motion resource model and the JSON decoder used by the default loader.
//!
//! Motions are immutable once loaded and shared as `Arc<Motion>` between every
//! entry (in any set) that references them.

use serde::{Deserialize, Serialize};

/// What a track drives. Only `Morph` matters to the set layer (morph counting).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Transform,
    #[default]
    Scalar,
    Morph,
    Event,
}

/// A single key in normalized time [0..1].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MotionKey {
    pub stamp: f32,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MotionTrack {
    pub id: String,
    /// Canonical target path (e.g., "rig/hips.translation")
    #[serde(rename = "animatableId")]
    pub animatable_id: String,
    #[serde(default)]
    pub kind: TrackKind,
    #[serde(default)]
    pub points: Vec<MotionKey>,
}

/// A loaded motion.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Motion {
    pub name: String,
    /// Duration in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u32,
    #[serde(default)]
    pub tracks: Vec<MotionTrack>,
}

impl Motion {
    /// Empty motion, handy for in-memory loaders and tests.
    pub fn new(name: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            name: name.into(),
            duration_ms,
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: MotionTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn has_morph_data(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Morph)
    }

    /// Validate basic invariants (monotonic stamps in [0,1], non-zero duration).
    pub fn validate_basic(&self) -> Result<(), String> {
        if self.duration_ms == 0 {
            return Err(format!("motion '{}' must have a duration > 0 ms", self.name));
        }
        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for p in &track.points {
                if !p.stamp.is_finite() || p.stamp < 0.0 || p.stamp > 1.0 {
                    return Err(format!(
                        "key stamp must be in [0,1] and finite for '{}'",
                        track.animatable_id
                    ));
                }
                if p.stamp < last {
                    return Err(format!(
                        "key stamps must be non-decreasing for '{}'",
                        track.animatable_id
                    ));
                }
                last = p.stamp;
            }
        }
        Ok(())
    }
}

impl MotionTrack {
    pub fn new(id: impl Into<String>, animatable_id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            animatable_id: animatable_id.into(),
            kind,
            points: Vec::new(),
        }
    }
}

/// Parse a motion document and validate it.
pub fn parse_motion_json(s: &str) -> Result<Motion, String> {
    let motion: Motion = serde_json::from_str(s).map_err(|e| format!("parse error: {e}"))?;
    motion.validate_basic()?;
    Ok(motion)
}
