//! Volume and mute state
//!
//! Volume is a linear 0.0-1.0 level, matching the media element's `volume`
//! property. Muting preserves the stored level.

use tracing::trace;

/// Volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Stored level (0.0-1.0)
    level: f32,

    /// Mute state (preserves level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (0.0-1.0, default: 0.8)
    pub fn new(level: f32) -> Self {
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            0.8
        };

        Self {
            level,
            muted: false,
        }
    }

    /// Set volume level (clamped to 0.0-1.0)
    ///
    /// Moving the level unmutes; a level of exactly 0 reads as muted.
    /// Non-finite input is ignored. Returns whether anything changed.
    pub fn set_level(&mut self, level: f32) -> bool {
        if !level.is_finite() {
            trace!(level, "ignoring non-finite volume");
            return false;
        }

        let level = level.clamp(0.0, 1.0);
        let muted = level == 0.0;
        let changed = level != self.level || muted != self.muted;
        self.level = level;
        self.muted = muted;
        changed
    }

    /// Get stored volume level (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level actually applied to the output
    ///
    /// Returns 0.0 if muted, otherwise the stored level.
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.8)
    }
}
