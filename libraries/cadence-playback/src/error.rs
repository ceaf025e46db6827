//! Error types for playback management

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why the media resource failed to load or play
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MediaFailure {
    /// Fetching the media failed
    #[error("network error")]
    Network,

    /// Media could not be decoded
    #[error("decode error")]
    Decode,

    /// Format or locator not supported by the platform
    #[error("unsupported media")]
    Unsupported,

    /// Browser refused to start playback without a user gesture
    #[error("playback blocked by autoplay policy")]
    AutoplayBlocked,

    /// Play request aborted because a newer load replaced the source
    #[error("superseded by a newer load")]
    Aborted,

    /// Anything else reported by the platform
    #[error("{0}")]
    Other(String),
}

impl MediaFailure {
    /// Supersede-induced aborts are not failures and are never reported
    pub fn is_supersede(&self) -> bool {
        matches!(self, MediaFailure::Aborted)
    }
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Item has no playable media locator
    #[error("Item {id} has no valid media locator")]
    InvalidItem { id: String },

    /// No item is currently loaded
    #[error("No item loaded")]
    NoItemLoaded,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Media resource failure
    #[error("Media error: {0}")]
    Media(#[from] MediaFailure),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
