//! Core types for playback management

use serde::{Deserialize, Serialize};
use url::Url;

/// URL schemes accepted as playable media locators
const PLAYABLE_SCHEMES: &[&str] = &["http", "https", "blob", "data", "file"];

/// Upper bound for the recently-played list
pub const MAX_HISTORY_SIZE: usize = 500;

/// A music track from the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier from the API
    pub id: String,

    /// Track title
    pub title: String,

    /// Media locator (URL of the audio file)
    pub audio_url: String,

    /// Artist name
    pub artist: String,

    /// Track duration in seconds, when the API knows it
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Cover artwork URL (optional)
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// A podcast episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Unique episode identifier from the API
    pub id: String,

    /// Episode title
    pub title: String,

    /// Media locator (URL of the audio file)
    pub audio_url: String,

    /// Owning podcast identifier
    pub podcast_id: String,

    /// Owning podcast title (shown as subtitle)
    pub podcast_title: String,

    /// Episode number within the podcast (optional)
    #[serde(default)]
    pub episode_number: Option<u32>,

    /// Episode duration in seconds, when the API knows it
    #[serde(default)]
    pub duration_secs: Option<f64>,

    /// Podcast artwork URL (optional)
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Anything the player can play
///
/// Views pattern-match on the variant instead of probing for optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlayableItem {
    /// Music track
    Track(Track),

    /// Podcast episode
    Episode(Episode),
}

/// Discriminant of a [`PlayableItem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Track,
    Episode,
}

impl PlayableItem {
    pub fn id(&self) -> &str {
        match self {
            PlayableItem::Track(t) => &t.id,
            PlayableItem::Episode(e) => &e.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PlayableItem::Track(t) => &t.title,
            PlayableItem::Episode(e) => &e.title,
        }
    }

    /// Media locator handed to the adapter on load
    pub fn locator(&self) -> &str {
        match self {
            PlayableItem::Track(t) => &t.audio_url,
            PlayableItem::Episode(e) => &e.audio_url,
        }
    }

    /// Display line under the title: artist for tracks, podcast for episodes
    pub fn subtitle(&self) -> &str {
        match self {
            PlayableItem::Track(t) => &t.artist,
            PlayableItem::Episode(e) => &e.podcast_title,
        }
    }

    /// Duration hint from the catalogue (the media element is authoritative)
    pub fn duration_secs(&self) -> Option<f64> {
        let hint = match self {
            PlayableItem::Track(t) => t.duration_secs,
            PlayableItem::Episode(e) => e.duration_secs,
        };
        hint.filter(|d| d.is_finite() && *d > 0.0)
    }

    pub fn artwork(&self) -> Option<&str> {
        match self {
            PlayableItem::Track(t) => t.cover_url.as_deref(),
            PlayableItem::Episode(e) => e.cover_url.as_deref(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            PlayableItem::Track(_) => ItemKind::Track,
            PlayableItem::Episode(_) => ItemKind::Episode,
        }
    }

    /// Whether the item carries a locator the player may load
    ///
    /// Accepts absolute URLs with a playable scheme and root-relative paths.
    pub fn has_valid_locator(&self) -> bool {
        is_valid_locator(self.locator())
    }
}

/// Locator validity policy shared by the queue and the controller
pub fn is_valid_locator(locator: &str) -> bool {
    let locator = locator.trim();
    if locator.is_empty() {
        return false;
    }

    if locator.starts_with('/') && !locator.starts_with("//") {
        return true;
    }

    match Url::parse(locator) {
        Ok(url) => PLAYABLE_SCHEMES.contains(&url.scheme()),
        Err(_) => false,
    }
}

/// Transport state of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// No current item
    Idle,

    /// Item selected, media not yet confirmed playing
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-item
    Paused,

    /// Media reached its end (transient, resolved immediately)
    Ended,
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current item only
    One,
}

impl RepeatMode {
    /// Next mode in the Off -> All -> One -> Off cycle
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Maximum recently-played size (default: 50, capped at 500)
    pub history_size: usize,

    /// Initial volume (0.0-1.0, default: 0.8)
    pub volume: f32,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Elapsed seconds after which "previous" restarts the item (default: 3.0)
    pub restart_threshold_secs: f64,

    /// Keyboard seek step in seconds (default: 5.0)
    pub seek_step_secs: f64,

    /// Keyboard volume step (default: 0.1)
    pub volume_step: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            volume: 0.8,
            shuffle: false,
            repeat: RepeatMode::Off,
            restart_threshold_secs: 3.0,
            seek_step_secs: 5.0,
            volume_step: 0.1,
        }
    }
}

impl PlayerConfig {
    /// Copy with out-of-range values clamped or reset to defaults
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        self.history_size = self.history_size.min(MAX_HISTORY_SIZE);

        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            defaults.volume
        };
        if !self.restart_threshold_secs.is_finite() || self.restart_threshold_secs < 0.0 {
            self.restart_threshold_secs = defaults.restart_threshold_secs;
        }
        if !self.seek_step_secs.is_finite() || self.seek_step_secs <= 0.0 {
            self.seek_step_secs = defaults.seek_step_secs;
        }
        if !self.volume_step.is_finite() || self.volume_step <= 0.0 {
            self.volume_step = defaults.volume_step;
        }
        self
    }
}
