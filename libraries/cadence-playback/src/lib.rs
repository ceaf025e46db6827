//! Cadence - Playback Core
//!
//! Platform-agnostic playback state for the Cadence streaming client
//! (music tracks and podcast episodes).
//!
//! This crate provides:
//! - Media adapter contract with load tickets for superseded requests
//! - Queue with shuffle (current item pinned first) and repeat modes
//! - Transport state machine (idle, loading, playing, paused, ended)
//! - Observable player snapshot with change-only notifications
//! - Volume and mute, recently played, keyboard shortcuts
//!
//! # Architecture
//!
//! Views never touch the media resource. They dispatch intents to the
//! [`PlaybackController`] and render [`PlayerSnapshot`]s. The platform
//! resource (an `<audio>` element behind the `wasm` feature, a fake in tests)
//! implements [`MediaAdapter`] and reports events back over a channel.
//!
//! # Example
//!
//! ```rust
//! use cadence_playback::{
//!     LoadTicket, MediaAdapter, MediaEventKind, MediaEventSink, PlayableItem,
//!     PlaybackController, PlayerConfig, Track, TransportState,
//! };
//!
//! #[derive(Default)]
//! struct Speaker {
//!     sink: Option<MediaEventSink>,
//! }
//!
//! impl MediaAdapter for Speaker {
//!     fn subscribe(&mut self, sink: MediaEventSink) {
//!         self.sink = Some(sink);
//!     }
//!     fn load(&mut self, _ticket: LoadTicket, _locator: &str) {}
//!     fn play(&mut self, ticket: LoadTicket) {
//!         if let Some(sink) = &self.sink {
//!             sink.emit(ticket, MediaEventKind::PlayStarted);
//!         }
//!     }
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _seconds: f64) {}
//!     fn set_volume(&mut self, _level: f32) {}
//!     fn set_muted(&mut self, _muted: bool) {}
//! }
//!
//! let mut player = PlaybackController::new(Speaker::default(), PlayerConfig::default());
//!
//! player.play(PlayableItem::Track(Track {
//!     id: "t1".to_string(),
//!     title: "First Light".to_string(),
//!     audio_url: "https://cdn.example.com/t1.mp3".to_string(),
//!     artist: "Northbound".to_string(),
//!     duration_secs: Some(214.0),
//!     cover_url: None,
//! }));
//! assert_eq!(player.state(), TransportState::Loading);
//!
//! player.pump_media_events();
//! assert_eq!(player.state(), TransportState::Playing);
//! ```

pub mod adapter;
pub mod commands;
mod controller;
mod error;
pub mod format;
mod history;
pub mod queue;
pub mod session;
mod shuffle;
pub mod store;
pub mod types;
mod volume;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use adapter::{
    media_channel, LoadTicket, MediaAdapter, MediaEvent, MediaEventKind, MediaEventSink,
    MediaEventStream,
};
pub use commands::{command_for_key, PlayerCommand};
pub use controller::PlaybackController;
pub use error::{MediaFailure, PlaybackError, Result};
pub use history::History;
pub use queue::{Queue, Retreat};
pub use session::{AuthState, Session, UserProfile, UserRole};
pub use store::{PlayerSnapshot, PlayerStore, SnapshotWatcher, SubscriptionId};
pub use types::{
    is_valid_locator, Episode, ItemKind, PlayableItem, PlayerConfig, RepeatMode, Track,
    TransportState, MAX_HISTORY_SIZE,
};
pub use volume::Volume;
