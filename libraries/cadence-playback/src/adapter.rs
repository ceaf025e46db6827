//! Media element adapter contract
//!
//! Abstracts the single audio playback resource (an `<audio>` element in the
//! browser, a fake in tests). Commands flow controller -> adapter; events
//! flow back through a [`MediaEventSink`] the adapter receives on
//! [`MediaAdapter::subscribe`].
//!
//! Every load is tagged with a [`LoadTicket`]. Events carry the ticket of the
//! load they belong to so the controller can discard results of superseded
//! loads.

use crate::error::MediaFailure;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number identifying one load of the media resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Ticket that precedes every real load
    pub const NONE: LoadTicket = LoadTicket(0);

    /// The ticket following this one
    pub fn next(self) -> Self {
        LoadTicket(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened on the media resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaEventKind {
    /// Elapsed time changed
    TimeUpdate(f64),

    /// Duration is now known
    MetadataReady { duration_secs: f64 },

    /// The asynchronous play request resolved
    PlayStarted,

    /// The asynchronous play request was rejected
    PlayFailed(MediaFailure),

    /// Playback reached the end of the media
    Ended,

    /// Buffering started (`true`) or stopped (`false`)
    Buffering(bool),

    /// The resource failed to load or decode
    Error(MediaFailure),
}

/// Event reported by an adapter, tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEvent {
    pub ticket: LoadTicket,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(ticket: LoadTicket, kind: MediaEventKind) -> Self {
        Self { ticket, kind }
    }
}

/// Sending half handed to the adapter
#[derive(Debug, Clone)]
pub struct MediaEventSink {
    tx: Sender<MediaEvent>,
}

impl MediaEventSink {
    /// Report an event; silently dropped once the controller is gone
    pub fn emit(&self, ticket: LoadTicket, kind: MediaEventKind) {
        if self.tx.send(MediaEvent::new(ticket, kind)).is_err() {
            tracing::trace!(%ticket, "media event dropped, controller gone");
        }
    }
}

/// Receiving half owned by the controller
#[derive(Debug)]
pub struct MediaEventStream {
    rx: Receiver<MediaEvent>,
}

impl MediaEventStream {
    /// Next pending event, if any (never blocks)
    pub fn try_next(&self) -> Option<MediaEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Create a connected sink/stream pair
pub fn media_channel() -> (MediaEventSink, MediaEventStream) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (MediaEventSink { tx }, MediaEventStream { rx })
}

/// Platform media resource
///
/// Implementors own exactly one playback resource. None of the commands
/// return errors: failures are reported asynchronously as
/// [`MediaEventKind::Error`] or [`MediaEventKind::PlayFailed`] events.
///
/// A `play` request interrupted by a later `load` must be reported as
/// `PlayFailed(MediaFailure::Aborted)` or not at all.
pub trait MediaAdapter {
    /// Register the sink events are reported to (called once by the controller)
    fn subscribe(&mut self, sink: MediaEventSink);

    /// Stop current playback, assign a new source and start buffering
    ///
    /// Resets elapsed time to 0.
    fn load(&mut self, ticket: LoadTicket, locator: &str);

    /// Request playback start/resume of the source loaded under `ticket`
    ///
    /// Resolution arrives later as `PlayStarted` or `PlayFailed`.
    fn play(&mut self, ticket: LoadTicket);

    /// Pause playback
    fn pause(&mut self);

    /// Set elapsed position (clamped to `[0, duration]` when duration is known)
    fn seek(&mut self, seconds: f64);

    /// Set output level (0.0-1.0)
    fn set_volume(&mut self, level: f32);

    /// Mute or unmute output without touching the level
    fn set_muted(&mut self, muted: bool);
}
