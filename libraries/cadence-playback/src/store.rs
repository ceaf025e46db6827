//! Observable player state
//!
//! The controller publishes a fresh [`PlayerSnapshot`] after every intent
//! and media event; subscribers are only called when something changed.

use crate::types::{ItemKind, PlayableItem, RepeatMode, TransportState};
use serde::Serialize;

/// Read-only view of the player, as consumed by views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub current: Option<PlayableItem>,
    pub kind: Option<ItemKind>,
    pub state: TransportState,
    pub is_playing: bool,
    pub is_buffering: bool,
    pub elapsed_secs: f64,
    pub duration_secs: Option<f64>,
    pub volume: f32,
    pub is_muted: bool,
    pub effective_volume: f32,
    pub is_shuffled: bool,
    pub repeat: RepeatMode,
    pub queue: Vec<PlayableItem>,
    pub queue_index: Option<usize>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            current: None,
            kind: None,
            state: TransportState::Idle,
            is_playing: false,
            is_buffering: false,
            elapsed_secs: 0.0,
            duration_secs: None,
            volume: 0.8,
            is_muted: false,
            effective_volume: 0.8,
            is_shuffled: false,
            repeat: RepeatMode::Off,
            queue: Vec::new(),
            queue_index: None,
        }
    }
}

impl PlayerSnapshot {
    /// Playback progress in 0.0-1.0 (0 when duration is unknown)
    pub fn progress(&self) -> f64 {
        match self.duration_secs {
            Some(duration) if duration > 0.0 => (self.elapsed_secs / duration).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}

/// Handle returned by [`PlayerStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PlayerSnapshot)>;

/// Latest snapshot plus the subscribers interested in it
pub struct PlayerStore {
    snapshot: PlayerSnapshot,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl PlayerStore {
    pub fn new(initial: PlayerSnapshot) -> Self {
        Self {
            snapshot: initial,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> &PlayerSnapshot {
        &self.snapshot
    }

    /// Register a listener called with every changed snapshot
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlayerSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Replace the snapshot, notifying listeners if it differs
    ///
    /// Returns whether listeners were notified.
    pub fn publish(&mut self, snapshot: PlayerSnapshot) -> bool {
        if snapshot == self.snapshot {
            return false;
        }

        self.snapshot = snapshot;
        for (_, listener) in &mut self.listeners {
            listener(&self.snapshot);
        }
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new(PlayerSnapshot::default())
    }
}

impl std::fmt::Debug for PlayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerStore")
            .field("snapshot", &self.snapshot)
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

/// Change detector for listeners living outside the store
///
/// Used when callbacks must run after the controller is released: read the
/// snapshot, pass it here, drop the borrow, then notify with the result.
#[derive(Debug, Default)]
pub struct SnapshotWatcher {
    last: Option<PlayerSnapshot>,
}

impl SnapshotWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of `current` if it differs from the last one seen
    pub fn changed(&mut self, current: &PlayerSnapshot) -> Option<PlayerSnapshot> {
        if self.last.as_ref() == Some(current) {
            return None;
        }
        self.last = Some(current.clone());
        self.last.clone()
    }

    /// Forget the last snapshot so the next check always reports
    pub fn reset(&mut self) {
        self.last = None;
    }
}
