//! Playback controller - core orchestration
//!
//! Owns the queue, volume, recently-played list and the single media
//! adapter, and drives the transport state machine:
//!
//! ```text
//!            play / play_queue                PlayStarted
//!   Idle ───────────────────────▶ Loading ───────────────▶ Playing
//!    ▲                               ▲  │ pause               │ ▲
//!    │ queue exhausted /             │  ▼                pause│ │resume
//!    │ media error        next item  │ Paused ◀──────────────┘ │
//!    │                    / repeat   │    └──────────────────────┘
//!    └──────────────────── Ended ◀───┴──── (Ended event while playing)
//! ```
//!
//! Every load takes a fresh [`LoadTicket`]. Media events carrying any other
//! ticket belong to a superseded load and are dropped, so a late resolution
//! can never overwrite state set by a newer command.

use crate::{
    adapter::{media_channel, LoadTicket, MediaAdapter, MediaEvent, MediaEventKind, MediaEventStream},
    commands::PlayerCommand,
    error::{MediaFailure, PlaybackError, Result},
    history::History,
    queue::{Queue, Retreat},
    store::{PlayerSnapshot, PlayerStore, SubscriptionId},
    types::{PlayableItem, PlayerConfig, RepeatMode, TransportState},
    volume::Volume,
};
use tracing::{debug, trace, warn};

/// Central playback management
///
/// Views never touch the adapter; they call the action methods (or
/// [`PlaybackController::dispatch`]) and read [`PlayerSnapshot`]s. No action
/// returns an error: failures are logged and expressed through state.
pub struct PlaybackController<A: MediaAdapter> {
    adapter: A,
    events: MediaEventStream,
    config: PlayerConfig,

    // Transport
    state: TransportState,
    current: Option<PlayableItem>,
    ticket: LoadTicket,
    elapsed: f64,
    duration: Option<f64>,
    buffering: bool,
    /// Seek requested before the duration was known
    pending_seek: Option<f64>,

    // Queue, history, output
    queue: Queue,
    history: History,
    volume: Volume,

    store: PlayerStore,
}

impl<A: MediaAdapter> PlaybackController<A> {
    /// Create a controller owning `adapter`
    pub fn new(mut adapter: A, config: PlayerConfig) -> Self {
        let config = config.validated();
        let (sink, events) = media_channel();
        adapter.subscribe(sink);

        let volume = Volume::new(config.volume);
        adapter.set_volume(volume.level());
        adapter.set_muted(volume.is_muted());

        let mut controller = Self {
            adapter,
            events,
            state: TransportState::Idle,
            current: None,
            ticket: LoadTicket::NONE,
            elapsed: 0.0,
            duration: None,
            buffering: false,
            pending_seek: None,
            queue: Queue::with_modes(config.shuffle, config.repeat),
            history: History::new(config.history_size),
            volume,
            store: PlayerStore::default(),
            config,
        };
        controller.store = PlayerStore::new(controller.build_snapshot());
        controller
    }

    // ===== Playback Control =====

    /// Play a single item, replacing the queue
    ///
    /// The item's variant carries whether it is a track or an episode.
    pub fn play(&mut self, item: PlayableItem) {
        self.play_queue(vec![item], 0);
    }

    /// Replace the queue and start playing at `start_index`
    ///
    /// Ignored (existing queue and playback untouched) when no item has a
    /// valid media locator.
    pub fn play_queue(&mut self, items: Vec<PlayableItem>, start_index: usize) {
        let result = self.try_play_queue(items, start_index);
        self.absorb("play_queue", result);
        self.publish();
    }

    /// Play the queue entry at `index`
    pub fn play_at(&mut self, index: usize) {
        let result = self.try_play_at(index);
        self.absorb("play_at", result);
        self.publish();
    }

    /// Pause when playing or loading, resume when paused
    pub fn toggle_play(&mut self) {
        match self.state {
            TransportState::Playing | TransportState::Loading => self.pause_inner(),
            TransportState::Paused => {
                let result = self.try_resume();
                self.absorb("toggle_play", result);
            }
            TransportState::Idle | TransportState::Ended => {
                debug!(state = ?self.state, "toggle ignored, nothing to play");
            }
        }
        self.publish();
    }

    /// Pause playback
    pub fn pause(&mut self) {
        self.pause_inner();
        self.publish();
    }

    /// Resume paused playback
    pub fn resume(&mut self) {
        let result = self.try_resume();
        self.absorb("resume", result);
        self.publish();
    }

    /// Skip to next item
    ///
    /// Follows repeat-all wrapping; stops when the queue is exhausted.
    pub fn next(&mut self) {
        let result = self.try_next();
        self.absorb("next", result);
        self.publish();
    }

    /// Go to previous item
    ///
    /// Past the restart threshold (3 seconds by default) the current item
    /// restarts instead. At the first item this does nothing.
    pub fn previous(&mut self) {
        if self.current.is_none() {
            debug!("previous ignored, nothing loaded");
            self.publish();
            return;
        }

        match self
            .queue
            .retreat(self.elapsed, self.config.restart_threshold_secs)
        {
            Retreat::Restart => {
                self.adapter.seek(0.0);
                self.elapsed = 0.0;
                self.pending_seek = None;
            }
            Retreat::Moved => self.start_current(),
            Retreat::AtStart => debug!("previous ignored, already at first item"),
        }
        self.publish();
    }

    // ===== Seek =====

    /// Seek to position in current item (clamped to `[0, duration]`)
    pub fn seek(&mut self, seconds: f64) {
        let result = self.try_seek(seconds);
        self.absorb("seek", result);
        self.publish();
    }

    /// Seek relative to the current position
    pub fn seek_by(&mut self, delta_secs: f64) {
        self.seek(self.elapsed + delta_secs);
    }

    // ===== Volume =====

    /// Set volume (0.0-1.0)
    pub fn set_volume(&mut self, level: f32) {
        if self.volume.set_level(level) {
            self.apply_volume();
        }
        self.publish();
    }

    /// Change volume by `delta`, clamped to 0.0-1.0
    pub fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.volume.level() + delta);
    }

    /// Toggle mute state (stored level is preserved)
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
        self.publish();
    }

    // ===== Queue Management =====

    pub fn toggle_shuffle(&mut self) {
        self.queue.toggle_shuffle();
        debug!(shuffled = self.queue.is_shuffled(), "shuffle toggled");
        self.publish();
    }

    pub fn cycle_repeat(&mut self) {
        let mode = self.queue.cycle_repeat();
        debug!(?mode, "repeat mode changed");
        self.publish();
    }

    /// Set a specific repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.queue.set_repeat(mode);
        self.publish();
    }

    /// Append an item to the queue (items without a locator are ignored)
    pub fn enqueue(&mut self, item: PlayableItem) {
        let result = self.try_enqueue(item);
        self.absorb("enqueue", result);
        self.publish();
    }

    /// Clear the queue; the current item keeps playing to its end
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.publish();
    }

    /// Return to the empty session state (used on logout)
    ///
    /// Volume, shuffle and repeat preferences are kept.
    pub fn reset(&mut self) {
        self.stop_to_idle();
        self.queue.clear();
        self.history.clear();
        self.publish();
    }

    /// Apply a view intent
    pub fn dispatch(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play(item) => self.play(item),
            PlayerCommand::PlayQueue { items, start_index } => self.play_queue(items, start_index),
            PlayerCommand::PlayAt(index) => self.play_at(index),
            PlayerCommand::TogglePlay => self.toggle_play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::Next => self.next(),
            PlayerCommand::Previous => self.previous(),
            PlayerCommand::Seek(seconds) => self.seek(seconds),
            PlayerCommand::SeekBy(delta) => self.seek_by(delta),
            PlayerCommand::SetVolume(level) => self.set_volume(level),
            PlayerCommand::AdjustVolume(delta) => self.adjust_volume(delta),
            PlayerCommand::ToggleMute => self.toggle_mute(),
            PlayerCommand::ToggleShuffle => self.toggle_shuffle(),
            PlayerCommand::CycleRepeat => self.cycle_repeat(),
            PlayerCommand::Enqueue(item) => self.enqueue(item),
            PlayerCommand::ClearQueue => self.clear_queue(),
        }
    }

    // ===== Media Events =====

    /// Drain and apply every event the adapter reported since the last call
    ///
    /// Returns the number of events consumed.
    pub fn pump_media_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.try_next() {
            self.apply_media_event(event);
            handled += 1;
        }
        if handled > 0 {
            self.publish();
        }
        handled
    }

    /// Apply a single media event
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        self.apply_media_event(event);
        self.publish();
    }

    fn apply_media_event(&mut self, event: MediaEvent) {
        if event.ticket != self.ticket {
            trace!(
                event_ticket = %event.ticket,
                current_ticket = %self.ticket,
                "dropping event from superseded load"
            );
            return;
        }
        if self.current.is_none() {
            trace!(ticket = %event.ticket, "dropping event, nothing loaded");
            return;
        }

        match event.kind {
            MediaEventKind::TimeUpdate(seconds) => {
                if seconds.is_finite() {
                    self.elapsed = self.clamp_to_duration(seconds.max(0.0));
                }
            }
            MediaEventKind::MetadataReady { duration_secs } => {
                self.on_metadata(duration_secs);
            }
            MediaEventKind::PlayStarted => match self.state {
                TransportState::Loading => self.set_state(TransportState::Playing),
                // Paused while the play request was in flight
                TransportState::Paused => self.adapter.pause(),
                _ => {}
            },
            MediaEventKind::PlayFailed(failure) => self.on_play_failed(failure),
            MediaEventKind::Ended => self.on_ended(),
            MediaEventKind::Buffering(buffering) => self.buffering = buffering,
            MediaEventKind::Error(failure) => self.on_media_error(failure),
        }
    }

    fn on_metadata(&mut self, duration_secs: f64) {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            // Live streams report an infinite duration
            trace!(duration_secs, "ignoring unusable duration");
            return;
        }

        self.duration = Some(duration_secs);
        if let Some(target) = self.pending_seek.take() {
            let target = target.min(duration_secs);
            self.adapter.seek(target);
            self.elapsed = target;
        } else {
            self.elapsed = self.elapsed.min(duration_secs);
        }
    }

    fn on_play_failed(&mut self, failure: MediaFailure) {
        if failure.is_supersede() {
            trace!(ticket = %self.ticket, "play request superseded");
            return;
        }

        let error = PlaybackError::from(failure);
        warn!(ticket = %self.ticket, %error, "play request rejected");
        if matches!(self.state, TransportState::Loading | TransportState::Playing) {
            self.set_state(TransportState::Paused);
        }
    }

    fn on_media_error(&mut self, failure: MediaFailure) {
        if failure.is_supersede() {
            trace!(ticket = %self.ticket, "load superseded");
            return;
        }

        let error = PlaybackError::from(failure);
        warn!(
            ticket = %self.ticket,
            id = self.current.as_ref().map(PlayableItem::id),
            %error,
            "media failed, stopping playback"
        );
        self.stop_to_idle();
    }

    fn on_ended(&mut self) {
        if self.current.is_none() {
            return;
        }

        self.set_state(TransportState::Ended);
        if let Some(duration) = self.duration {
            self.elapsed = duration;
        }

        if self.queue.repeat() == RepeatMode::One {
            if let Some(item) = self.current.clone() {
                self.load_item(item);
            }
        } else {
            self.advance_or_finish();
        }
    }

    // ===== State Queries =====

    /// Latest published snapshot
    pub fn snapshot(&self) -> &PlayerSnapshot {
        self.store.snapshot()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn current_item(&self) -> Option<&PlayableItem> {
        self.current.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, TransportState::Playing | TransportState::Loading)
    }

    /// Elapsed position as published, never past the displayed duration
    pub fn elapsed_secs(&self) -> f64 {
        match self.displayed_duration() {
            Some(duration) => self.elapsed.min(duration),
            None => self.elapsed,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Recently played items
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Ticket of the most recent load
    pub fn current_ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Register a view listener; called with every changed snapshot
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PlayerSnapshot) + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // ===== Internals =====

    fn try_play_queue(&mut self, items: Vec<PlayableItem>, start_index: usize) -> Result<()> {
        if !self.queue.replace(items, start_index) {
            return Err(PlaybackError::QueueEmpty);
        }
        self.start_current();
        Ok(())
    }

    fn try_next(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        self.advance_or_finish();
        Ok(())
    }

    fn try_enqueue(&mut self, item: PlayableItem) -> Result<()> {
        let id = item.id().to_string();
        if self.queue.enqueue(item) {
            Ok(())
        } else {
            Err(PlaybackError::InvalidItem { id })
        }
    }

    fn try_resume(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Err(PlaybackError::NoItemLoaded);
        }
        if self.state != TransportState::Paused {
            return Ok(());
        }

        self.adapter.play(self.ticket);
        // Optimistic; a rejection for this ticket moves back to Paused
        self.set_state(TransportState::Playing);
        Ok(())
    }

    fn try_play_at(&mut self, index: usize) -> Result<()> {
        let item = self
            .queue
            .jump_to(index)
            .cloned()
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.load_item(item);
        Ok(())
    }

    fn try_seek(&mut self, seconds: f64) -> Result<()> {
        if self.current.is_none() {
            return Err(PlaybackError::NoItemLoaded);
        }
        if !seconds.is_finite() {
            trace!(seconds, "ignoring non-finite seek");
            return Ok(());
        }

        let target = seconds.max(0.0);
        match self.duration {
            Some(duration) => {
                let target = target.min(duration);
                self.adapter.seek(target);
                self.elapsed = target;
                self.pending_seek = None;
            }
            None => {
                // Reconciled once metadata arrives
                self.adapter.seek(target);
                self.elapsed = target;
                self.pending_seek = Some(target);
            }
        }
        Ok(())
    }

    fn pause_inner(&mut self) {
        if matches!(self.state, TransportState::Playing | TransportState::Loading) {
            self.adapter.pause();
            self.set_state(TransportState::Paused);
        }
    }

    fn start_current(&mut self) {
        match self.queue.current().cloned() {
            Some(item) => self.load_item(item),
            None => self.stop_to_idle(),
        }
    }

    fn advance_or_finish(&mut self) {
        match self.queue.advance().cloned() {
            Some(item) => self.load_item(item),
            None => {
                debug!("end of queue, stopping");
                self.stop_to_idle();
            }
        }
    }

    /// Supersede whatever is in flight and load `item` from position 0
    fn load_item(&mut self, item: PlayableItem) {
        self.ticket = self.ticket.next();
        self.elapsed = 0.0;
        self.duration = None;
        self.buffering = false;
        self.pending_seek = None;
        self.set_state(TransportState::Loading);

        debug!(ticket = %self.ticket, id = item.id(), kind = ?item.kind(), "loading item");
        self.adapter.load(self.ticket, item.locator());
        self.adapter.play(self.ticket);

        self.history.push(item.clone());
        self.current = Some(item);
    }

    /// Stop output, clear the current item and invalidate in-flight loads
    fn stop_to_idle(&mut self) {
        if self.current.is_some() {
            self.adapter.pause();
        }
        self.ticket = self.ticket.next();
        self.current = None;
        self.elapsed = 0.0;
        self.duration = None;
        self.buffering = false;
        self.pending_seek = None;
        self.set_state(TransportState::Idle);
    }

    fn apply_volume(&mut self) {
        self.adapter.set_volume(self.volume.level());
        self.adapter.set_muted(self.volume.is_muted());
    }

    fn clamp_to_duration(&self, seconds: f64) -> f64 {
        match self.duration {
            Some(duration) => seconds.min(duration),
            None => seconds,
        }
    }

    fn set_state(&mut self, next: TransportState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "transport state");
            self.state = next;
        }
    }

    fn absorb(&self, action: &'static str, result: Result<()>) {
        if let Err(error) = result {
            debug!(action, %error, "intent ignored");
        }
    }

    /// Media-reported duration, else the catalogue hint
    fn displayed_duration(&self) -> Option<f64> {
        self.duration
            .or_else(|| self.current.as_ref().and_then(PlayableItem::duration_secs))
    }

    fn build_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current: self.current.clone(),
            kind: self.current.as_ref().map(PlayableItem::kind),
            state: self.state,
            is_playing: self.is_playing(),
            is_buffering: self.buffering,
            elapsed_secs: self.elapsed_secs(),
            duration_secs: self.displayed_duration(),
            volume: self.volume.level(),
            is_muted: self.volume.is_muted(),
            effective_volume: self.volume.effective(),
            is_shuffled: self.queue.is_shuffled(),
            repeat: self.queue.repeat(),
            queue: self.queue.items().to_vec(),
            queue_index: self.queue.current_index(),
        }
    }

    fn publish(&mut self) {
        let snapshot = self.build_snapshot();
        self.store.publish(snapshot);
    }
}

impl<A: MediaAdapter + std::fmt::Debug> std::fmt::Debug for PlaybackController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("adapter", &self.adapter)
            .field("state", &self.state)
            .field("ticket", &self.ticket)
            .field("current", &self.current.as_ref().map(PlayableItem::id))
            .field("queue_len", &self.queue.len())
            .finish()
    }
}
