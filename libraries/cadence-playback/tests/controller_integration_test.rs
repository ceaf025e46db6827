//! Integration tests for the playback controller
//!
//! Drive the controller through a mock media adapter and verify real
//! listening sessions: supersede races, end-of-media advancement, shuffle,
//! volume and the observable snapshot.

use cadence_playback::{
    Episode, LoadTicket, MediaAdapter, MediaEventKind, MediaEventSink, MediaFailure,
    PlayableItem, PlaybackController, PlayerCommand, PlayerConfig, PlayerSnapshot, RepeatMode,
    SnapshotWatcher, Track, TransportState, MAX_HISTORY_SIZE,
};
use std::cell::RefCell;
use std::rc::Rc;

// ===== Test Helpers =====

/// Command issued to the mock adapter
#[derive(Debug, Clone, PartialEq)]
enum Issued {
    Load(LoadTicket, String),
    Play(LoadTicket),
    Pause,
    Seek(f64),
    Volume(f32),
    Muted(bool),
}

/// Mock media element: records commands, events are injected by the test
#[derive(Default)]
struct MockAdapter {
    sink: Option<MediaEventSink>,
    issued: Vec<Issued>,
}

impl MockAdapter {
    fn loads(&self) -> Vec<(LoadTicket, String)> {
        self.issued
            .iter()
            .filter_map(|command| match command {
                Issued::Load(ticket, locator) => Some((*ticket, locator.clone())),
                _ => None,
            })
            .collect()
    }

    fn last_load(&self) -> (LoadTicket, String) {
        self.loads().pop().expect("nothing was loaded")
    }

    fn seeks(&self) -> Vec<f64> {
        self.issued
            .iter()
            .filter_map(|command| match command {
                Issued::Seek(seconds) => Some(*seconds),
                _ => None,
            })
            .collect()
    }

    fn emit(&self, ticket: LoadTicket, kind: MediaEventKind) {
        self.sink.as_ref().expect("not subscribed").emit(ticket, kind);
    }
}

impl MediaAdapter for MockAdapter {
    fn subscribe(&mut self, sink: MediaEventSink) {
        self.sink = Some(sink);
    }

    fn load(&mut self, ticket: LoadTicket, locator: &str) {
        self.issued.push(Issued::Load(ticket, locator.to_string()));
    }

    fn play(&mut self, ticket: LoadTicket) {
        self.issued.push(Issued::Play(ticket));
    }

    fn pause(&mut self) {
        self.issued.push(Issued::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.issued.push(Issued::Seek(seconds));
    }

    fn set_volume(&mut self, level: f32) {
        self.issued.push(Issued::Volume(level));
    }

    fn set_muted(&mut self, muted: bool) {
        self.issued.push(Issued::Muted(muted));
    }
}

type Player = PlaybackController<MockAdapter>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("cadence_playback=trace")
        .try_init();
}

fn create_player() -> Player {
    init_tracing();
    PlaybackController::new(MockAdapter::default(), PlayerConfig::default())
}

fn create_test_track(id: &str) -> PlayableItem {
    PlayableItem::Track(Track {
        id: id.to_string(),
        title: format!("Track {}", id),
        audio_url: format!("https://cdn.example.com/tracks/{}.mp3", id),
        artist: "Test Artist".to_string(),
        duration_secs: Some(180.0),
        cover_url: None,
    })
}

fn create_test_episode(id: &str) -> PlayableItem {
    PlayableItem::Episode(Episode {
        id: id.to_string(),
        title: format!("Episode {}", id),
        audio_url: format!("/media/episodes/{}.mp3", id),
        podcast_id: "show".to_string(),
        podcast_title: "The Show".to_string(),
        episode_number: Some(7),
        duration_secs: Some(3600.0),
        cover_url: Some("/media/covers/show.jpg".to_string()),
    })
}

fn create_broken_track(id: &str) -> PlayableItem {
    PlayableItem::Track(Track {
        id: id.to_string(),
        title: "Broken".to_string(),
        audio_url: "   ".to_string(),
        artist: "Nobody".to_string(),
        duration_secs: None,
        cover_url: None,
    })
}

/// Feed an event for the current load and apply it
fn media(player: &mut Player, kind: MediaEventKind) {
    let ticket = player.current_ticket();
    player.adapter().emit(ticket, kind);
    player.pump_media_events();
}

fn start(player: &mut Player) {
    media(player, MediaEventKind::PlayStarted);
}

fn current_id(player: &Player) -> Option<String> {
    player.current_item().map(|item| item.id().to_string())
}

// ===== Basic Playback =====

#[test]
fn test_play_single_track() {
    let mut player = create_player();

    player.play(create_test_track("1"));

    let (_, locator) = player.adapter().last_load();
    assert_eq!(locator, "https://cdn.example.com/tracks/1.mp3");
    assert_eq!(player.state(), TransportState::Loading);

    start(&mut player);
    assert_eq!(player.state(), TransportState::Playing);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.queue_index, Some(0));
    assert!(snapshot.is_playing);
}

#[test]
fn test_play_episode_exposes_kind_and_metadata() {
    let mut player = create_player();

    player.play(create_test_episode("ep7"));
    start(&mut player);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.kind, Some(cadence_playback::ItemKind::Episode));
    assert_eq!(snapshot.duration_secs, Some(3600.0));
    assert_eq!(snapshot.current.as_ref().map(|item| item.subtitle()), Some("The Show"));
}

#[test]
fn test_metadata_overrides_duration_hint() {
    let mut player = create_player();
    player.play(create_test_track("1"));

    media(&mut player, MediaEventKind::MetadataReady { duration_secs: 181.5 });

    assert_eq!(player.snapshot().duration_secs, Some(181.5));
}

#[test]
fn test_time_updates_reach_snapshot() {
    let mut player = create_player();
    player.play(create_test_track("1"));
    start(&mut player);

    media(&mut player, MediaEventKind::MetadataReady { duration_secs: 200.0 });
    media(&mut player, MediaEventKind::TimeUpdate(50.0));

    let snapshot = player.snapshot();
    assert_eq!(snapshot.elapsed_secs, 50.0);
    assert_eq!(snapshot.progress(), 0.25);
}

#[test]
fn test_oversized_history_config_is_capped() {
    init_tracing();
    let config: PlayerConfig =
        serde_json::from_str(r#"{"history_size": 18446744073709551615}"#).unwrap();
    let mut player = PlaybackController::new(MockAdapter::default(), config);

    assert_eq!(player.history().max_size(), MAX_HISTORY_SIZE);

    player.play(create_test_track("1"));
    start(&mut player);
    assert_eq!(player.history().len(), 1);
}

// ===== Supersede =====

#[test]
fn test_supersede_late_success_is_ignored() {
    let mut player = create_player();

    player.play(create_test_track("a"));
    let (ticket_a, _) = player.adapter().last_load();

    player.play(create_test_track("b"));
    let (ticket_b, _) = player.adapter().last_load();
    assert_ne!(ticket_a, ticket_b);

    // A's play request resolves after B was requested
    player.adapter().emit(ticket_a, MediaEventKind::PlayStarted);
    player.adapter().emit(ticket_a, MediaEventKind::TimeUpdate(42.0));
    player.pump_media_events();

    assert_eq!(current_id(&player).as_deref(), Some("b"));
    assert_eq!(player.state(), TransportState::Loading);
    assert_eq!(player.snapshot().elapsed_secs, 0.0);

    player.adapter().emit(ticket_b, MediaEventKind::PlayStarted);
    player.pump_media_events();

    assert_eq!(current_id(&player).as_deref(), Some("b"));
    assert!(player.snapshot().is_playing);
}

#[test]
fn test_supersede_late_failure_is_ignored() {
    let mut player = create_player();

    player.play(create_test_track("a"));
    let (ticket_a, _) = player.adapter().last_load();
    player.play(create_test_track("b"));

    // A's aborted play and a late load error must not touch B
    player
        .adapter()
        .emit(ticket_a, MediaEventKind::PlayFailed(MediaFailure::Aborted));
    player
        .adapter()
        .emit(ticket_a, MediaEventKind::Error(MediaFailure::Network));
    player.pump_media_events();

    assert_eq!(current_id(&player).as_deref(), Some("b"));
    assert_eq!(player.state(), TransportState::Loading);

    start(&mut player);
    assert_eq!(player.state(), TransportState::Playing);
}

#[test]
fn test_rapid_next_only_last_load_counts() {
    let mut player = create_player();
    let tracks: Vec<_> = (1..=5).map(|i| create_test_track(&i.to_string())).collect();
    player.play_queue(tracks, 0);

    let mut tickets = vec![player.current_ticket()];
    for _ in 0..3 {
        player.next();
        tickets.push(player.current_ticket());
    }

    for ticket in &tickets[..tickets.len() - 1] {
        player.adapter().emit(*ticket, MediaEventKind::Ended);
    }
    player.pump_media_events();

    assert_eq!(current_id(&player).as_deref(), Some("4"));
    assert_eq!(player.queue().current_index(), Some(3));
}

// ===== Ended / Repeat =====

#[test]
fn test_three_items_play_through_and_stop() {
    let mut player = create_player();
    player.play_queue(
        vec![create_test_track("1"), create_test_track("2"), create_test_track("3")],
        0,
    );
    start(&mut player);

    media(&mut player, MediaEventKind::Ended);
    assert_eq!(player.queue().current_index(), Some(1));
    assert_eq!(current_id(&player).as_deref(), Some("2"));
    start(&mut player);

    media(&mut player, MediaEventKind::Ended);
    assert_eq!(player.queue().current_index(), Some(2));
    start(&mut player);

    media(&mut player, MediaEventKind::Ended);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.state, TransportState::Idle);
    assert!(snapshot.current.is_none());
    assert!(!snapshot.is_playing);
    assert_eq!(player.adapter().loads().len(), 3);
}

#[test]
fn test_repeat_one_loops_same_item() {
    let mut player = create_player();
    player.play_queue(vec![create_test_track("1"), create_test_track("2")], 0);
    player.set_repeat(RepeatMode::One);
    start(&mut player);

    for loop_count in 1..=3 {
        let before = player.current_ticket();
        media(&mut player, MediaEventKind::TimeUpdate(179.0));
        media(&mut player, MediaEventKind::Ended);

        assert_ne!(player.current_ticket(), before);
        assert_eq!(player.queue().current_index(), Some(0));
        assert_eq!(current_id(&player).as_deref(), Some("1"));
        assert_eq!(player.snapshot().elapsed_secs, 0.0);
        assert_eq!(player.adapter().loads().len(), 1 + loop_count);
        start(&mut player);
    }

    // Looping does not flood recently played
    assert_eq!(player.history().len(), 1);
}

#[test]
fn test_repeat_all_wraps_to_start() {
    let mut player = create_player();
    player.play_queue(vec![create_test_track("1"), create_test_track("2")], 1);
    player.cycle_repeat();
    assert_eq!(player.queue().repeat(), RepeatMode::All);

    media(&mut player, MediaEventKind::Ended);

    assert_eq!(player.queue().current_index(), Some(0));
    assert_eq!(current_id(&player).as_deref(), Some("1"));
    assert_eq!(player.state(), TransportState::Loading);
}

#[test]
fn test_user_next_past_end_stops() {
    let mut player = create_player();
    player.play_queue(vec![create_test_track("1")], 0);
    start(&mut player);

    player.next();

    assert_eq!(player.state(), TransportState::Idle);
    assert!(player.current_item().is_none());
    assert!(player.adapter().issued.contains(&Issued::Pause));
}

// ===== Previous =====

#[test]
fn test_previous_after_threshold_restarts() {
    let mut player = create_player();
    player.play_queue(
        vec![create_test_track("1"), create_test_track("2"), create_test_track("3")],
        2,
    );
    start(&mut player);
    media(&mut player, MediaEventKind::TimeUpdate(3.5));
    let loads = player.adapter().loads().len();

    player.previous();

    assert_eq!(player.queue().current_index(), Some(2));
    assert_eq!(player.snapshot().elapsed_secs, 0.0);
    assert_eq!(player.adapter().seeks().last(), Some(&0.0));
    assert_eq!(player.adapter().loads().len(), loads);
}

#[test]
fn test_previous_before_threshold_goes_back() {
    let mut player = create_player();
    player.play_queue(
        vec![create_test_track("1"), create_test_track("2"), create_test_track("3")],
        2,
    );
    start(&mut player);
    media(&mut player, MediaEventKind::TimeUpdate(2.9));

    player.previous();

    assert_eq!(player.queue().current_index(), Some(1));
    assert_eq!(current_id(&player).as_deref(), Some("2"));
    assert_eq!(player.state(), TransportState::Loading);
}

// ===== Failures =====

#[test]
fn test_autoplay_rejection_keeps_item_paused() {
    let mut player = create_player();
    player.play(create_test_track("1"));

    media(&mut player, MediaEventKind::PlayFailed(MediaFailure::AutoplayBlocked));

    assert_eq!(player.state(), TransportState::Paused);
    assert_eq!(current_id(&player).as_deref(), Some("1"));

    // User gesture retries
    player.toggle_play();
    assert_eq!(player.state(), TransportState::Playing);
}

#[test]
fn test_media_error_clears_current() {
    let mut player = create_player();
    player.play_queue(vec![create_test_track("1"), create_test_track("2")], 0);
    start(&mut player);

    media(&mut player, MediaEventKind::Error(MediaFailure::Decode));

    assert_eq!(player.state(), TransportState::Idle);
    assert!(player.current_item().is_none());
    // No automatic retry or skip
    assert_eq!(player.adapter().loads().len(), 1);
}

// ===== Seek =====

#[test]
fn test_seek_by_clamps_at_zero() {
    let mut player = create_player();
    player.play(create_test_track("1"));
    media(&mut player, MediaEventKind::MetadataReady { duration_secs: 180.0 });
    media(&mut player, MediaEventKind::TimeUpdate(2.0));

    player.seek_by(-5.0);

    assert_eq!(player.snapshot().elapsed_secs, 0.0);
    assert_eq!(player.adapter().seeks(), vec![0.0]);
}

#[test]
fn test_seek_without_item_is_ignored() {
    let mut player = create_player();
    player.seek(30.0);
    assert!(player.adapter().seeks().is_empty());
}

#[test]
fn test_seek_past_hint_before_metadata_stays_in_range() {
    let mut player = create_player();
    player.play(create_test_track("1"));
    start(&mut player);

    player.seek(500.0);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.duration_secs, Some(180.0));
    assert!(snapshot.elapsed_secs <= snapshot.duration_secs.unwrap());
    assert_eq!(player.adapter().seeks(), vec![500.0]);

    // The real duration decides where the seek lands
    media(&mut player, MediaEventKind::MetadataReady { duration_secs: 240.0 });
    assert_eq!(player.snapshot().elapsed_secs, 240.0);
    assert_eq!(player.snapshot().duration_secs, Some(240.0));
}

#[test]
fn test_time_update_past_hint_stays_in_range() {
    let mut player = create_player();
    player.play(create_test_track("1"));
    start(&mut player);

    media(&mut player, MediaEventKind::TimeUpdate(400.0));

    let snapshot = player.snapshot();
    assert!(snapshot.elapsed_secs <= snapshot.duration_secs.unwrap());
}

// ===== Volume =====

#[test]
fn test_volume_and_mute_scenario() {
    let mut player = create_player();

    player.set_volume(0.6);
    assert_eq!(player.snapshot().effective_volume, 0.6);

    player.toggle_mute();
    let snapshot = player.snapshot();
    assert_eq!(snapshot.effective_volume, 0.0);
    assert_eq!(snapshot.volume, 0.6);
    assert!(snapshot.is_muted);

    player.toggle_mute();
    assert_eq!(player.snapshot().effective_volume, 0.6);

    let issued = &player.adapter().issued;
    assert!(issued.contains(&Issued::Volume(0.6)));
    assert!(issued.contains(&Issued::Muted(true)));
}

#[test]
fn test_volume_zero_mutes_and_slider_unmutes() {
    let mut player = create_player();

    player.set_volume(0.0);
    assert!(player.snapshot().is_muted);

    player.set_volume(0.4);
    assert!(!player.snapshot().is_muted);
    assert_eq!(player.snapshot().effective_volume, 0.4);

    player.set_volume(7.0);
    assert_eq!(player.snapshot().volume, 1.0);
}

// ===== Shuffle / Queue =====

#[test]
fn test_two_item_shuffle_scenario() {
    let mut player = create_player();
    player.toggle_shuffle();

    player.play_queue(vec![create_test_track("a"), create_test_track("b")], 1);

    let snapshot = player.snapshot();
    assert_eq!(snapshot.queue[0].id(), "b");
    assert_eq!(snapshot.queue_index, Some(0));
    assert_eq!(current_id(&player).as_deref(), Some("b"));

    player.toggle_shuffle();

    let snapshot = player.snapshot();
    let order: Vec<_> = snapshot.queue.iter().map(|item| item.id()).collect();
    assert_eq!(order, vec!["a", "b"]);
    assert_eq!(snapshot.queue_index, Some(1));
    assert_eq!(current_id(&player).as_deref(), Some("b"));
}

#[test]
fn test_toggle_shuffle_keeps_current_item_playing() {
    let mut player = create_player();
    let tracks: Vec<_> = (0..20).map(|i| create_test_track(&i.to_string())).collect();
    player.play_queue(tracks, 7);
    start(&mut player);
    let loads = player.adapter().loads().len();

    player.toggle_shuffle();

    assert_eq!(player.queue().current_index(), Some(0));
    assert_eq!(player.queue().current().map(|item| item.id()), Some("7"));
    assert_eq!(player.state(), TransportState::Playing);
    assert_eq!(player.adapter().loads().len(), loads);
}

#[test]
fn test_invalid_items_are_dropped() {
    let mut player = create_player();

    player.play_queue(
        vec![create_test_track("1"), create_broken_track("2"), create_test_track("3")],
        0,
    );

    let snapshot = player.snapshot();
    assert_eq!(snapshot.queue.len(), 2);
    assert!(snapshot.queue.iter().all(|item| item.has_valid_locator()));
}

#[test]
fn test_start_on_dropped_item_moves_to_next_survivor() {
    let mut player = create_player();

    player.play_queue(
        vec![create_test_track("1"), create_broken_track("2"), create_test_track("3")],
        1,
    );

    assert_eq!(current_id(&player).as_deref(), Some("3"));
}

#[test]
fn test_all_invalid_leaves_player_untouched() {
    let mut player = create_player();
    player.play(create_test_track("keep"));
    start(&mut player);

    player.play_queue(vec![create_broken_track("x"), create_broken_track("y")], 0);

    assert_eq!(current_id(&player).as_deref(), Some("keep"));
    assert_eq!(player.state(), TransportState::Playing);
}

#[test]
fn test_enqueue_into_empty_queue_does_not_autoplay() {
    let mut player = create_player();

    player.enqueue(create_test_track("1"));

    assert_eq!(player.queue().current_index(), Some(0));
    assert!(player.current_item().is_none());
    assert!(player.adapter().loads().is_empty());

    player.play_at(0);
    assert_eq!(current_id(&player).as_deref(), Some("1"));
}

#[test]
fn test_clear_queue_keeps_current_playing() {
    let mut player = create_player();
    player.play_queue(vec![create_test_track("1"), create_test_track("2")], 0);
    start(&mut player);

    player.clear_queue();

    assert!(player.queue().is_empty());
    assert_eq!(current_id(&player).as_deref(), Some("1"));
    assert_eq!(player.state(), TransportState::Playing);

    // Nothing left to advance to
    media(&mut player, MediaEventKind::Ended);
    assert_eq!(player.state(), TransportState::Idle);
}

// ===== Commands =====

#[test]
fn test_dispatch_keyboard_commands() {
    let mut player = create_player();
    let config = player.config().clone();
    player.play_queue(vec![create_test_track("1"), create_test_track("2")], 0);
    start(&mut player);

    for code in ["Space", "Space", "ArrowDown", "KeyN"] {
        let command = cadence_playback::command_for_key(code, false, &config)
            .expect("bound key");
        player.dispatch(command);
    }

    assert_eq!(current_id(&player).as_deref(), Some("2"));
    assert!((player.snapshot().volume - 0.7).abs() < 1e-6);

    player.dispatch(PlayerCommand::CycleRepeat);
    assert_eq!(player.queue().repeat(), RepeatMode::All);
}

// ===== Observable Snapshot =====

#[test]
fn test_subscribers_receive_changes_only() {
    let mut player = create_player();
    let seen: Rc<RefCell<Vec<PlayerSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = player.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.clone()));

    player.play(create_test_track("1"));
    player.pause();
    player.pause();

    {
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].state, TransportState::Loading);
        assert_eq!(seen[1].state, TransportState::Paused);
    }

    assert!(player.unsubscribe(id));
    player.toggle_play();
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_watched_listener_can_reenter_shared_player() {
    let player = Rc::new(RefCell::new(create_player()));
    let mut watcher = SnapshotWatcher::new();
    watcher.changed(player.borrow().snapshot());

    // Listener pauses the player whenever it sees playback start
    let target = Rc::clone(&player);
    let listener = move |snapshot: &PlayerSnapshot| {
        if snapshot.is_playing {
            target.try_borrow_mut().expect("player released").pause();
        }
    };
    let notify = |watcher: &mut SnapshotWatcher| {
        let changed = watcher.changed(player.borrow().snapshot());
        if let Some(snapshot) = changed {
            listener(&snapshot);
        }
    };

    {
        let mut shared = player.borrow_mut();
        shared.play(create_test_track("1"));
        start(&mut shared);
    }
    notify(&mut watcher);

    assert_eq!(player.borrow().state(), TransportState::Paused);
    notify(&mut watcher);
    assert!(watcher.changed(player.borrow().snapshot()).is_none());
}

#[test]
fn test_snapshot_serializes_for_views() {
    let mut player = create_player();
    player.play(create_test_episode("ep1"));

    let json = serde_json::to_value(player.snapshot()).unwrap();

    assert_eq!(json["state"], "loading");
    assert_eq!(json["current"]["type"], "episode");
    assert_eq!(json["repeat"], "off");
}

#[test]
fn test_reset_after_logout_returns_empty_session() {
    let mut player = create_player();
    player.play_queue(vec![create_test_track("1"), create_test_track("2")], 0);
    start(&mut player);
    let stale = player.current_ticket();

    player.reset();
    player.adapter().emit(stale, MediaEventKind::Ended);
    player.pump_media_events();

    let snapshot = player.snapshot();
    assert_eq!(snapshot.state, TransportState::Idle);
    assert!(snapshot.current.is_none());
    assert!(snapshot.queue.is_empty());
    assert_eq!(player.adapter().loads().len(), 1);
}
