mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use common::{MockPeer, MockTransport, RecordingDispatcher, RecordingPresenter, Shown};
use kodegen_media_keys::host::InMemoryDirectory;
use kodegen_media_keys::types::command::{MUTE, PLAY_NEXT, PLAY_PAUSE};
use kodegen_media_keys::{
    Agent, AgentCommand, AgentId, Collaborators, Engine, EngineHandle, EngineOptions,
    EventOutcome, InboundEvent, NotificationKey, PeerCommand, PlaybackState, Settings,
};

struct Harness {
    engine: Engine<MockTransport>,
    handle: EngineHandle,
    directory: InMemoryDirectory,
    dispatcher: Arc<RecordingDispatcher>,
    presenter: Arc<RecordingPresenter>,
    peer: MockPeer,
}

fn harness(options: EngineOptions, ids: &[&str]) -> Harness {
    common::init_logging();
    let directory = InMemoryDirectory::with_agents(ids.iter().map(|id| Agent::new(*id)).collect());
    let dispatcher = RecordingDispatcher::new();
    let presenter = RecordingPresenter::new();
    let peer = MockPeer::new();

    let collaborators = Collaborators::new(
        Arc::new(directory.clone()),
        dispatcher.clone(),
        presenter.clone(),
    );
    let (engine, handle) = Engine::new(options, collaborators, peer.factory());

    Harness {
        engine,
        handle,
        directory,
        dispatcher,
        presenter,
        peer,
    }
}

fn with_bridge() -> EngineOptions {
    EngineOptions::builder().use_bridge(true).build()
}

fn report(agent: &str, state: PlaybackState) -> InboundEvent {
    InboundEvent::ReportState {
        agent: agent.into(),
        state,
    }
}

fn mpris(enabled: bool) -> Settings {
    Settings {
        use_mpris: Some(enabled),
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_report_mirrors_selected_agent() {
    let mut h = harness(with_bridge(), &["1", "2"]);
    h.engine.start().await;
    assert_eq!(h.peer.connects(), 1);
    // Nobody has reported yet, so there is nothing to mirror
    assert!(h.peer.writes().is_empty());

    h.engine.handle(report("1", PlaybackState::track("A", false))).await;
    h.engine.handle(report("2", PlaybackState::track("B", true))).await;

    let messages = h.peer.messages();
    assert_eq!(messages.len(), 2);
    // The playing agent wins over the more recent paused one
    h.engine.handle(report("1", PlaybackState::track("A", false))).await;
    let messages = h.peer.messages();
    let last = &messages[2]["args"][0];
    assert_eq!(last["Metadata"]["mpris:trackid"], "2");
    assert_eq!(last["PlaybackStatus"], "Playing");
}

#[tokio::test]
async fn test_unreported_agents_are_not_mirrored() {
    let mut h = harness(with_bridge(), &["1"]);
    h.engine.start().await;

    assert!(!h.engine.mirror_current().await);
    let outcome = h
        .engine
        .handle(InboundEvent::FocusChanged { agent: "1".into() })
        .await;
    assert!(outcome.is_handled());
    assert!(h.peer.writes().is_empty());
}

#[tokio::test]
async fn test_removal_mirrors_once() {
    let mut h = harness(with_bridge(), &["1", "2"]);
    h.engine.start().await;
    h.engine.handle(report("2", PlaybackState::track("B", false))).await;
    h.engine.handle(report("1", PlaybackState::track("A", true))).await;
    h.peer.clear_writes();

    // The directory may still list the agent while it is being torn down
    let removed = InboundEvent::AgentRemoved { agent: "1".into() };
    h.engine.handle(removed.clone()).await;

    let messages = h.peer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["args"][0]["Metadata"]["mpris:trackid"], "2");
    assert!(h.engine.registry().get(&AgentId::from("1")).is_none());

    h.engine.handle(removed).await;
    assert_eq!(h.peer.writes().len(), 1);
}

#[tokio::test]
async fn test_last_removal_removes_player() {
    let mut h = harness(with_bridge(), &["1"]);
    h.engine.start().await;
    h.engine.handle(report("1", PlaybackState::track("A", true))).await;
    h.peer.clear_writes();

    h.directory.remove_agent(&AgentId::from("1"));
    h.engine
        .handle(InboundEvent::AgentRemoved { agent: "1".into() })
        .await;
    assert_eq!(h.peer.commands(), ["remove_player"]);
}

#[tokio::test]
async fn test_attached_agent_announces_player() {
    let mut h = harness(with_bridge(), &["1"]);
    h.engine.start().await;

    h.engine
        .handle(InboundEvent::AgentAttached { agent: "1".into() })
        .await;
    assert_eq!(h.peer.commands(), ["add_player"]);
}

#[tokio::test]
async fn test_peer_commands_route_to_agents() {
    let options = EngineOptions::builder().single_agent_mode(true).build();
    let mut h = harness(options, &["1", "2"]);
    h.engine.handle(report("1", PlaybackState::track("A", true))).await;
    h.engine.handle(report("2", PlaybackState::track("B", false))).await;

    let outcome = h.engine.handle(InboundEvent::PeerCommand(PeerCommand::Next)).await;
    assert_eq!(outcome, EventOutcome::Handled);

    let outcome = h.engine.handle(InboundEvent::PeerCommand(PeerCommand::Pause)).await;
    assert_eq!(outcome, EventOutcome::Handled);

    let outcome = h
        .engine
        .handle(InboundEvent::PeerCommand(PeerCommand::parse("seek")))
        .await;
    match outcome {
        EventOutcome::Unhandled(reason) => assert!(reason.contains("seek"), "{reason}"),
        EventOutcome::Handled => panic!("seek must not be handled"),
    }

    assert_eq!(
        h.dispatcher.sent(),
        [
            ("1".to_string(), PLAY_NEXT.to_string()),
            ("1".to_string(), PLAY_PAUSE.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_targeted_command_reaches_only_target() {
    let options = EngineOptions::builder().single_agent_mode(true).build();
    let mut h = harness(options, &["1", "2"]);
    h.engine.handle(report("1", PlaybackState::track("A", true))).await;

    let report = h.engine.route(&AgentCommand::new(PLAY_PAUSE).targeted("2")).await;
    assert_eq!(report.delivered, [AgentId::from("2")]);

    h.engine
        .handle(InboundEvent::Command(AgentCommand::new(MUTE)))
        .await;
    assert_eq!(
        h.dispatcher.sent(),
        [
            ("2".to_string(), PLAY_PAUSE.to_string()),
            ("1".to_string(), MUTE.to_string()),
            ("2".to_string(), MUTE.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_settings_toggle_bridge() {
    let mut h = harness(EngineOptions::default(), &["1"]);
    h.engine.handle(report("1", PlaybackState::track("A", true))).await;
    assert_eq!(h.peer.connects(), 0);

    let outcome = h.engine.handle(InboundEvent::SettingsChanged(mpris(true))).await;
    assert!(outcome.is_handled());
    assert!(h.engine.bridge().is_connected());
    assert!(h.engine.options().use_bridge);
    // Current state is mirrored as soon as the bridge opens
    assert_eq!(h.peer.commands(), ["update_state"]);

    // Repeating the setting does not take another reference
    h.engine.handle(InboundEvent::SettingsChanged(mpris(true))).await;
    assert_eq!(h.peer.connects(), 1);
    assert_eq!(h.engine.bridge().ref_count(), 1);

    h.engine.handle(InboundEvent::SettingsChanged(mpris(false))).await;
    assert!(!h.engine.bridge().is_connected());
    assert_eq!(h.peer.closes(), 1);
    assert_eq!(h.peer.commands(), ["update_state", "quit"]);
    assert!(!h.engine.options().use_bridge);
}

#[tokio::test]
async fn test_settings_switch_routing_mode() {
    let mut h = harness(EngineOptions::default(), &["1", "2"]);
    h.engine.handle(report("1", PlaybackState::track("A", true))).await;

    let single = Settings {
        single_player_mode: Some(true),
        ..Settings::default()
    };
    h.engine.handle(InboundEvent::SettingsChanged(single)).await;
    assert!(h.engine.options().single_agent_mode);

    h.engine
        .handle(InboundEvent::Command(AgentCommand::new(PLAY_PAUSE)))
        .await;
    assert_eq!(
        h.dispatcher.sent(),
        [("1".to_string(), PLAY_PAUSE.to_string())]
    );
}

#[tokio::test]
async fn test_unavailable_bridge_is_reported() {
    let mut h = harness(EngineOptions::default(), &["1"]);
    h.peer.fail_connect(true);

    let outcome = h.engine.handle(InboundEvent::SettingsChanged(mpris(true))).await;
    assert!(matches!(outcome, EventOutcome::Unhandled(_)));
    assert_eq!(h.engine.bridge().ref_count(), 0);

    // Startup failure is only logged
    let mut h = harness(with_bridge(), &["1"]);
    h.peer.fail_connect(true);
    h.engine.start().await;
    assert!(!h.engine.bridge().is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_song_change_shows_notification() {
    let mut h = harness(EngineOptions::default(), &["1", "2"]);

    let mut state = PlaybackState::track("A", true);
    state.site_name = Some("Radio".into());
    h.engine.handle(report("1", state.clone())).await;
    // Same song again, e.g. a progress update
    state.current_time = Some("0:10".into());
    h.engine.handle(report("1", state.clone())).await;
    assert_eq!(h.presenter.notify_count(), 1);

    let key = NotificationKey::from("1Radio");
    assert!(h.engine.notifications().is_pending(&key));
    match &h.presenter.calls()[0].0 {
        Shown::Notify(shown, notification) => {
            assert_eq!(shown, &key);
            assert_eq!(notification.title, "Radio");
            assert_eq!(notification.message, "A");
        }
        other => panic!("Expected notify, got {other:?}"),
    }

    state.song = Some("B".into());
    h.engine.handle(report("1", state)).await;
    assert_eq!(h.presenter.notify_count(), 2);

    // Blank songs and muted agents never notify
    h.engine.handle(report("1", PlaybackState::track("  ", true))).await;
    h.directory.set_notifications(&AgentId::from("2"), false);
    h.engine.handle(report("2", PlaybackState::track("C", true))).await;
    assert_eq!(h.presenter.notify_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_forwards_peer_commands_and_closes_bridge() {
    let h = harness(with_bridge(), &["1"]);
    let Harness {
        engine,
        handle,
        dispatcher,
        presenter,
        peer,
        ..
    } = h;
    let task = tokio::spawn(engine.run());

    let mut state = PlaybackState::track("A", true);
    state.site_name = Some("Radio".into());
    handle.send(report("1", state)).unwrap();
    sleep(Duration::from_millis(10)).await;

    assert_eq!(peer.connects(), 1);
    assert!(peer.send(json!({"command": "next"})));
    sleep(Duration::from_millis(10)).await;
    assert_eq!(
        dispatcher.sent(),
        [("1".to_string(), PLAY_NEXT.to_string())]
    );

    // The notification expires inside the loop
    sleep(Duration::from_secs(6)).await;
    assert_eq!(presenter.clears().len(), 1);

    handle.shutdown().unwrap();
    task.await.unwrap();

    assert_eq!(peer.closes(), 1);
    assert_eq!(peer.commands().last().map(String::as_str), Some("quit"));
    assert!(handle.is_closed());
    assert!(handle.send(InboundEvent::Shutdown).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_run_ends_when_handles_are_dropped() {
    for options in [EngineOptions::default(), with_bridge()] {
        let Harness {
            engine,
            handle,
            peer,
            ..
        } = harness(options.clone(), &["1"]);
        let task = tokio::spawn(engine.run());

        let other = handle.clone();
        other.send(report("1", PlaybackState::track("A", true))).unwrap();
        sleep(Duration::from_millis(10)).await;
        drop(handle);
        drop(other);

        let finished = timeout(Duration::from_secs(2), task).await;
        assert!(finished.is_ok(), "engine kept running, bridge: {}", options.use_bridge);

        // The held bridge is closed on the way out
        let expected_closes = usize::from(options.use_bridge);
        assert_eq!(peer.closes(), expected_closes);
    }
}

#[tokio::test(start_paused = true)]
async fn test_peer_exit_disconnects_bridge() {
    let Harness {
        engine,
        handle,
        dispatcher,
        peer,
        ..
    } = harness(with_bridge(), &["1"]);
    let task = tokio::spawn(engine.run());

    handle.send(report("1", PlaybackState::track("A", true))).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(peer.commands(), ["update_state"]);

    peer.hang_up();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(peer.closes(), 1);

    // Later reports are no longer mirrored, routing is unaffected
    handle.send(report("1", PlaybackState::track("B", true))).unwrap();
    handle
        .send(InboundEvent::Command(AgentCommand::new(PLAY_PAUSE)))
        .unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(peer.commands(), ["update_state"]);
    assert_eq!(
        dispatcher.sent(),
        [("1".to_string(), PLAY_PAUSE.to_string())]
    );

    // Toggling the setting reopens it
    handle.send(InboundEvent::SettingsChanged(mpris(false))).unwrap();
    handle.send(InboundEvent::SettingsChanged(mpris(true))).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(peer.connects(), 2);
    assert_eq!(peer.commands(), ["update_state", "update_state"]);

    handle.shutdown().unwrap();
    task.await.unwrap();
    assert_eq!(peer.closes(), 2);
}
