use serde_json::json;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use kodegen_media_keys::control::protocol::{BridgeMessage, PeerCommand, ProtocolHandler};
use kodegen_media_keys::transport::native::frame_codec;
use kodegen_media_keys::types::command::{PLAY_NEXT, PLAY_PAUSE, PLAY_PREV, STOP};
use kodegen_media_keys::{AgentId, MediaKeysError, PlaybackState};

#[test]
fn test_peer_message_parsing() {
    let handler = ProtocolHandler::new();

    let command = handler
        .parse_peer_message(json!({"command": "playpause"}))
        .unwrap();
    assert_eq!(command, PeerCommand::PlayPause);

    // Extra fields are ignored
    let command = handler
        .parse_peer_message(json!({"command": "previous", "id": 4}))
        .unwrap();
    assert_eq!(command, PeerCommand::Previous);

    let command = handler
        .parse_peer_message(json!({"command": "raise"}))
        .unwrap();
    assert_eq!(command, PeerCommand::Unrecognized("raise".into()));
    assert_eq!(command.name(), "raise");
}

#[test]
fn test_malformed_peer_message() {
    let handler = ProtocolHandler::new();
    for value in [json!({}), json!({"command": 3}), json!("next")] {
        let err = handler.parse_peer_message(value).unwrap_err();
        assert!(matches!(err, MediaKeysError::Protocol(_)), "{err:?}");
    }
}

#[test]
fn test_peer_commands_map_to_agent_commands() {
    let cases = [
        ("play", Some(PLAY_PAUSE)),
        ("pause", Some(PLAY_PAUSE)),
        ("playpause", Some(PLAY_PAUSE)),
        ("stop", Some(STOP)),
        ("next", Some(PLAY_NEXT)),
        ("previous", Some(PLAY_PREV)),
        ("seek", None),
    ];

    for (name, expected) in cases {
        let command = PeerCommand::parse(name);
        assert_eq!(command.routed_command(), expected, "{name}");
        assert_eq!(command.name(), name);
    }
}

#[test]
fn test_fixed_messages_serialize() {
    let handler = ProtocolHandler::new();
    assert_eq!(
        handler.serialize_message(&BridgeMessage::Quit).unwrap(),
        r#"{"command":"quit"}"#
    );
    assert_eq!(
        handler
            .serialize_message(&BridgeMessage::RemovePlayer)
            .unwrap(),
        r#"{"command":"remove_player"}"#
    );
    assert_eq!(
        handler.serialize_message(&BridgeMessage::AddPlayer).unwrap(),
        r#"{"command":"add_player"}"#
    );
}

#[test]
fn test_blank_song_has_no_track_id() {
    let handler = ProtocolHandler::new();
    let mut state = PlaybackState::track("  ", false);
    state.artist = Some("   ".into());

    let message = handler.create_update_state(&AgentId::from("9"), &state);
    let value = serde_json::to_value(&message).unwrap();
    let metadata = &value["args"][0]["Metadata"];
    assert!(metadata.get("mpris:trackid").is_none());
    assert!(metadata.get("xesam:artist").is_none());
}

#[test]
fn test_frames_use_little_endian_length() {
    let mut codec = frame_codec(1024);
    let mut buf = BytesMut::new();
    let body = br#"{"command":"quit"}"#;
    codec
        .encode(tokio_util::bytes::Bytes::from_static(body), &mut buf)
        .unwrap();

    assert_eq!(&buf[..4], &(body.len() as u32).to_le_bytes());
    assert_eq!(&buf[4..], body);

    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(&frame[..], body);
}

#[test]
fn test_oversized_frames_are_rejected() {
    let mut codec = frame_codec(8);
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&64u32.to_le_bytes());
    buf.extend_from_slice(&[b'x'; 64]);
    assert!(codec.decode(&mut buf).is_err());
}
