use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        session::SessionSnapshotDto,
        sse::{Handshake, PlayerPresenceEvent, ServerEvent},
    },
    engine::SessionSnapshot,
    state::{SseHub, quiz::Player},
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_SNAPSHOT: &str = "snapshot";
const EVENT_PLAYER_PRESENCE: &str = "player.presence";

/// Broadcast the full session snapshot.
pub fn broadcast_snapshot(hub: &SseHub, snapshot: SessionSnapshot) {
    if let Some(event) = snapshot_event(snapshot) {
        hub.broadcast(event);
    }
}

/// Broadcast that a player joined, rejoined or left.
pub fn broadcast_presence(hub: &SseHub, player: &Player) {
    let payload = PlayerPresenceEvent {
        player_id: player.id.to_string(),
        name: player.name.clone(),
        connected: player.connected,
    };
    send_event(hub, EVENT_PLAYER_PRESENCE, &payload);
}

/// Serialise a snapshot into an SSE event.
pub fn snapshot_event(snapshot: SessionSnapshot) -> Option<ServerEvent> {
    let payload = SessionSnapshotDto::from(snapshot);
    to_event(EVENT_SNAPSHOT, &payload)
}

/// First event sent on a new stream.
pub fn handshake_event(quiz_id: uuid::Uuid, degraded: bool) -> Option<ServerEvent> {
    let payload = Handshake {
        quiz_id: quiz_id.to_string(),
        degraded,
    };
    to_event(EVENT_HANDSHAKE, &payload)
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    if let Some(event) = to_event(event, payload) {
        hub.broadcast(event);
    }
}

fn to_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}
