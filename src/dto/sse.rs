use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// Event name, `None` for unnamed `message` events.
    pub event: Option<String>,
    /// Raw data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already formatted data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Quiz whose session is streamed.
    pub quiz_id: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player joins, rejoins or leaves.
pub struct PlayerPresenceEvent {
    /// Player concerned.
    pub player_id: String,
    /// Display name.
    pub name: String,
    /// Presence after the change.
    pub connected: bool,
}
