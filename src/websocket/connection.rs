use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::{ChatHandler, ChatMessage, Coordinates, LocationMessage, RoomData};
use crate::error::{ChatError, WebSocketError};
use crate::ConnectionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Absent fields decode as empty and fail validation.
    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        username: String,
        #[serde(default)]
        room: String,
    },
    #[serde(rename = "sendMessage")]
    SendMessage(String),
    #[serde(rename = "sendLocation")]
    SendLocation(Coordinates),
    #[serde(rename = "ping")]
    Ping,
}

impl ClientMessage {
    fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::SendMessage(_) => "sendMessage",
            ClientMessage::SendLocation(_) => "sendLocation",
            ClientMessage::Ping => "ping",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "message")]
    Message(ChatMessage),
    #[serde(rename = "locationMessage")]
    LocationMessage(LocationMessage),
    #[serde(rename = "roomData")]
    RoomData(RoomData),
    /// Completion of a client event; `error` is `None` on success.
    #[serde(rename = "ack")]
    Ack { event: String, error: Option<String> },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "pong")]
    Pong,
}

impl ServerMessage {
    fn ack(event: &str, result: Result<(), ChatError>) -> Self {
        ServerMessage::Ack {
            event: event.to_string(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Joined { username: String, room: String },
    Disconnected,
}

/// Protocol state for one socket, independent of the transport.
///
/// Every decoded event produces exactly one reply for the sender; the
/// handler's broadcasts go out through the pool.
pub struct Connection {
    id: ConnectionId,
    handler: Arc<ChatHandler>,
    state: ConnectionState,
}

impl Connection {
    pub fn new(handler: Arc<ChatHandler>) -> Self {
        Self {
            id: Uuid::new_v4(),
            handler,
            state: ConnectionState::Connected,
        }
    }

    pub fn handle_text(&mut self, text: &str) -> ServerMessage {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle_message(msg),
            Err(e) => {
                let err = WebSocketError::InvalidFormat(e.to_string());
                warn!("Connection {}: {}", self.id, err);
                ServerMessage::Error {
                    message: err.to_string(),
                }
            }
        }
    }

    pub fn handle_message(&mut self, msg: ClientMessage) -> ServerMessage {
        let event = msg.event_name();
        let result = match msg {
            ClientMessage::Ping => return ServerMessage::Pong,
            _ if self.state == ConnectionState::Disconnected => Err(ChatError::NotJoined),
            ClientMessage::Join { username, room } => self.join(&username, &room),
            ClientMessage::SendMessage(text) => self.handler.send_message(self.id, &text),
            ClientMessage::SendLocation(coords) => self.handler.send_location(self.id, coords),
        };
        ServerMessage::ack(event, result)
    }

    fn join(&mut self, username: &str, room: &str) -> Result<(), ChatError> {
        if matches!(self.state, ConnectionState::Joined { .. }) {
            return Err(ChatError::AlreadyJoined);
        }
        let user = self.handler.join(self.id, username, room)?;
        self.state = ConnectionState::Joined {
            username: user.username,
            room: user.room,
        };
        Ok(())
    }

    /// Terminal transition; safe to call more than once.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        if let Some(user) = self.handler.disconnect(self.id) {
            info!("Connection {} left {} as {}", self.id, user.room, user.username);
        }
        self.state = ConnectionState::Disconnected;
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }
}
