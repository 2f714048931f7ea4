use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use futures::channel::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::chat::Broadcaster;
use crate::error::WebSocketError;
use crate::websocket::ServerMessage;
use crate::ConnectionId;

/// Live connections and the room groups they are subscribed to.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: RwLock<HashMap<ConnectionId, UnboundedSender<String>>>,
    rooms: RwLock<HashMap<String, Vec<ConnectionId>>>,
}

fn encode(msg: &ServerMessage) -> Result<String, WebSocketError> {
    serde_json::to_string(msg)
        .map_err(|e| WebSocketError::InvalidFormat(format!("Failed to serialize message: {}", e)))
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: ConnectionId, sender: UnboundedSender<String>) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        info!("Added connection {} to pool", id);
    }

    /// Drops the connection and any room subscriptions it still holds.
    pub fn remove(&self, id: &ConnectionId) -> bool {
        let removed = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        for members in rooms.values_mut() {
            members.retain(|member| member != id);
        }
        rooms.retain(|_, members| !members.is_empty());
        if removed {
            info!("Removed connection {} from pool", id);
        }
        removed
    }

    pub fn send_text(&self, id: &ConnectionId, text: String) -> Result<(), WebSocketError> {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        let sender = connections
            .get(id)
            .ok_or_else(|| WebSocketError::SendError(format!("Connection {} not found", id)))?;
        sender
            .unbounded_send(text)
            .map_err(|e| WebSocketError::SendError(e.to_string()))
    }

    fn send_to_many(&self, ids: &[ConnectionId], text: &str) {
        let connections = self.connections.read().unwrap_or_else(PoisonError::into_inner);
        for id in ids {
            if let Some(sender) = connections.get(id) {
                if let Err(e) = sender.unbounded_send(text.to_string()) {
                    error!("Failed to send to connection {}: {}", id, e);
                }
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn room_members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(room)
            .cloned()
            .unwrap_or_default()
    }
}

impl Broadcaster for ConnectionPool {
    fn subscribe(&self, id: ConnectionId, room: &str) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let members = rooms.entry(room.to_string()).or_default();
        if !members.contains(&id) {
            members.push(id);
        }
    }

    fn unsubscribe(&self, id: ConnectionId, room: &str) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(members) = rooms.get_mut(room) {
            members.retain(|member| *member != id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    fn send_to(&self, id: ConnectionId, msg: &ServerMessage) {
        let result = encode(msg).and_then(|text| self.send_text(&id, text));
        if let Err(e) = result {
            error!("Failed to send to connection {}: {}", id, e);
        }
    }

    fn broadcast(&self, room: &str, msg: &ServerMessage, exclude: Option<ConnectionId>) {
        let text = match encode(msg) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to broadcast to room {}: {}", room, e);
                return;
            }
        };
        let targets: Vec<ConnectionId> = self
            .room_members(room)
            .into_iter()
            .filter(|id| Some(*id) != exclude)
            .collect();
        self.send_to_many(&targets, &text);
    }
}
