use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChatError;
use crate::ConnectionId;

/// One joined connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub connection_id: ConnectionId,
    pub username: String,
    pub room: String,
}

/// In-memory set of joined connections.
///
/// Records keep insertion order so rosters list members in the order they
/// joined. Lookups are linear scans.
#[derive(Debug, Default)]
pub struct MembershipRegistry {
    users: Vec<UserRecord>,
    max_users: Option<usize>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses new records once `max_users` are present.
    pub fn with_capacity_limit(max_users: usize) -> Self {
        Self {
            users: Vec::new(),
            max_users: Some(max_users),
        }
    }

    pub fn add_user(
        &mut self,
        connection_id: ConnectionId,
        username: &str,
        room: &str,
    ) -> Result<UserRecord, ChatError> {
        if username.is_empty() || room.is_empty() {
            return Err(ChatError::Validation);
        }

        if self
            .users
            .iter()
            .any(|user| user.room == room && user.username == username)
        {
            return Err(ChatError::Conflict);
        }

        if let Some(max) = self.max_users {
            if self.users.len() >= max {
                return Err(ChatError::CapacityReached);
            }
        }

        let user = UserRecord {
            connection_id,
            username: username.to_string(),
            room: room.to_string(),
        };
        self.users.push(user.clone());
        debug!("Registered {} in room {} ({} users total)", username, room, self.users.len());
        Ok(user)
    }

    pub fn remove_user(&mut self, connection_id: ConnectionId) -> Option<UserRecord> {
        let index = self
            .users
            .iter()
            .position(|user| user.connection_id == connection_id)?;
        Some(self.users.remove(index))
    }

    pub fn get_user(&self, connection_id: ConnectionId) -> Option<&UserRecord> {
        self.users
            .iter()
            .find(|user| user.connection_id == connection_id)
    }

    pub fn get_users_in_room(&self, room: &str) -> Vec<UserRecord> {
        self.users
            .iter()
            .filter(|user| user.room == room)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
