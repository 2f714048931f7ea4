use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;

use super::registry::UserRecord;

/// A text line shown in the room, from a member or the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl ChatMessage {
    pub fn new(username: &str, text: &str) -> Self {
        Self {
            username: username.to_string(),
            text: text.to_string(),
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    pub username: String,
    pub url: String,
    pub created_at: i64,
}

impl LocationMessage {
    pub fn new(username: &str, url: String) -> Self {
        Self {
            username: username.to_string(),
            url,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
}

/// Room name plus its members in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomData {
    pub room: String,
    pub users: Vec<RosterEntry>,
}

impl RoomData {
    pub fn new(room: &str, members: &[UserRecord]) -> Self {
        Self {
            room: room.to_string(),
            users: members
                .iter()
                .map(|user| RosterEntry {
                    username: user.username.clone(),
                })
                .collect(),
        }
    }
}

/// Builds `<base>?q=<lat>,<lon>`. The comma is left unescaped so map
/// providers read it as a coordinate pair.
pub fn location_url(base: &Url, coords: Coordinates) -> String {
    let mut url = base.clone();
    url.set_query(Some(&format!("q={},{}", coords.latitude, coords.longitude)));
    url.to_string()
}
