use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};
use url::Url;

use crate::config::ChatConfig;
use crate::error::{AppError, ChatError};
use crate::websocket::ServerMessage;
use crate::ConnectionId;

use super::filter::ProfanityFilter;
use super::messages::{location_url, ChatMessage, Coordinates, LocationMessage, RoomData};
use super::registry::{MembershipRegistry, UserRecord};

/// Outbound side of the transport: per-connection sends plus room groups.
#[cfg_attr(test, mockall::automock)]
pub trait Broadcaster: Send + Sync {
    fn subscribe(&self, id: ConnectionId, room: &str);
    fn unsubscribe(&self, id: ConnectionId, room: &str);
    fn send_to(&self, id: ConnectionId, msg: &ServerMessage);
    /// Sends to every subscriber of `room` except `exclude`.
    fn broadcast(&self, room: &str, msg: &ServerMessage, exclude: Option<ConnectionId>);
}

/// Sequences join/leave/broadcast behaviour for every connection.
///
/// The registry lock is held for the whole of each call, broadcasts
/// included, so events are applied one at a time even though actix runs
/// several workers.
pub struct ChatHandler {
    registry: Mutex<MembershipRegistry>,
    filter: ProfanityFilter,
    broadcaster: Arc<dyn Broadcaster>,
    bot_name: String,
    welcome_message: String,
    map_base_url: Url,
}

impl ChatHandler {
    pub fn new(
        config: &ChatConfig,
        filter: ProfanityFilter,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Result<Self, AppError> {
        let map_base_url = Url::parse(&config.map_base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid chat.map_base_url: {}", e)))?;
        let registry = match config.max_users {
            Some(max) => MembershipRegistry::with_capacity_limit(max),
            None => MembershipRegistry::new(),
        };

        Ok(Self {
            registry: Mutex::new(registry),
            filter,
            broadcaster,
            bot_name: config.bot_name.clone(),
            welcome_message: config.welcome_message.clone(),
            map_base_url,
        })
    }

    fn registry(&self) -> MutexGuard<'_, MembershipRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bot_message(&self, text: &str) -> ServerMessage {
        ServerMessage::Message(ChatMessage::new(&self.bot_name, text))
    }

    fn room_data(registry: &MembershipRegistry, room: &str) -> ServerMessage {
        ServerMessage::RoomData(RoomData::new(room, &registry.get_users_in_room(room)))
    }

    pub fn join(&self, id: ConnectionId, username: &str, room: &str) -> Result<UserRecord, ChatError> {
        let mut registry = self.registry();
        if registry.get_user(id).is_some() {
            return Err(ChatError::AlreadyJoined);
        }

        let user = registry.add_user(id, username, room).map_err(|e| {
            warn!("Connection {} failed to join {:?} as {:?}: {}", id, room, username, e);
            e
        })?;

        self.broadcaster.subscribe(id, &user.room);
        self.broadcaster.send_to(id, &self.bot_message(&self.welcome_message));
        self.broadcaster.broadcast(
            &user.room,
            &self.bot_message(&format!("{} has joined!", user.username)),
            Some(id),
        );
        self.broadcaster
            .broadcast(&user.room, &Self::room_data(&registry, &user.room), None);

        info!("{} joined room {} (connection {})", user.username, user.room, id);
        Ok(user)
    }

    pub fn send_message(&self, id: ConnectionId, text: &str) -> Result<(), ChatError> {
        let registry = self.registry();
        let user = registry.get_user(id).ok_or(ChatError::NotJoined)?;

        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.filter.is_profane(text) {
            warn!("Rejected profane message from {} in {}", user.username, user.room);
            return Err(ChatError::Profanity);
        }

        self.broadcaster.broadcast(
            &user.room,
            &ServerMessage::Message(ChatMessage::new(&user.username, text)),
            None,
        );
        Ok(())
    }

    pub fn send_location(&self, id: ConnectionId, coords: Coordinates) -> Result<(), ChatError> {
        let registry = self.registry();
        let user = registry.get_user(id).ok_or(ChatError::NotJoined)?;

        let url = location_url(&self.map_base_url, coords);
        self.broadcaster.broadcast(
            &user.room,
            &ServerMessage::LocationMessage(LocationMessage::new(&user.username, url)),
            None,
        );
        Ok(())
    }

    /// Drops the connection's record, if any, and tells the room it left.
    pub fn disconnect(&self, id: ConnectionId) -> Option<UserRecord> {
        let mut registry = self.registry();
        let user = registry.remove_user(id)?;

        self.broadcaster.unsubscribe(id, &user.room);
        self.broadcaster.broadcast(
            &user.room,
            &self.bot_message(&format!("{} has left!", user.username)),
            None,
        );
        self.broadcaster
            .broadcast(&user.room, &Self::room_data(&registry, &user.room), None);

        info!("{} left room {} (connection {})", user.username, user.room, id);
        Some(user)
    }

    pub fn user_count(&self) -> usize {
        self.registry().len()
    }

    pub fn users_in_room(&self, room: &str) -> Vec<UserRecord> {
        self.registry().get_users_in_room(room)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Broadcaster that records what each connection would receive.
    #[derive(Default)]
    pub(crate) struct RecordingBroadcaster {
        groups: Mutex<HashMap<String, Vec<ConnectionId>>>,
        inbox: Mutex<HashMap<ConnectionId, Vec<ServerMessage>>>,
    }

    impl RecordingBroadcaster {
        pub(crate) fn take(&self, id: ConnectionId) -> Vec<ServerMessage> {
            self.inbox.lock().unwrap().remove(&id).unwrap_or_default()
        }
    }

    impl Broadcaster for RecordingBroadcaster {
        fn subscribe(&self, id: ConnectionId, room: &str) {
            self.groups.lock().unwrap().entry(room.to_string()).or_default().push(id);
        }

        fn unsubscribe(&self, id: ConnectionId, room: &str) {
            if let Some(members) = self.groups.lock().unwrap().get_mut(room) {
                members.retain(|member| *member != id);
            }
        }

        fn send_to(&self, id: ConnectionId, msg: &ServerMessage) {
            self.inbox.lock().unwrap().entry(id).or_default().push(msg.clone());
        }

        fn broadcast(&self, room: &str, msg: &ServerMessage, exclude: Option<ConnectionId>) {
            let members = self.groups.lock().unwrap().get(room).cloned().unwrap_or_default();
            for id in members.into_iter().filter(|id| Some(*id) != exclude) {
                self.send_to(id, msg);
            }
        }
    }

    pub(crate) fn test_config() -> ChatConfig {
        ChatConfig {
            bot_name: "ChatBot".to_string(),
            welcome_message: "Welcome to our chat!".to_string(),
            map_base_url: "https://www.google.co.il/maps".to_string(),
            max_users: None,
        }
    }

    fn setup() -> (ChatHandler, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let handler = ChatHandler::new(&test_config(), ProfanityFilter::default(), broadcaster.clone())
            .expect("handler should build");
        (handler, broadcaster)
    }

    fn texts(messages: &[ServerMessage]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|msg| match msg {
                ServerMessage::Message(m) => Some(format!("{}: {}", m.username, m.text)),
                _ => None,
            })
            .collect()
    }

    fn last_roster(messages: &[ServerMessage]) -> Option<RoomData> {
        messages.iter().rev().find_map(|msg| match msg {
            ServerMessage::RoomData(data) => Some(data.clone()),
            _ => None,
        })
    }

    fn roster_names(data: &RoomData) -> Vec<&str> {
        data.users.iter().map(|u| u.username.as_str()).collect()
    }

    #[test]
    fn test_join_welcomes_caller_and_announces_to_others() {
        let (handler, outbox) = setup();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        handler.join(alice, "alice", "lobby").unwrap();
        let alice_msgs = outbox.take(alice);
        assert_eq!(texts(&alice_msgs), vec!["ChatBot: Welcome to our chat!"]);
        assert_eq!(roster_names(&last_roster(&alice_msgs).unwrap()), vec!["alice"]);

        handler.join(bob, "bob", "lobby").unwrap();
        let alice_msgs = outbox.take(alice);
        assert_eq!(texts(&alice_msgs), vec!["ChatBot: bob has joined!"]);
        assert_eq!(roster_names(&last_roster(&alice_msgs).unwrap()), vec!["alice", "bob"]);

        let bob_msgs = outbox.take(bob);
        assert_eq!(texts(&bob_msgs), vec!["ChatBot: Welcome to our chat!"]);
        let roster = last_roster(&bob_msgs).unwrap();
        assert_eq!(roster.room, "lobby");
        assert_eq!(roster_names(&roster), vec!["alice", "bob"]);
    }

    #[test_log::test]
    fn test_join_rejections_have_no_side_effects() {
        let (handler, outbox) = setup();
        let alice = Uuid::new_v4();
        let other = Uuid::new_v4();
        handler.join(alice, "alice", "lobby").unwrap();
        outbox.take(alice);

        assert_eq!(handler.join(other, "", "lobby"), Err(ChatError::Validation));
        assert_eq!(handler.join(other, "alice", "lobby"), Err(ChatError::Conflict));
        assert!(outbox.take(alice).is_empty());
        assert!(outbox.take(other).is_empty());
        assert_eq!(handler.user_count(), 1);

        assert!(handler.join(other, "alice", "office").is_ok());
    }

    #[test]
    fn test_join_twice_is_rejected() {
        let (handler, _outbox) = setup();
        let id = Uuid::new_v4();
        handler.join(id, "alice", "lobby").unwrap();
        assert_eq!(handler.join(id, "alice2", "office"), Err(ChatError::AlreadyJoined));
        assert!(handler.users_in_room("office").is_empty());
    }

    #[test]
    fn test_messages_reach_whole_room_including_sender_only() {
        let (handler, outbox) = setup();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        handler.join(alice, "alice", "lobby").unwrap();
        handler.join(bob, "bob", "lobby").unwrap();
        handler.join(carol, "carol", "office").unwrap();
        for id in [alice, bob, carol] {
            outbox.take(id);
        }

        handler.send_message(alice, "hi all").unwrap();
        assert_eq!(texts(&outbox.take(alice)), vec!["alice: hi all"]);
        assert_eq!(texts(&outbox.take(bob)), vec!["alice: hi all"]);
        assert!(outbox.take(carol).is_empty());
    }

    #[test_log::test]
    fn test_empty_and_profane_messages_are_not_broadcast() {
        let (handler, outbox) = setup();
        let alice = Uuid::new_v4();
        handler.join(alice, "alice", "lobby").unwrap();
        outbox.take(alice);

        assert_eq!(handler.send_message(alice, ""), Err(ChatError::EmptyMessage));
        assert_eq!(handler.send_message(alice, "oh shit"), Err(ChatError::Profanity));
        assert!(outbox.take(alice).is_empty());
    }

    #[test]
    fn test_unjoined_connection_cannot_send() {
        let (handler, _outbox) = setup();
        let id = Uuid::new_v4();
        assert_eq!(handler.send_message(id, "hello"), Err(ChatError::NotJoined));
        assert_eq!(
            handler.send_location(id, Coordinates { latitude: 1.0, longitude: 2.0 }),
            Err(ChatError::NotJoined)
        );
    }

    #[test]
    fn test_location_is_broadcast_as_map_link() {
        let (handler, outbox) = setup();
        let alice = Uuid::new_v4();
        handler.join(alice, "alice", "lobby").unwrap();
        outbox.take(alice);

        handler
            .send_location(alice, Coordinates { latitude: 32.08, longitude: 34.78 })
            .unwrap();
        match outbox.take(alice).as_slice() {
            [ServerMessage::LocationMessage(loc)] => {
                assert_eq!(loc.username, "alice");
                assert_eq!(loc.url, "https://www.google.co.il/maps?q=32.08,34.78");
            }
            other => panic!("Expected one location message, got {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_announces_departure_to_remaining_members() {
        let (handler, outbox) = setup();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        handler.join(alice, "alice", "lobby").unwrap();
        handler.join(bob, "bob", "lobby").unwrap();
        outbox.take(alice);
        outbox.take(bob);

        let removed = handler.disconnect(bob).unwrap();
        assert_eq!(removed.username, "bob");

        let alice_msgs = outbox.take(alice);
        assert_eq!(texts(&alice_msgs), vec!["ChatBot: bob has left!"]);
        assert_eq!(roster_names(&last_roster(&alice_msgs).unwrap()), vec!["alice"]);
        assert!(outbox.take(bob).is_empty());
        assert!(handler.disconnect(bob).is_none());
    }

    #[test]
    fn test_disconnect_without_join_emits_nothing() {
        let mut broadcaster = MockBroadcaster::new();
        broadcaster.expect_subscribe().never();
        broadcaster.expect_unsubscribe().never();
        broadcaster.expect_send_to().never();
        broadcaster.expect_broadcast().never();

        let handler =
            ChatHandler::new(&test_config(), ProfanityFilter::default(), Arc::new(broadcaster)).unwrap();
        assert!(handler.disconnect(Uuid::new_v4()).is_none());
        assert_eq!(handler.user_count(), 0);
    }

    #[test]
    fn test_empty_message_never_reaches_broadcaster() {
        let mut broadcaster = MockBroadcaster::new();
        broadcaster.expect_subscribe().times(1).return_const(());
        broadcaster.expect_send_to().times(1).return_const(());
        // Join announcement and roster only.
        broadcaster.expect_broadcast().times(2).return_const(());

        let handler =
            ChatHandler::new(&test_config(), ProfanityFilter::default(), Arc::new(broadcaster)).unwrap();
        let id = Uuid::new_v4();
        handler.join(id, "alice", "lobby").unwrap();
        assert_eq!(handler.send_message(id, ""), Err(ChatError::EmptyMessage));
    }

    #[test]
    fn test_capacity_limit_from_config() {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let config = ChatConfig {
            max_users: Some(1),
            ..test_config()
        };
        let handler = ChatHandler::new(&config, ProfanityFilter::default(), broadcaster).unwrap();
        handler.join(Uuid::new_v4(), "alice", "lobby").unwrap();
        assert_eq!(
            handler.join(Uuid::new_v4(), "bob", "lobby"),
            Err(ChatError::CapacityReached)
        );
    }

    #[test]
    fn test_invalid_map_url_is_a_config_error() {
        let config = ChatConfig {
            map_base_url: "not a url".to_string(),
            ..test_config()
        };
        let result = ChatHandler::new(
            &config,
            ProfanityFilter::default(),
            Arc::new(RecordingBroadcaster::default()),
        );
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
