//! Chat module for the room relay
//!
//! This module holds the membership registry, the profanity filter,
//! the outbound message payloads and the handler that sequences
//! join, message, location and disconnect events.

mod filter;
mod handler;
mod messages;
mod registry;

pub use filter::{FilterConfig, ProfanityFilter};
pub use handler::{Broadcaster, ChatHandler};
pub use messages::{ChatMessage, Coordinates, LocationMessage, RoomData, RosterEntry};
pub use registry::{MembershipRegistry, UserRecord};

#[cfg(test)]
pub(crate) use handler::tests::{test_config, RecordingBroadcaster};
