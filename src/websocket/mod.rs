//! WebSocket module for the room relay
//!
//! This module holds the wire protocol, the per-connection state
//! machine, the connection pool that fans messages out to rooms and
//! the actix session actor that owns each socket.

mod connection;
mod pool;
mod session;

pub use connection::{ClientMessage, Connection, ConnectionState, ServerMessage};
pub use pool::ConnectionPool;
pub use session::{websocket_route, WebSocketSession};
