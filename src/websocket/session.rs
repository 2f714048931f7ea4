use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use futures::channel::mpsc;
use tracing::{error, info, warn};

use crate::error::{AppError, WebSocketError};
use crate::websocket::{Connection, ConnectionPool, ServerMessage};
use crate::AppState;

/// WebSocket connection handler
/// This upgrades the HTTP connection to a WebSocket connection
pub async fn websocket_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let peer_addr = req
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!("New WebSocket connection request from: {}", peer_addr);

    let session = WebSocketSession::new(
        Connection::new(state.handler.clone()),
        state.pool.clone(),
        peer_addr,
    )
    .with_heartbeat(
        Duration::from_millis(state.config.server.heartbeat_interval_ms),
        Duration::from_millis(state.config.server.heartbeat_timeout_ms),
    );
    ws::start(session, &req, stream)
        .map_err(|e| AppError::WebSocketError(WebSocketError::HandshakeError(e.to_string())))
}

/// Actor that owns one socket and feeds its frames to a [`Connection`].
///
/// Everything written to the socket, replies included, goes through the
/// pool channel so a client sees frames in the order they were produced.
pub struct WebSocketSession {
    connection: Connection,
    pool: Arc<ConnectionPool>,
    peer_addr: String,
    last_heartbeat: Instant,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
}

impl WebSocketSession {
    fn new(connection: Connection, pool: Arc<ConnectionPool>, peer_addr: String) -> Self {
        Self {
            connection,
            pool,
            peer_addr,
            last_heartbeat: Instant::now(),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(40),
        }
    }

    fn with_heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.heartbeat_interval = interval;
        self.heartbeat_timeout = timeout;
        self
    }

    fn reply(&self, msg: ServerMessage) {
        let result = serde_json::to_string(&msg)
            .map_err(|e| WebSocketError::InvalidFormat(e.to_string()))
            .and_then(|text| self.pool.send_text(&self.connection.id(), text));
        if let Err(e) = result {
            error!("Failed to reply to {}: {}", self.peer_addr, e);
        }
    }

    fn start_heartbeat(&self, ctx: &mut <Self as Actor>::Context) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.heartbeat_timeout {
                warn!("Heartbeat timeout for connection {}", act.connection.id());
                ctx.close(Some(ws::CloseCode::Away.into()));
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for WebSocketSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "WebSocket connection established with {} (id: {})",
            self.peer_addr,
            self.connection.id()
        );

        let (tx, rx) = mpsc::unbounded();
        self.pool.add(self.connection.id(), tx);
        ctx.add_stream(rx);

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        self.connection.disconnect();
        self.pool.remove(&self.connection.id());
        info!(
            "WebSocket connection closed with {} (id: {})",
            self.peer_addr,
            self.connection.id()
        );
    }
}

/// Frames queued for this client by the pool.
impl StreamHandler<String> for WebSocketSession {
    fn handle(&mut self, text: String, ctx: &mut Self::Context) {
        ctx.text(text);
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {}
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WebSocketSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                let reply = self.connection.handle_text(&text);
                self.reply(reply);
            }
            Ok(ws::Message::Binary(bin)) => {
                warn!("Received binary message from {} of {} bytes", self.peer_addr, bin.len());
                self.reply(ServerMessage::Error {
                    message: "Binary messages are not supported".to_string(),
                });
            }
            Ok(ws::Message::Close(reason)) => {
                info!("WebSocket closed from {}: {:?}", self.peer_addr, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                error!("Error handling WebSocket message from {}: {}", self.peer_addr, e);
                ctx.stop();
            }
        }
    }
}
