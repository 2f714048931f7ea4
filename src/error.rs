use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Chat error: {0}")]
    ChatError(#[from] ChatError),

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] WebSocketError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": message
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ChatError(ChatError::Conflict) => StatusCode::CONFLICT,
            AppError::ChatError(ChatError::CapacityReached) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ChatError(_) => StatusCode::BAD_REQUEST,
            AppError::WebSocketError(WebSocketError::HandshakeError(_)) => StatusCode::BAD_REQUEST,
            AppError::WebSocketError(WebSocketError::InvalidFormat(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Rejections reported back to the client that triggered them.
///
/// The `Display` text is exactly what the client sees in its `ack` frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Please provide a username and room name!")]
    Validation,

    #[error("Username is already taken!")]
    Conflict,

    #[error("Forgot to write something?")]
    EmptyMessage,

    #[error("Please don't use bad words.")]
    Profanity,

    #[error("You need to join a room first!")]
    NotJoined,

    #[error("You have already joined a room!")]
    AlreadyJoined,

    #[error("The chat is full, please try again later.")]
    CapacityReached,
}

#[derive(Error, Debug)]
pub enum WebSocketError {
    #[error("Handshake failed: {0}")]
    HandshakeError(String),

    #[error("Message sending failed: {0}")]
    SendError(String),

    #[error("Invalid message format: {0}")]
    InvalidFormat(String),
}
