pub mod chat;
pub mod config;
pub mod error;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use chat::{ChatHandler, MembershipRegistry, ProfanityFilter, UserRecord};
pub use websocket::{ClientMessage, ConnectionPool, ServerMessage};

/// Identifier the transport assigns to each socket for its lifetime.
pub type ConnectionId = uuid::Uuid;

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and live counts
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": state.pool.connection_count(),
        "users": state.handler.user_count(),
    }))
}

/// Registers the relay's HTTP routes on an actix app.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(websocket::websocket_route));
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub pool: Arc<ConnectionPool>,
    pub handler: Arc<ChatHandler>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self> {
        let pool = Arc::new(ConnectionPool::new());
        let filter = ProfanityFilter::new(&config.profanity);
        let handler = ChatHandler::new(&config.chat, filter, pool.clone())?;

        Ok(Self {
            config: Arc::new(config),
            pool,
            handler: Arc::new(handler),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creation() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).expect("state should build");
        assert_eq!(state.pool.connection_count(), 0);
        assert_eq!(state.handler.user_count(), 0);
    }

    #[test]
    fn test_app_state_rejects_bad_map_url() {
        let mut config = Settings::new_for_test().expect("Failed to load test config");
        config.chat.map_base_url = "::".to_string();
        assert!(matches!(AppState::new(config), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_app_state_clone() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::new(config).unwrap();
        let cloned = state.clone();

        // Verify Arc references are shared
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.pool, &cloned.pool));
        assert!(Arc::ptr_eq(&state.handler, &cloned.handler));
    }
}
