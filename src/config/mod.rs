use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;

use crate::chat::FilterConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
    /// How often each session pings its client.
    pub heartbeat_interval_ms: u64,
    /// Silence after which a session is closed and its user removed.
    pub heartbeat_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub bot_name: String,
    pub welcome_message: String,
    pub map_base_url: String,
    /// Upper bound on joined users across all rooms; unbounded when unset.
    #[serde(default)]
    pub max_users: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub profanity: FilterConfig,
    pub cors: CorsConfig,
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
    environment: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("environment", environment)?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("server.heartbeat_interval_ms", 30_000)?
        .set_default("server.heartbeat_timeout_ms", 40_000)?
        .set_default("chat.bot_name", "ChatBot")?
        .set_default("chat.welcome_message", "Welcome to our chat!")?
        .set_default("chat.map_base_url", "https://www.google.co.il/maps")?
        .set_default("cors.enabled", true)?
        .set_default("cors.allow_any_origin", true)?
        .set_default("cors.max_age", 3600)
}

/// Reads the bare `PORT` variable, the one knob most hosts set.
fn port_override() -> Result<Option<i64>, ConfigError> {
    match env::var("PORT") {
        Ok(raw) => raw
            .trim()
            .parse::<u16>()
            .map(|port| Some(i64::from(port)))
            .map_err(|e| ConfigError::Message(format!("Invalid PORT {:?}: {}", raw, e))),
        Err(_) => Ok(None),
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = with_defaults(Config::builder(), "development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_CHAT__BOT_NAME=Relay` would set `Settings.chat.bot_name`
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            )
            .set_override_option("server.port", port_override()?)?
            .build()?;

        s.try_deserialize()
    }

    #[cfg(test)]
    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults(Config::builder(), "test")?
            .set_override("server.host", "127.0.0.1")?
            .set_override("server.workers", 1)?
            .build()?
            .try_deserialize()
    }
}
