pub mod auth;
pub mod database;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,

    // Logging
    pub log_level: String,

    pub version: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            auth: auth::AuthConfig::from_env(),

            log_level: env::var("ATRIUM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
