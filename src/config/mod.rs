//! Configuration resolved from the environment.
//!
//! `main` loads `.env` through `dotenvy` before calling [`Config::from_env`],
//! so values can come from either source. Each sub-config resolves itself and
//! reports the offending key on failure.

mod database;
mod gateway;
pub(crate) mod helpers;
mod ui;

pub use database::{DatabaseBackend, DatabaseConfig, default_libsql_path};
pub use gateway::GatewayConfig;
pub use ui::UiConfig;

use crate::error::ConfigError;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub ui: UiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::resolve()?,
            gateway: GatewayConfig::resolve()?,
            ui: UiConfig::resolve()?,
        })
    }
}
