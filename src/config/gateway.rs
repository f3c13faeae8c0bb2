use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_string_env, parse_u16_env};
use crate::db::UserRole;
use crate::error::ConfigError;

/// Web gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token clients must present. Generated when unset.
    pub auth_token: SecretString,
    /// `true` when `auth_token` was generated rather than configured.
    pub auth_token_generated: bool,
    /// Owner of every row created through this gateway.
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_role: UserRole,
}

impl GatewayConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let (auth_token, auth_token_generated) = match optional_env("GATEWAY_AUTH_TOKEN")? {
            Some(token) => (SecretString::from(token), false),
            None => (
                SecretString::from(uuid::Uuid::new_v4().simple().to_string()),
                true,
            ),
        };

        let role_raw = parse_string_env("GATEWAY_USER_ROLE", "user".to_string())?;
        let user_role = UserRole::from_db_value(role_raw.trim()).ok_or_else(|| {
            ConfigError::InvalidValue {
                key: "GATEWAY_USER_ROLE".to_string(),
                message: format!("expected 'user' or 'admin', got '{role_raw}'"),
            }
        })?;

        let user_id = parse_string_env("GATEWAY_USER_ID", "default".to_string())?
            .trim()
            .to_string();
        if user_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "GATEWAY_USER_ID".to_string(),
                message: "user id must not be empty".to_string(),
            });
        }

        Ok(Self {
            host: parse_string_env("GATEWAY_HOST", "127.0.0.1".to_string())?,
            port: parse_u16_env("GATEWAY_PORT", 3400)?,
            auth_token,
            auth_token_generated,
            user_id,
            user_email: optional_env("GATEWAY_USER_EMAIL")?,
            user_role,
        })
    }
}
