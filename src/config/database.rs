use std::path::PathBuf;

use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_string_env};
use crate::error::ConfigError;

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    LibSql,
}

impl DatabaseBackend {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "libsql" | "sqlite" | "turso" => Ok(Self::LibSql),
            other => Err(ConfigError::InvalidValue {
                key: "DATABASE_BACKEND".to_string(),
                message: format!("unsupported backend '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// Local database file. For a remote replica this is the replica file.
    pub libsql_path: Option<PathBuf>,
    /// Hosted database URL; enables remote-replica mode.
    pub libsql_url: Option<String>,
    pub libsql_auth_token: Option<SecretString>,
}

/// Default on-disk location of the embedded database.
pub fn default_libsql_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("freelancedesk")
        .join("freelancedesk.db")
}

impl DatabaseConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let backend = DatabaseBackend::from_str(&parse_string_env(
            "DATABASE_BACKEND",
            "libsql".to_string(),
        )?)?;
        let libsql_url = optional_env("LIBSQL_URL")?;
        let libsql_auth_token = optional_env("LIBSQL_AUTH_TOKEN")?.map(SecretString::from);
        if libsql_url.is_some() && libsql_auth_token.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "LIBSQL_AUTH_TOKEN".to_string(),
            });
        }

        Ok(Self {
            backend,
            libsql_path: optional_env("LIBSQL_PATH")?.map(PathBuf::from),
            libsql_url,
            libsql_auth_token,
        })
    }

    /// Local file-backed config, used by tests and `migrate --path`.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: DatabaseBackend::LibSql,
            libsql_path: Some(path.into()),
            libsql_url: None,
            libsql_auth_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DatabaseBackend;

    #[test]
    fn backend_aliases_resolve_to_libsql() {
        for raw in ["libsql", "SQLite", " turso "] {
            assert_eq!(
                DatabaseBackend::from_str(raw).expect("alias"),
                DatabaseBackend::LibSql
            );
        }
        assert!(DatabaseBackend::from_str("postgres").is_err());
    }

    #[test]
    fn default_path_ends_with_db_file() {
        let path = super::default_libsql_path();
        assert!(path.ends_with("freelancedesk/freelancedesk.db"));
    }
}
