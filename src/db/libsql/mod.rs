//! libSQL/Turso backend for the Database trait.
//!
//! Supports a local embedded file and a remote replica of a hosted database
//! (embedded replica synced over HTTP). Every connection enables
//! `PRAGMA foreign_keys`, so parent rows with dependents cannot be removed
//! before their references are cleared.

mod activity;
mod billing;
mod clients;
mod projects;
mod team;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use libsql::{Builder, Connection, Value};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::Database;
use crate::error::DatabaseError;

/// libSQL database backend.
///
/// The `libsql::Database` handle is shared; each operation opens its own
/// connection.
#[derive(Clone)]
pub struct LibSqlBackend {
    db: Arc<libsql::Database>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!(
                    "failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("failed to open libSQL database: {}", e)))?;

        tracing::debug!(path = %path.display(), "opened local libSQL database");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a local replica that syncs from a hosted database.
    pub async fn new_remote_replica(
        path: &Path,
        url: &str,
        auth_token: &str,
    ) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!(
                    "failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = Builder::new_remote_replica(path, url.to_string(), auth_token.to_string())
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("failed to open remote replica: {}", e)))?;

        db.sync()
            .await
            .map_err(|e| DatabaseError::Pool(format!("initial replica sync failed: {}", e)))?;

        tracing::info!(url, "opened libSQL remote replica");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a connection with foreign keys enforced.
    pub async fn connect(&self) -> Result<Connection, DatabaseError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("failed to connect: {}", e)))?;
        conn.execute("PRAGMA foreign_keys = ON", ()).await?;
        Ok(conn)
    }
}

#[async_trait::async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        conn.execute_batch(crate::db::libsql_migrations::SCHEMA)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        tracing::debug!("libSQL schema is up to date");
        Ok(())
    }
}

// ==================== Row helpers ====================

pub(crate) fn get_text(row: &libsql::Row, idx: i32) -> String {
    match row.get_value(idx) {
        Ok(Value::Text(s)) => s,
        Ok(Value::Integer(n)) => n.to_string(),
        Ok(Value::Real(f)) => f.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn get_opt_text(row: &libsql::Row, idx: i32) -> Option<String> {
    match row.get_value(idx) {
        Ok(Value::Text(s)) => Some(s),
        Ok(Value::Integer(n)) => Some(n.to_string()),
        Ok(Value::Real(f)) => Some(f.to_string()),
        _ => None,
    }
}

pub(crate) fn get_i64(row: &libsql::Row, idx: i32) -> i64 {
    match row.get_value(idx) {
        Ok(Value::Integer(n)) => n,
        Ok(Value::Text(s)) => s.parse().unwrap_or_default(),
        _ => 0,
    }
}

pub(crate) fn get_opt_i64(row: &libsql::Row, idx: i32) -> Option<i64> {
    match row.get_value(idx) {
        Ok(Value::Integer(n)) => Some(n),
        _ => None,
    }
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

pub(crate) fn opt_text_owned(value: Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s),
        None => Value::Null,
    }
}

pub(crate) fn opt_i64(value: Option<i64>) -> Value {
    match value {
        Some(n) => Value::Integer(n),
        None => Value::Null,
    }
}

pub(crate) fn opt_uuid(value: Option<Uuid>) -> Value {
    opt_text_owned(value.map(|id| id.to_string()))
}

pub(crate) fn opt_decimal(value: Option<Decimal>) -> Value {
    opt_text_owned(value.map(|d| d.to_string()))
}

pub(crate) fn opt_date(value: Option<NaiveDate>) -> Value {
    opt_text_owned(value.map(|d| d.format("%Y-%m-%d").to_string()))
}

/// Parse SQLite `datetime()` output, falling back to RFC 3339.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        Ok(naive) => Ok(naive.and_utc()),
        Err(_) => DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)),
    }
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    parse_timestamp(raw).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

pub(crate) fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw)
        .map_err(|e| DatabaseError::Serialization(format!("invalid {} uuid: {}", field, e)))
}

pub(crate) fn parse_opt_uuid(raw: Option<String>, field: &str) -> Result<Option<Uuid>, DatabaseError> {
    raw.map(|value| parse_uuid(&value, field)).transpose()
}

pub(crate) fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(raw)
        .map_err(|e| DatabaseError::Serialization(format!("invalid {} amount: {}", field, e)))
}

pub(crate) fn parse_opt_decimal(
    raw: Option<String>,
    field: &str,
) -> Result<Option<Decimal>, DatabaseError> {
    raw.map(|value| parse_decimal(&value, field)).transpose()
}

pub(crate) fn parse_opt_date(
    raw: Option<String>,
    field: &str,
) -> Result<Option<NaiveDate>, DatabaseError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|e| DatabaseError::Serialization(format!("invalid {} date: {}", field, e)))
    })
    .transpose()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::LibSqlBackend;
    use crate::db::Database;

    pub(crate) struct TestBackend {
        pub backend: LibSqlBackend,
        _tmpdir: tempfile::TempDir,
    }

    pub(crate) async fn setup_backend() -> TestBackend {
        // Use a temp-file database so all connections share schema/state.
        let tmpdir = tempfile::tempdir().expect("tempdir");
        let db_path = tmpdir.path().join("freelancedesk_test.db");
        let backend = LibSqlBackend::new_local(&db_path)
            .await
            .expect("local backend should initialize");
        backend
            .run_migrations()
            .await
            .expect("migrations should succeed");
        TestBackend {
            backend,
            _tmpdir: tmpdir,
        }
    }
}

#[cfg(test)]
mod tests {
    use libsql::params;

    use super::test_support::setup_backend;
    use super::parse_timestamp;
    use crate::db::Database;

    #[test]
    fn parse_timestamp_accepts_sqlite_and_rfc3339() {
        let parsed = parse_timestamp("2026-01-05 09:30:00").expect("sqlite format");
        assert_eq!(parsed.to_rfc3339(), "2026-01-05T09:30:00+00:00");
        assert!(parse_timestamp("2026-01-05T09:30:00Z").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[tokio::test]
    async fn schema_contains_business_tables() {
        let fixture = setup_backend().await;
        let conn = fixture.backend.connect().await.expect("connect");

        for table in [
            "user_profiles",
            "clients",
            "projects",
            "team_members",
            "project_members",
            "project_files",
            "invoices",
            "invoice_items",
            "contracts",
            "testimonials",
            "activities",
            "contact_submissions",
            "feedback_submissions",
        ] {
            let row = conn
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    params![table],
                )
                .await
                .expect("query sqlite_master")
                .next()
                .await
                .expect("row read");
            assert!(row.is_some(), "missing table {table}");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let fixture = setup_backend().await;
        fixture
            .backend
            .run_migrations()
            .await
            .expect("second migration run");
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let fixture = setup_backend().await;
        let conn = fixture.backend.connect().await.expect("connect");
        let err = conn
            .execute(
                "INSERT INTO project_members (id, project_id, team_member_id) VALUES ('m', 'nope', 'nope')",
                (),
            )
            .await
            .expect_err("dangling reference must be rejected");
        assert!(err.to_string().contains("FOREIGN KEY"), "unexpected: {err}");
    }
}
