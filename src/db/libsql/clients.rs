use libsql::params;
use uuid::Uuid;

use crate::db::{
    ClientRecord, ClientStore, CreateClientParams, UpdateClientParams, UpsertUserProfileParams,
    UserProfileRecord, UserProfileStore, UserRole,
};
use crate::error::DatabaseError;

use super::{LibSqlBackend, get_opt_text, get_text, opt_text, parse_ts, parse_uuid};

const CLIENT_COLUMNS: &str =
    "id, user_id, name, email, phone, company, address, notes, created_at, updated_at";

fn row_to_client_record(row: &libsql::Row) -> Result<ClientRecord, DatabaseError> {
    Ok(ClientRecord {
        id: parse_uuid(&get_text(row, 0), "client.id")?,
        user_id: get_text(row, 1),
        name: get_text(row, 2),
        email: get_opt_text(row, 3),
        phone: get_opt_text(row, 4),
        company: get_opt_text(row, 5),
        address: get_opt_text(row, 6),
        notes: get_opt_text(row, 7),
        created_at: parse_ts(&get_text(row, 8))?,
        updated_at: parse_ts(&get_text(row, 9))?,
    })
}

fn row_to_user_profile(row: &libsql::Row) -> Result<UserProfileRecord, DatabaseError> {
    let role_raw = get_text(row, 3);
    Ok(UserProfileRecord {
        user_id: get_text(row, 0),
        email: get_opt_text(row, 1),
        full_name: get_opt_text(row, 2),
        role: UserRole::from_db_value(&role_raw)
            .ok_or_else(|| DatabaseError::Serialization(format!("invalid role '{}'", role_raw)))?,
        created_at: parse_ts(&get_text(row, 4))?,
        updated_at: parse_ts(&get_text(row, 5))?,
    })
}

fn require_name(name: &str) -> Result<&str, DatabaseError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DatabaseError::Validation(
            "client name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

#[async_trait::async_trait]
impl UserProfileStore for LibSqlBackend {
    async fn upsert_user_profile(
        &self,
        user_id: &str,
        input: &UpsertUserProfileParams,
    ) -> Result<UserProfileRecord, DatabaseError> {
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO user_profiles (user_id, email, full_name, role) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (user_id) DO UPDATE SET \
               email = COALESCE(excluded.email, user_profiles.email), \
               full_name = COALESCE(excluded.full_name, user_profiles.full_name), \
               role = excluded.role, \
               updated_at = datetime('now')",
            params![
                user_id,
                opt_text(input.email.as_deref()),
                opt_text(input.full_name.as_deref()),
                input.role.as_str(),
            ],
        )
        .await?;

        self.get_user_profile(user_id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load upserted profile".to_string()))
    }

    async fn get_user_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProfileRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT user_id, email, full_name, role, created_at, updated_at \
                 FROM user_profiles WHERE user_id = ?1 LIMIT 1",
                params![user_id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_user_profile(&row)).transpose()
    }
}

#[async_trait::async_trait]
impl ClientStore for LibSqlBackend {
    async fn create_client(
        &self,
        user_id: &str,
        input: &CreateClientParams,
    ) -> Result<ClientRecord, DatabaseError> {
        let name = require_name(&input.name)?;
        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO clients (id, user_id, name, email, phone, company, address, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                user_id,
                name,
                opt_text(input.email.as_deref()),
                opt_text(input.phone.as_deref()),
                opt_text(input.company.as_deref()),
                opt_text(input.address.as_deref()),
                opt_text(input.notes.as_deref()),
            ],
        )
        .await?;

        self.get_client(user_id, id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created client".to_string()))
    }

    async fn list_clients(&self, user_id: &str) -> Result<Vec<ClientRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CLIENT_COLUMNS} FROM clients WHERE user_id = ?1 ORDER BY name COLLATE NOCASE ASC"
                ),
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_client_record(&row)?);
        }
        Ok(out)
    }

    async fn get_client(
        &self,
        user_id: &str,
        client_id: Uuid,
    ) -> Result<Option<ClientRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE user_id = ?1 AND id = ?2 LIMIT 1"),
                params![user_id, client_id.to_string()],
            )
            .await?
            .next()
            .await?;

        row.map(|row| row_to_client_record(&row)).transpose()
    }

    async fn update_client(
        &self,
        user_id: &str,
        client_id: Uuid,
        input: &UpdateClientParams,
    ) -> Result<Option<ClientRecord>, DatabaseError> {
        let Some(existing) = self.get_client(user_id, client_id).await? else {
            return Ok(None);
        };

        let merged_name = require_name(input.name.as_deref().unwrap_or(existing.name.as_str()))?;
        let merged_email = input.email.clone().unwrap_or(existing.email);
        let merged_phone = input.phone.clone().unwrap_or(existing.phone);
        let merged_company = input.company.clone().unwrap_or(existing.company);
        let merged_address = input.address.clone().unwrap_or(existing.address);
        let merged_notes = input.notes.clone().unwrap_or(existing.notes);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE clients SET \
               name = ?3, \
               email = ?4, \
               phone = ?5, \
               company = ?6, \
               address = ?7, \
               notes = ?8, \
               updated_at = datetime('now') \
             WHERE user_id = ?1 AND id = ?2",
            params![
                user_id,
                client_id.to_string(),
                merged_name,
                opt_text(merged_email.as_deref()),
                opt_text(merged_phone.as_deref()),
                opt_text(merged_company.as_deref()),
                opt_text(merged_address.as_deref()),
                opt_text(merged_notes.as_deref()),
            ],
        )
        .await?;

        self.get_client(user_id, client_id).await
    }

    async fn delete_client(&self, user_id: &str, client_id: Uuid) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM clients WHERE user_id = ?1 AND id = ?2",
                params![user_id, client_id.to_string()],
            )
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use crate::db::libsql::test_support::setup_backend;
    use crate::db::{
        ClientStore, CreateClientParams, CreateProjectParams, ProjectStore, UpdateClientParams,
        UpsertUserProfileParams, UserProfileStore, UserRole,
    };

    #[tokio::test]
    async fn user_profile_upsert_keeps_existing_fields() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        store
            .upsert_user_profile(
                "u1",
                &UpsertUserProfileParams {
                    email: Some("ana@example.com".to_string()),
                    full_name: Some("Ana".to_string()),
                    role: UserRole::User,
                },
            )
            .await
            .expect("first upsert");
        let profile = store
            .upsert_user_profile(
                "u1",
                &UpsertUserProfileParams {
                    email: None,
                    full_name: None,
                    role: UserRole::Admin,
                },
            )
            .await
            .expect("second upsert");

        assert_eq!(profile.email.as_deref(), Some("ana@example.com"));
        assert_eq!(profile.full_name.as_deref(), Some("Ana"));
        assert_eq!(profile.role, UserRole::Admin);
        assert!(store.get_user_profile("u2").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn clients_are_scoped_to_owner() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let acme = store
            .create_client(
                "u1",
                &CreateClientParams {
                    name: "  Acme Corp ".to_string(),
                    company: Some("Acme".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("create client");
        assert_eq!(acme.name, "Acme Corp");

        assert!(
            store
                .get_client("u2", acme.id)
                .await
                .expect("foreign get")
                .is_none()
        );
        assert!(store.list_clients("u2").await.expect("list").is_empty());
        assert!(!store.delete_client("u2", acme.id).await.expect("foreign delete"));
        assert_eq!(store.list_clients("u1").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn update_client_clears_nullable_fields() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let client = store
            .create_client(
                "u1",
                &CreateClientParams {
                    name: "Globex".to_string(),
                    email: Some("ops@globex.test".to_string()),
                    phone: Some("555-0100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("create");

        let updated = store
            .update_client(
                "u1",
                client.id,
                &UpdateClientParams {
                    email: Some(None),
                    notes: Some(Some("net 30".to_string())),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("client exists");

        assert_eq!(updated.email, None);
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
        assert_eq!(updated.notes.as_deref(), Some("net 30"));

        let missing = store
            .update_client("u1", Uuid::new_v4(), &UpdateClientParams::default())
            .await
            .expect("update missing");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn empty_client_name_is_rejected() {
        let fixture = setup_backend().await;
        let result = fixture
            .backend
            .create_client(
                "u1",
                &CreateClientParams {
                    name: "   ".to_string(),
                    ..Default::default()
                },
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn deleting_client_nulls_project_reference() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let client = store
            .create_client(
                "u1",
                &CreateClientParams {
                    name: "Initech".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("create client");
        let mut params = CreateProjectParams::named("Website");
        params.client_id = Some(client.id);
        let project = store.create_project("u1", &params).await.expect("create project");

        assert!(store.delete_client("u1", client.id).await.expect("delete"));

        let project = store
            .get_project("u1", project.id)
            .await
            .expect("get project")
            .expect("project survives");
        assert_eq!(project.client_id, None);
    }
}
