use libsql::params;
use uuid::Uuid;

use crate::db::{
    ClientStore, CreateProjectFileParams, CreateProjectParams, ProjectFileRecord,
    ProjectFileStore, ProjectListEntry, ProjectMemberRecord, ProjectMemberStore, ProjectRecord,
    ProjectStatus, ProjectStore, TeamMemberStore, UpdateProjectParams,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, get_i64, get_opt_text, get_text, opt_date, opt_decimal, opt_text, opt_uuid,
    parse_opt_date, parse_opt_decimal, parse_opt_uuid, parse_ts, parse_uuid,
};

const PROJECT_COLUMNS: &str = "p.id, p.user_id, p.client_id, p.name, p.description, p.status, \
     p.progress, p.budget, p.start_date, p.due_date, p.created_at, p.updated_at";

const MAX_PROGRESS: u8 = 100;

fn parse_project_status(raw: &str) -> Result<ProjectStatus, DatabaseError> {
    ProjectStatus::from_db_value(raw)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid project status '{}'", raw)))
}

fn row_to_project_record(row: &libsql::Row) -> Result<ProjectRecord, DatabaseError> {
    let progress = get_i64(row, 6).clamp(0, i64::from(MAX_PROGRESS));
    Ok(ProjectRecord {
        id: parse_uuid(&get_text(row, 0), "project.id")?,
        user_id: get_text(row, 1),
        client_id: parse_opt_uuid(get_opt_text(row, 2), "project.client_id")?,
        name: get_text(row, 3),
        description: get_opt_text(row, 4),
        status: parse_project_status(&get_text(row, 5))?,
        progress: u8::try_from(progress).unwrap_or(MAX_PROGRESS),
        budget: parse_opt_decimal(get_opt_text(row, 7), "project.budget")?,
        start_date: parse_opt_date(get_opt_text(row, 8), "project.start_date")?,
        due_date: parse_opt_date(get_opt_text(row, 9), "project.due_date")?,
        created_at: parse_ts(&get_text(row, 10))?,
        updated_at: parse_ts(&get_text(row, 11))?,
    })
}

fn row_to_project_member(row: &libsql::Row) -> Result<ProjectMemberRecord, DatabaseError> {
    Ok(ProjectMemberRecord {
        id: parse_uuid(&get_text(row, 0), "project_member.id")?,
        project_id: parse_uuid(&get_text(row, 1), "project_member.project_id")?,
        team_member_id: parse_uuid(&get_text(row, 2), "project_member.team_member_id")?,
        role: get_opt_text(row, 3),
        created_at: parse_ts(&get_text(row, 4))?,
    })
}

fn row_to_project_file(row: &libsql::Row) -> Result<ProjectFileRecord, DatabaseError> {
    Ok(ProjectFileRecord {
        id: parse_uuid(&get_text(row, 0), "project_file.id")?,
        project_id: parse_uuid(&get_text(row, 1), "project_file.project_id")?,
        uploaded_by: parse_opt_uuid(get_opt_text(row, 2), "project_file.uploaded_by")?,
        file_name: get_text(row, 3),
        storage_path: get_text(row, 4),
        content_type: get_opt_text(row, 5),
        size_bytes: get_i64(row, 6),
        created_at: parse_ts(&get_text(row, 7))?,
    })
}

fn require_project_name(name: &str) -> Result<&str, DatabaseError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DatabaseError::Validation(
            "project name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

impl LibSqlBackend {
    async fn ensure_client_owned(
        &self,
        user_id: &str,
        client_id: Option<Uuid>,
    ) -> Result<(), DatabaseError> {
        if let Some(client_id) = client_id
            && self.get_client(user_id, client_id).await?.is_none()
        {
            return Err(DatabaseError::NotFound {
                entity: "client".to_string(),
                id: client_id.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_project_owned(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<(), DatabaseError> {
        if self.get_project(user_id, project_id).await?.is_none() {
            return Err(DatabaseError::NotFound {
                entity: "project".to_string(),
                id: project_id.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_team_member_owned(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<(), DatabaseError> {
        if self.get_team_member(user_id, team_member_id).await?.is_none() {
            return Err(DatabaseError::NotFound {
                entity: "team member".to_string(),
                id: team_member_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProjectStore for LibSqlBackend {
    async fn create_project(
        &self,
        user_id: &str,
        input: &CreateProjectParams,
    ) -> Result<ProjectRecord, DatabaseError> {
        let name = require_project_name(&input.name)?;
        self.ensure_client_owned(user_id, input.client_id).await?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO projects (id, user_id, client_id, name, description, status, progress, budget, start_date, due_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.to_string(),
                user_id,
                opt_uuid(input.client_id),
                name,
                opt_text(input.description.as_deref()),
                input.status.as_str(),
                i64::from(input.progress.min(MAX_PROGRESS)),
                opt_decimal(input.budget),
                opt_date(input.start_date),
                opt_date(input.due_date),
            ],
        )
        .await?;

        self.get_project(user_id, id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created project".to_string()))
    }

    async fn list_projects(&self, user_id: &str) -> Result<Vec<ProjectListEntry>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {PROJECT_COLUMNS}, c.name FROM projects p \
                     LEFT JOIN clients c ON c.id = p.client_id \
                     WHERE p.user_id = ?1 ORDER BY p.created_at DESC, p.rowid DESC"
                ),
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(ProjectListEntry {
                project: row_to_project_record(&row)?,
                client_name: get_opt_text(&row, 12),
            });
        }
        Ok(out)
    }

    async fn get_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Option<ProjectRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.user_id = ?1 AND p.id = ?2 LIMIT 1"
                ),
                params![user_id, project_id.to_string()],
            )
            .await?
            .next()
            .await?;

        row.map(|row| row_to_project_record(&row)).transpose()
    }

    async fn update_project(
        &self,
        user_id: &str,
        project_id: Uuid,
        input: &UpdateProjectParams,
    ) -> Result<Option<ProjectRecord>, DatabaseError> {
        let Some(existing) = self.get_project(user_id, project_id).await? else {
            return Ok(None);
        };

        let merged_name =
            require_project_name(input.name.as_deref().unwrap_or(existing.name.as_str()))?;
        let merged_client_id = input.client_id.unwrap_or(existing.client_id);
        if merged_client_id != existing.client_id {
            self.ensure_client_owned(user_id, merged_client_id).await?;
        }
        let merged_description = input.description.clone().unwrap_or(existing.description);
        let merged_status = input.status.unwrap_or(existing.status);
        let merged_progress = input.progress.unwrap_or(existing.progress).min(MAX_PROGRESS);
        let merged_budget = input.budget.unwrap_or(existing.budget);
        let merged_start = input.start_date.unwrap_or(existing.start_date);
        let merged_due = input.due_date.unwrap_or(existing.due_date);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE projects SET \
               client_id = ?3, \
               name = ?4, \
               description = ?5, \
               status = ?6, \
               progress = ?7, \
               budget = ?8, \
               start_date = ?9, \
               due_date = ?10, \
               updated_at = datetime('now') \
             WHERE user_id = ?1 AND id = ?2",
            params![
                user_id,
                project_id.to_string(),
                opt_uuid(merged_client_id),
                merged_name,
                opt_text(merged_description.as_deref()),
                merged_status.as_str(),
                i64::from(merged_progress),
                opt_decimal(merged_budget),
                opt_date(merged_start),
                opt_date(merged_due),
            ],
        )
        .await?;

        self.get_project(user_id, project_id).await
    }

    async fn set_project_status(
        &self,
        user_id: &str,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Option<ProjectRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE projects SET status = ?3, updated_at = datetime('now') \
                 WHERE user_id = ?1 AND id = ?2",
                params![user_id, project_id.to_string(), status.as_str()],
            )
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_project(user_id, project_id).await
    }

    async fn delete_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM projects WHERE user_id = ?1 AND id = ?2",
                params![user_id, project_id.to_string()],
            )
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl ProjectMemberStore for LibSqlBackend {
    async fn add_project_member(
        &self,
        user_id: &str,
        project_id: Uuid,
        team_member_id: Uuid,
        role: Option<&str>,
    ) -> Result<ProjectMemberRecord, DatabaseError> {
        self.ensure_project_owned(user_id, project_id).await?;
        self.ensure_team_member_owned(user_id, team_member_id).await?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO project_members (id, project_id, team_member_id, role) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                project_id.to_string(),
                team_member_id.to_string(),
                opt_text(role),
            ],
        )
        .await?;

        let row = conn
            .query(
                "SELECT id, project_id, team_member_id, role, created_at \
                 FROM project_members WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| {
                DatabaseError::Query("failed to load created project member".to_string())
            })?;
        row_to_project_member(&row)
    }

    async fn list_project_members(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<ProjectMemberRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT pm.id, pm.project_id, pm.team_member_id, pm.role, pm.created_at \
                 FROM project_members pm JOIN projects p ON p.id = pm.project_id \
                 WHERE p.user_id = ?1 AND pm.project_id = ?2 \
                 ORDER BY pm.created_at ASC, pm.rowid ASC",
                params![user_id, project_id.to_string()],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_project_member(&row)?);
        }
        Ok(out)
    }

    async fn delete_members_for_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM project_members WHERE project_id = ?2 \
                 AND project_id IN (SELECT id FROM projects WHERE user_id = ?1)",
                params![user_id, project_id.to_string()],
            )
            .await?;
        Ok(deleted)
    }

    async fn delete_assignments_for_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM project_members WHERE team_member_id = ?2 \
                 AND team_member_id IN (SELECT id FROM team_members WHERE user_id = ?1)",
                params![user_id, team_member_id.to_string()],
            )
            .await?;
        Ok(deleted)
    }
}

#[async_trait::async_trait]
impl ProjectFileStore for LibSqlBackend {
    async fn create_project_file(
        &self,
        user_id: &str,
        project_id: Uuid,
        input: &CreateProjectFileParams,
    ) -> Result<ProjectFileRecord, DatabaseError> {
        if input.file_name.trim().is_empty() {
            return Err(DatabaseError::Validation(
                "file name cannot be empty".to_string(),
            ));
        }
        if input.size_bytes < 0 {
            return Err(DatabaseError::Validation(
                "file size cannot be negative".to_string(),
            ));
        }
        self.ensure_project_owned(user_id, project_id).await?;
        if let Some(uploader) = input.uploaded_by {
            self.ensure_team_member_owned(user_id, uploader).await?;
        }

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO project_files (id, project_id, uploaded_by, file_name, storage_path, content_type, size_bytes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.to_string(),
                project_id.to_string(),
                opt_uuid(input.uploaded_by),
                input.file_name.trim(),
                input.storage_path.as_str(),
                opt_text(input.content_type.as_deref()),
                input.size_bytes,
            ],
        )
        .await?;

        let row = conn
            .query(
                "SELECT id, project_id, uploaded_by, file_name, storage_path, content_type, size_bytes, created_at \
                 FROM project_files WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created file".to_string()))?;
        row_to_project_file(&row)
    }

    async fn list_project_files(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<ProjectFileRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT f.id, f.project_id, f.uploaded_by, f.file_name, f.storage_path, f.content_type, f.size_bytes, f.created_at \
                 FROM project_files f JOIN projects p ON p.id = f.project_id \
                 WHERE p.user_id = ?1 AND f.project_id = ?2 \
                 ORDER BY f.created_at DESC, f.rowid DESC",
                params![user_id, project_id.to_string()],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_project_file(&row)?);
        }
        Ok(out)
    }

    async fn delete_files_for_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM project_files WHERE project_id = ?2 \
                 AND project_id IN (SELECT id FROM projects WHERE user_id = ?1)",
                params![user_id, project_id.to_string()],
            )
            .await?;
        Ok(deleted)
    }

    async fn clear_uploader_for_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE project_files SET uploaded_by = NULL WHERE uploaded_by = ?2 \
                 AND uploaded_by IN (SELECT id FROM team_members WHERE user_id = ?1)",
                params![user_id, team_member_id.to_string()],
            )
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::db::libsql::test_support::setup_backend;
    use crate::db::{
        ClientStore, CreateClientParams, CreateProjectFileParams, CreateProjectParams,
        CreateTeamMemberParams, ProjectFileStore, ProjectMemberStore, ProjectStatus, ProjectStore,
        TeamMemberStore, UpdateProjectParams,
    };
    use crate::error::DatabaseError;

    fn file(name: &str, uploaded_by: Option<Uuid>) -> CreateProjectFileParams {
        CreateProjectFileParams {
            uploaded_by,
            file_name: name.to_string(),
            storage_path: format!("projects/{name}"),
            content_type: Some("application/pdf".to_string()),
            size_bytes: 2048,
        }
    }

    #[tokio::test]
    async fn list_projects_joins_client_name() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let client = store
            .create_client(
                "u1",
                &CreateClientParams {
                    name: "Acme".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("client");
        let mut with_client = CreateProjectParams::named("Rebrand");
        with_client.client_id = Some(client.id);
        with_client.budget = Some(dec!(1500.50));
        store.create_project("u1", &with_client).await.expect("project");
        store
            .create_project("u1", &CreateProjectParams::named("Internal"))
            .await
            .expect("project");

        let listed = store.list_projects("u1").await.expect("list");
        assert_eq!(listed.len(), 2);
        let rebrand = listed
            .iter()
            .find(|entry| entry.project.name == "Rebrand")
            .expect("rebrand listed");
        assert_eq!(rebrand.client_name.as_deref(), Some("Acme"));
        assert_eq!(rebrand.project.budget, Some(dec!(1500.50)));
        let internal = listed
            .iter()
            .find(|entry| entry.project.name == "Internal")
            .expect("internal listed");
        assert_eq!(internal.client_name, None);
    }

    #[tokio::test]
    async fn project_cannot_reference_foreign_client() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let foreign = store
            .create_client(
                "u2",
                &CreateClientParams {
                    name: "Not yours".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("client");
        let mut params = CreateProjectParams::named("Sneaky");
        params.client_id = Some(foreign.id);

        let err = store
            .create_project("u1", &params)
            .await
            .expect_err("foreign client must be rejected");
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn progress_is_clamped_to_one_hundred() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let mut params = CreateProjectParams::named("Overachiever");
        params.progress = 250;
        let project = store.create_project("u1", &params).await.expect("create");
        assert_eq!(project.progress, 100);

        let updated = store
            .update_project(
                "u1",
                project.id,
                &UpdateProjectParams {
                    progress: Some(42),
                    description: Some(Some("phase two".to_string())),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("exists");
        assert_eq!(updated.progress, 42);
        assert_eq!(updated.description.as_deref(), Some("phase two"));
    }

    #[tokio::test]
    async fn set_project_status_is_owner_scoped() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let project = store
            .create_project("u1", &CreateProjectParams::named("Site"))
            .await
            .expect("create");

        let foreign = store
            .set_project_status("u2", project.id, ProjectStatus::Completed)
            .await
            .expect("foreign update");
        assert!(foreign.is_none());

        let updated = store
            .set_project_status("u1", project.id, ProjectStatus::Completed)
            .await
            .expect("update")
            .expect("exists");
        assert_eq!(updated.status, ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn member_and_file_cleanup_counts_rows() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let project = store
            .create_project("u1", &CreateProjectParams::named("App"))
            .await
            .expect("project");
        let dev = store
            .create_team_member("u1", &CreateTeamMemberParams::named("Dev"))
            .await
            .expect("member");
        let designer = store
            .create_team_member("u1", &CreateTeamMemberParams::named("Designer"))
            .await
            .expect("member");

        store
            .add_project_member("u1", project.id, dev.id, Some("lead"))
            .await
            .expect("assign");
        store
            .add_project_member("u1", project.id, designer.id, None)
            .await
            .expect("assign");
        store
            .create_project_file("u1", project.id, &file("brief.pdf", Some(dev.id)))
            .await
            .expect("file");

        // Foreign owners cannot reach the rows.
        assert_eq!(
            store
                .delete_members_for_project("u2", project.id)
                .await
                .expect("foreign delete"),
            0
        );
        assert_eq!(
            store
                .clear_uploader_for_team_member("u2", dev.id)
                .await
                .expect("foreign clear"),
            0
        );

        assert_eq!(
            store
                .clear_uploader_for_team_member("u1", dev.id)
                .await
                .expect("clear"),
            1
        );
        let files = store
            .list_project_files("u1", project.id)
            .await
            .expect("files");
        assert_eq!(files[0].uploaded_by, None);

        assert_eq!(
            store
                .delete_members_for_project("u1", project.id)
                .await
                .expect("delete members"),
            2
        );
        assert_eq!(
            store
                .delete_files_for_project("u1", project.id)
                .await
                .expect("delete files"),
            1
        );
        assert!(
            store
                .list_project_members("u1", project.id)
                .await
                .expect("members")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn duplicate_assignment_is_a_constraint_error() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let project = store
            .create_project("u1", &CreateProjectParams::named("App"))
            .await
            .expect("project");
        let dev = store
            .create_team_member("u1", &CreateTeamMemberParams::named("Dev"))
            .await
            .expect("member");
        store
            .add_project_member("u1", project.id, dev.id, None)
            .await
            .expect("assign");

        let err = store
            .add_project_member("u1", project.id, dev.id, None)
            .await
            .expect_err("duplicate");
        assert!(matches!(err, DatabaseError::Constraint(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn project_with_dependents_cannot_be_deleted_directly() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let project = store
            .create_project("u1", &CreateProjectParams::named("App"))
            .await
            .expect("project");
        store
            .create_project_file("u1", project.id, &file("spec.pdf", None))
            .await
            .expect("file");

        let err = store
            .delete_project("u1", project.id)
            .await
            .expect_err("foreign key must block the delete");
        assert!(matches!(err, DatabaseError::Constraint(_)), "got {err:?}");
    }
}
