use libsql::params;
use uuid::Uuid;

use crate::db::{
    CreateTeamMemberParams, TeamMemberRecord, TeamMemberStatus, TeamMemberStore,
    UpdateTeamMemberParams,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, get_opt_text, get_text, opt_decimal, opt_text, parse_opt_decimal, parse_ts,
    parse_uuid,
};

const TEAM_COLUMNS: &str =
    "id, user_id, name, email, phone, position, hourly_rate, status, created_at, updated_at";

fn row_to_team_member(row: &libsql::Row) -> Result<TeamMemberRecord, DatabaseError> {
    let status_raw = get_text(row, 7);
    Ok(TeamMemberRecord {
        id: parse_uuid(&get_text(row, 0), "team_member.id")?,
        user_id: get_text(row, 1),
        name: get_text(row, 2),
        email: get_opt_text(row, 3),
        phone: get_opt_text(row, 4),
        position: get_opt_text(row, 5),
        hourly_rate: parse_opt_decimal(get_opt_text(row, 6), "team_member.hourly_rate")?,
        status: TeamMemberStatus::from_db_value(&status_raw).ok_or_else(|| {
            DatabaseError::Serialization(format!("invalid team member status '{}'", status_raw))
        })?,
        created_at: parse_ts(&get_text(row, 8))?,
        updated_at: parse_ts(&get_text(row, 9))?,
    })
}

#[async_trait::async_trait]
impl TeamMemberStore for LibSqlBackend {
    async fn create_team_member(
        &self,
        user_id: &str,
        input: &CreateTeamMemberParams,
    ) -> Result<TeamMemberRecord, DatabaseError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation(
                "team member name cannot be empty".to_string(),
            ));
        }

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO team_members (id, user_id, name, email, phone, position, hourly_rate, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                user_id,
                name,
                opt_text(input.email.as_deref()),
                opt_text(input.phone.as_deref()),
                opt_text(input.position.as_deref()),
                opt_decimal(input.hourly_rate),
                input.status.as_str(),
            ],
        )
        .await?;

        self.get_team_member(user_id, id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created team member".to_string()))
    }

    async fn list_team_members(
        &self,
        user_id: &str,
    ) -> Result<Vec<TeamMemberRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {TEAM_COLUMNS} FROM team_members WHERE user_id = ?1 \
                     ORDER BY name COLLATE NOCASE ASC"
                ),
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_team_member(&row)?);
        }
        Ok(out)
    }

    async fn get_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<Option<TeamMemberRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {TEAM_COLUMNS} FROM team_members WHERE user_id = ?1 AND id = ?2 LIMIT 1"
                ),
                params![user_id, team_member_id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_team_member(&row)).transpose()
    }

    async fn update_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
        input: &UpdateTeamMemberParams,
    ) -> Result<Option<TeamMemberRecord>, DatabaseError> {
        let Some(existing) = self.get_team_member(user_id, team_member_id).await? else {
            return Ok(None);
        };

        let merged_name = input
            .name
            .as_deref()
            .unwrap_or(existing.name.as_str())
            .trim();
        if merged_name.is_empty() {
            return Err(DatabaseError::Validation(
                "team member name cannot be empty".to_string(),
            ));
        }
        let merged_email = input.email.clone().unwrap_or(existing.email);
        let merged_phone = input.phone.clone().unwrap_or(existing.phone);
        let merged_position = input.position.clone().unwrap_or(existing.position);
        let merged_rate = input.hourly_rate.unwrap_or(existing.hourly_rate);
        let merged_status = input.status.unwrap_or(existing.status);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE team_members SET \
               name = ?3, \
               email = ?4, \
               phone = ?5, \
               position = ?6, \
               hourly_rate = ?7, \
               status = ?8, \
               updated_at = datetime('now') \
             WHERE user_id = ?1 AND id = ?2",
            params![
                user_id,
                team_member_id.to_string(),
                merged_name,
                opt_text(merged_email.as_deref()),
                opt_text(merged_phone.as_deref()),
                opt_text(merged_position.as_deref()),
                opt_decimal(merged_rate),
                merged_status.as_str(),
            ],
        )
        .await?;

        self.get_team_member(user_id, team_member_id).await
    }

    async fn set_team_member_status(
        &self,
        user_id: &str,
        team_member_id: Uuid,
        status: TeamMemberStatus,
    ) -> Result<Option<TeamMemberRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE team_members SET status = ?3, updated_at = datetime('now') \
                 WHERE user_id = ?1 AND id = ?2",
                params![user_id, team_member_id.to_string(), status.as_str()],
            )
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_team_member(user_id, team_member_id).await
    }

    async fn delete_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM team_members WHERE user_id = ?1 AND id = ?2",
                params![user_id, team_member_id.to_string()],
            )
            .await?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::db::libsql::test_support::setup_backend;
    use crate::db::{
        CreateTeamMemberParams, TeamMemberStatus, TeamMemberStore, UpdateTeamMemberParams,
    };

    #[tokio::test]
    async fn team_members_sort_by_name_and_stay_scoped() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        for name in ["zoe", "Adam", "mia"] {
            store
                .create_team_member("u1", &CreateTeamMemberParams::named(name))
                .await
                .expect("create");
        }
        store
            .create_team_member("u2", &CreateTeamMemberParams::named("Other"))
            .await
            .expect("create");

        let names: Vec<String> = store
            .list_team_members("u1")
            .await
            .expect("list")
            .into_iter()
            .map(|member| member.name)
            .collect();
        assert_eq!(names, vec!["Adam", "mia", "zoe"]);
    }

    #[tokio::test]
    async fn update_team_member_merges_fields() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let mut params = CreateTeamMemberParams::named("Rui");
        params.email = Some("rui@studio.test".to_string());
        params.hourly_rate = Some(dec!(45.00));
        let member = store.create_team_member("u1", &params).await.expect("create");

        let updated = store
            .update_team_member(
                "u1",
                member.id,
                &UpdateTeamMemberParams {
                    position: Some(Some("Designer".to_string())),
                    hourly_rate: Some(None),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("exists");
        assert_eq!(updated.email.as_deref(), Some("rui@studio.test"));
        assert_eq!(updated.position.as_deref(), Some("Designer"));
        assert_eq!(updated.hourly_rate, None);
        assert_eq!(updated.status, TeamMemberStatus::Active);
    }

    #[tokio::test]
    async fn any_team_status_can_follow_any_other() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let member = store
            .create_team_member("u1", &CreateTeamMemberParams::named("Kai"))
            .await
            .expect("create");

        for status in [
            TeamMemberStatus::Terminated,
            TeamMemberStatus::Active,
            TeamMemberStatus::OnLeave,
            TeamMemberStatus::Terminated,
        ] {
            let updated = store
                .set_team_member_status("u1", member.id, status)
                .await
                .expect("set status")
                .expect("exists");
            assert_eq!(updated.status, status);
        }
    }
}
