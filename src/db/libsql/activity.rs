use libsql::params;
use uuid::Uuid;

use crate::db::{
    ActivityRecord, ActivityStore, ContactSubmissionRecord, CreateActivityParams,
    CreateContactSubmissionParams, CreateFeedbackParams, EntityType, FeedbackSubmissionRecord,
    SubmissionStore,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, get_opt_i64, get_opt_text, get_text, opt_i64, opt_text, parse_ts, parse_uuid,
};

fn row_to_activity(row: &libsql::Row) -> Result<ActivityRecord, DatabaseError> {
    let entity_raw = get_text(row, 2);
    Ok(ActivityRecord {
        id: parse_uuid(&get_text(row, 0), "activity.id")?,
        user_id: get_text(row, 1),
        entity_type: EntityType::from_db_value(&entity_raw).ok_or_else(|| {
            DatabaseError::Serialization(format!("invalid entity type '{}'", entity_raw))
        })?,
        entity_id: get_opt_text(row, 3),
        action: get_text(row, 4),
        description: get_text(row, 5),
        created_at: parse_ts(&get_text(row, 6))?,
    })
}

fn row_to_contact(row: &libsql::Row) -> Result<ContactSubmissionRecord, DatabaseError> {
    Ok(ContactSubmissionRecord {
        id: parse_uuid(&get_text(row, 0), "contact_submission.id")?,
        name: get_text(row, 1),
        email: get_text(row, 2),
        subject: get_opt_text(row, 3),
        message: get_text(row, 4),
        created_at: parse_ts(&get_text(row, 5))?,
    })
}

fn row_to_feedback(row: &libsql::Row) -> Result<FeedbackSubmissionRecord, DatabaseError> {
    Ok(FeedbackSubmissionRecord {
        id: parse_uuid(&get_text(row, 0), "feedback_submission.id")?,
        user_id: get_text(row, 1),
        rating: get_opt_i64(row, 2).and_then(|value| u8::try_from(value).ok()),
        message: get_text(row, 3),
        created_at: parse_ts(&get_text(row, 4))?,
    })
}

fn validate_rating(rating: Option<u8>) -> Result<(), DatabaseError> {
    match rating {
        Some(value) if !(1..=5).contains(&value) => Err(DatabaseError::Validation(format!(
            "rating must be between 1 and 5, got {}",
            value
        ))),
        _ => Ok(()),
    }
}

#[async_trait::async_trait]
impl ActivityStore for LibSqlBackend {
    async fn record_activity(
        &self,
        user_id: &str,
        input: &CreateActivityParams,
    ) -> Result<ActivityRecord, DatabaseError> {
        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO activities (id, user_id, entity_type, entity_id, action, description) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                user_id,
                input.entity_type.as_str(),
                opt_text(input.entity_id.as_deref()),
                input.action.as_str(),
                input.description.as_str(),
            ],
        )
        .await?;

        let row = conn
            .query(
                "SELECT id, user_id, entity_type, entity_id, action, description, created_at \
                 FROM activities WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load recorded activity".to_string()))?;
        row_to_activity(&row)
    }

    async fn list_activities(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ActivityRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, entity_type, entity_id, action, description, created_at \
                 FROM activities WHERE user_id = ?1 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
                params![user_id, limit.max(0)],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_activity(&row)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl SubmissionStore for LibSqlBackend {
    async fn create_contact_submission(
        &self,
        input: &CreateContactSubmissionParams,
    ) -> Result<ContactSubmissionRecord, DatabaseError> {
        let name = input.name.trim();
        let email = input.email.trim();
        let message = input.message.trim();
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(DatabaseError::Validation(
                "name, email and message are required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(DatabaseError::Validation(format!(
                "invalid email address '{}'",
                email
            )));
        }

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO contact_submissions (id, name, email, subject, message) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                name,
                email,
                opt_text(input.subject.as_deref()),
                message,
            ],
        )
        .await?;

        let row = conn
            .query(
                "SELECT id, name, email, subject, message, created_at \
                 FROM contact_submissions WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load contact submission".to_string()))?;
        row_to_contact(&row)
    }

    async fn list_contact_submissions(
        &self,
        limit: i64,
    ) -> Result<Vec<ContactSubmissionRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, name, email, subject, message, created_at \
                 FROM contact_submissions ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                params![limit.max(0)],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_contact(&row)?);
        }
        Ok(out)
    }

    async fn create_feedback_submission(
        &self,
        user_id: &str,
        input: &CreateFeedbackParams,
    ) -> Result<FeedbackSubmissionRecord, DatabaseError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(DatabaseError::Validation(
                "feedback message cannot be empty".to_string(),
            ));
        }
        validate_rating(input.rating)?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO feedback_submissions (id, user_id, rating, message) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                user_id,
                opt_i64(input.rating.map(i64::from)),
                message,
            ],
        )
        .await?;

        let row = conn
            .query(
                "SELECT id, user_id, rating, message, created_at \
                 FROM feedback_submissions WHERE id = ?1 LIMIT 1",
                params![id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load feedback".to_string()))?;
        row_to_feedback(&row)
    }

    async fn list_feedback_submissions(
        &self,
        limit: i64,
    ) -> Result<Vec<FeedbackSubmissionRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, rating, message, created_at \
                 FROM feedback_submissions ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                params![limit.max(0)],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_feedback(&row)?);
        }
        Ok(out)
    }
}
