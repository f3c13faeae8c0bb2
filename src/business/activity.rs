//! Best-effort activity timeline entries.

use crate::db::{ActivityStore, CreateActivityParams, EntityType};

/// Append a timeline entry after a mutation has already succeeded.
///
/// Returns whether the row was written. Failure is ignored: the primary
/// mutation stands and no error reaches the caller.
pub async fn log_activity<D>(
    db: &D,
    user_id: &str,
    entity_type: EntityType,
    entity_id: Option<String>,
    action: &str,
    description: String,
) -> bool
where
    D: ActivityStore + ?Sized,
{
    let params = CreateActivityParams {
        entity_type,
        entity_id,
        action: action.to_string(),
        description,
    };
    match db.record_activity(user_id, &params).await {
        Ok(_) => true,
        Err(e) => {
            // Failure is ignored.
            tracing::warn!(
                user_id,
                entity_type = entity_type.as_str(),
                action,
                error = %e,
                "activity log write failed"
            );
            false
        }
    }
}

#[cfg(all(test, feature = "libsql"))]
mod tests {
    use super::log_activity;
    use crate::db::libsql::test_support::setup_backend;
    use crate::db::{ActivityStore, EntityType};

    #[tokio::test]
    async fn writes_entry_when_store_is_healthy() {
        let fixture = setup_backend().await;
        let written = log_activity(
            &fixture.backend,
            "u1",
            EntityType::Client,
            Some("c-1".to_string()),
            "created",
            "Client \"Acme\" created".to_string(),
        )
        .await;
        assert!(written);
        let entries = fixture.backend.list_activities("u1", 10).await.expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Client \"Acme\" created");
    }

    #[tokio::test]
    async fn store_failure_is_reported_as_false_not_error() {
        let fixture = setup_backend().await;
        let conn = fixture.backend.connect().await.expect("connect");
        conn.execute("DROP TABLE activities", ())
            .await
            .expect("drop activities");

        let written = log_activity(
            &fixture.backend,
            "u1",
            EntityType::Invoice,
            None,
            "created",
            "Invoice INV-1 created".to_string(),
        )
        .await;
        assert!(!written);
    }
}
