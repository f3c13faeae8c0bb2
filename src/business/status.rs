//! Status pickers.
//!
//! Each status enum exposes its fixed option set. Setting a status is a
//! single update followed by a best-effort timeline entry. Any status may
//! follow any other; no transition graph exists.

use serde::Serialize;
use uuid::Uuid;

use crate::business::activity::log_activity;
use crate::business::format::status_color;
use crate::db::{
    Database, EntityType, InvoiceRecord, InvoiceStatus, ProjectRecord, ProjectStatus,
    TeamMemberRecord, TeamMemberStatus,
};
use crate::error::DatabaseError;

/// A closed, enumerated set of status values.
pub trait StatusOptions: Copy + PartialEq + Send + Sync + 'static {
    const ALL: &'static [Self];
    const ENTITY: EntityType;

    /// Stored value.
    fn value(self) -> &'static str;

    /// Display label.
    fn label(self) -> &'static str;

    fn parse(raw: &str) -> Option<Self>;

    fn color(self) -> &'static str {
        status_color(self.value())
    }
}

impl StatusOptions for ProjectStatus {
    const ALL: &'static [Self] = &[Self::Todo, Self::InProgress, Self::Completed];
    const ENTITY: EntityType = EntityType::Project;

    fn value(self) -> &'static str {
        self.as_str()
    }

    fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::from_db_value(raw)
    }
}

impl StatusOptions for TeamMemberStatus {
    const ALL: &'static [Self] = &[Self::Active, Self::OnLeave, Self::Terminated];
    const ENTITY: EntityType = EntityType::TeamMember;

    fn value(self) -> &'static str {
        self.as_str()
    }

    fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::OnLeave => "On Leave",
            Self::Terminated => "Terminated",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::from_db_value(raw)
    }
}

impl StatusOptions for InvoiceStatus {
    const ALL: &'static [Self] = &[Self::Draft, Self::Sent, Self::Paid, Self::Overdue];
    const ENTITY: EntityType = EntityType::Invoice;

    fn value(self) -> &'static str {
        self.as_str()
    }

    fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Sent => "Sent",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::from_db_value(raw)
    }
}

/// One entry of a picker, as rendered by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

pub fn options<S: StatusOptions>() -> Vec<StatusOption> {
    S::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.value(),
            label: status.label(),
            color: status.color(),
        })
        .collect()
}

/// Picker options by entity kind name (`project`, `team_member`, `invoice`).
pub fn options_for(kind: &str) -> Option<Vec<StatusOption>> {
    match kind {
        "project" | "projects" => Some(options::<ProjectStatus>()),
        "team_member" | "team" => Some(options::<TeamMemberStatus>()),
        "invoice" | "invoices" => Some(options::<InvoiceStatus>()),
        _ => None,
    }
}

pub async fn set_project_status(
    db: &dyn Database,
    user_id: &str,
    project_id: Uuid,
    status: ProjectStatus,
) -> Result<Option<ProjectRecord>, DatabaseError> {
    let Some(project) = db.set_project_status(user_id, project_id, status).await? else {
        return Ok(None);
    };
    log_activity(
        db,
        user_id,
        ProjectStatus::ENTITY,
        Some(project.id.to_string()),
        "status_changed",
        format!("Project \"{}\" moved to {}", project.name, status.label()),
    )
    .await;
    Ok(Some(project))
}

pub async fn set_team_member_status(
    db: &dyn Database,
    user_id: &str,
    team_member_id: Uuid,
    status: TeamMemberStatus,
) -> Result<Option<TeamMemberRecord>, DatabaseError> {
    let Some(member) = db
        .set_team_member_status(user_id, team_member_id, status)
        .await?
    else {
        return Ok(None);
    };
    log_activity(
        db,
        user_id,
        TeamMemberStatus::ENTITY,
        Some(member.id.to_string()),
        "status_changed",
        format!("{} is now {}", member.name, status.label()),
    )
    .await;
    Ok(Some(member))
}

pub async fn set_invoice_status(
    db: &dyn Database,
    user_id: &str,
    invoice_id: Uuid,
    status: InvoiceStatus,
) -> Result<Option<InvoiceRecord>, DatabaseError> {
    let Some(invoice) = db.set_invoice_status(user_id, invoice_id, status).await? else {
        return Ok(None);
    };
    log_activity(
        db,
        user_id,
        InvoiceStatus::ENTITY,
        Some(invoice.id.to_string()),
        "status_changed",
        format!(
            "Invoice {} marked as {}",
            invoice.invoice_number,
            status.label()
        ),
    )
    .await;
    Ok(Some(invoice))
}

#[cfg(all(test, feature = "libsql"))]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::db::libsql::test_support::setup_backend;
    use crate::db::{CreateInvoiceParams, CreateProjectParams, CreateTeamMemberParams};

    #[test]
    fn option_sets_match_stored_vocabulary() {
        let values: Vec<&str> = options::<TeamMemberStatus>()
            .into_iter()
            .map(|option| option.value)
            .collect();
        assert_eq!(values, vec!["active", "on_leave", "terminated"]);
        assert_eq!(
            options_for("invoice").map(|opts| opts.len()),
            Some(InvoiceStatus::ALL.len())
        );
        assert!(options_for("contract").is_none());
    }

    #[test]
    fn labels_and_colors_are_defined_for_every_option() {
        for option in options::<ProjectStatus>()
            .into_iter()
            .chain(options::<TeamMemberStatus>())
            .chain(options::<InvoiceStatus>())
        {
            assert!(!option.label.is_empty());
            assert!(option.color.starts_with('#'));
        }
        assert_eq!(ProjectStatus::InProgress.label(), "In Progress");
    }

    #[tokio::test]
    async fn every_project_transition_is_permitted() {
        let fixture = setup_backend().await;
        let db: &dyn Database = &fixture.backend;
        let project = db
            .create_project("u1", &CreateProjectParams::named("Site"))
            .await
            .expect("create");

        for from in ProjectStatus::ALL {
            for to in ProjectStatus::ALL {
                set_project_status(db, "u1", project.id, *from)
                    .await
                    .expect("set from")
                    .expect("exists");
                let updated = set_project_status(db, "u1", project.id, *to)
                    .await
                    .expect("set to")
                    .expect("exists");
                assert_eq!(updated.status, *to, "{from:?} -> {to:?} rejected");
            }
        }
    }

    #[tokio::test]
    async fn every_team_and_invoice_transition_is_permitted() {
        let fixture = setup_backend().await;
        let db: &dyn Database = &fixture.backend;
        let member = db
            .create_team_member("u1", &CreateTeamMemberParams::named("Ada"))
            .await
            .expect("member");
        let (invoice, _) = db
            .create_invoice(
                "u1",
                &CreateInvoiceParams {
                    client_id: None,
                    project_id: None,
                    invoice_number: "INV-1".to_string(),
                    status: InvoiceStatus::Paid,
                    issue_date: None,
                    due_date: None,
                    subtotal: Decimal::ZERO,
                    tax_rate: Decimal::ZERO,
                    tax: Decimal::ZERO,
                    total: Decimal::ZERO,
                    notes: None,
                    terms: None,
                },
                &[],
            )
            .await
            .expect("invoice");

        for to in TeamMemberStatus::ALL.iter().rev() {
            let updated = set_team_member_status(db, "u1", member.id, *to)
                .await
                .expect("set")
                .expect("exists");
            assert_eq!(updated.status, *to);
        }
        // Paid back to draft is allowed.
        for to in [InvoiceStatus::Draft, InvoiceStatus::Overdue, InvoiceStatus::Sent] {
            let updated = set_invoice_status(db, "u1", invoice.id, to)
                .await
                .expect("set")
                .expect("exists");
            assert_eq!(updated.status, to);
        }
    }

    #[tokio::test]
    async fn status_change_appends_activity() {
        let fixture = setup_backend().await;
        let db: &dyn Database = &fixture.backend;
        let project = db
            .create_project("u1", &CreateProjectParams::named("Portal"))
            .await
            .expect("create");

        set_project_status(db, "u1", project.id, ProjectStatus::InProgress)
            .await
            .expect("set")
            .expect("exists");

        let entries = db.list_activities("u1", 5).await.expect("activities");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "status_changed");
        assert_eq!(entries[0].entity_id, Some(project.id.to_string()));
        assert_eq!(entries[0].description, "Project \"Portal\" moved to In Progress");
    }

    #[tokio::test]
    async fn status_change_survives_activity_failure() {
        let fixture = setup_backend().await;
        let db: &dyn Database = &fixture.backend;
        let project = db
            .create_project("u1", &CreateProjectParams::named("Portal"))
            .await
            .expect("create");
        let conn = fixture.backend.connect().await.expect("connect");
        conn.execute("DROP TABLE activities", ())
            .await
            .expect("drop activities");

        let updated = set_project_status(db, "u1", project.id, ProjectStatus::Completed)
            .await
            .expect("update still succeeds")
            .expect("exists");
        assert_eq!(updated.status, ProjectStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_ids_return_none_without_activity() {
        let fixture = setup_backend().await;
        let db: &dyn Database = &fixture.backend;

        let result = set_invoice_status(db, "u1", Uuid::new_v4(), InvoiceStatus::Paid)
            .await
            .expect("query");
        assert!(result.is_none());
        assert!(db.list_activities("u1", 5).await.expect("list").is_empty());
    }
}
