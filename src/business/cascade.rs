//! Cascading deletes for projects and team members.
//!
//! The store does not cascade these relations, so dependents are cleared in a
//! fixed order before the parent row is removed. Each step is its own
//! statement; a failure aborts the sequence and earlier steps stay applied.
//! The timeline entry written afterwards is best-effort.

use serde::Serialize;
use uuid::Uuid;

use crate::business::activity::log_activity;
use crate::db::{Database, EntityType, ProjectListEntry, TeamMemberRecord};
use crate::error::{CascadeError, CascadeStep};

/// Rows touched by each step of a completed cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub members_removed: u64,
    pub files_removed: u64,
    pub invoices_detached: u64,
    pub contracts_detached: u64,
    pub testimonials_detached: u64,
    pub files_uploader_cleared: u64,
    pub activity_logged: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome<T> {
    /// The parent row is gone. `remaining` is the owner's refreshed list.
    Deleted {
        report: CascadeReport,
        remaining: Vec<T>,
    },
    /// Missing or owned by someone else; nothing was changed.
    AlreadyGone,
}

impl<T> DeleteOutcome<T> {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

fn at(step: CascadeStep) -> impl FnOnce(crate::error::DatabaseError) -> CascadeError {
    move |source| {
        tracing::error!(step = ?step, error = %source, "cascade step failed");
        CascadeError::new(step, source)
    }
}

/// Delete a project and detach everything that references it.
///
/// The caller is expected to have confirmed the deletion.
pub async fn delete_project(
    db: &dyn Database,
    user_id: &str,
    project_id: Uuid,
    display_name: &str,
) -> Result<DeleteOutcome<ProjectListEntry>, CascadeError> {
    let Some(project) = db
        .get_project(user_id, project_id)
        .await
        .map_err(at(CascadeStep::LookupProject))?
    else {
        tracing::warn!(%project_id, user_id, "project already gone, nothing deleted");
        return Ok(DeleteOutcome::AlreadyGone);
    };

    let mut report = CascadeReport {
        members_removed: db
            .delete_members_for_project(user_id, project_id)
            .await
            .map_err(at(CascadeStep::RemoveProjectMembers))?,
        ..Default::default()
    };
    report.files_removed = db
        .delete_files_for_project(user_id, project_id)
        .await
        .map_err(at(CascadeStep::RemoveProjectFiles))?;
    report.invoices_detached = db
        .detach_invoices_from_project(user_id, project_id)
        .await
        .map_err(at(CascadeStep::DetachInvoices))?;
    report.contracts_detached = db
        .detach_contracts_from_project(user_id, project_id)
        .await
        .map_err(at(CascadeStep::DetachContracts))?;
    report.testimonials_detached = db
        .detach_testimonials_from_project(user_id, project_id)
        .await
        .map_err(at(CascadeStep::DetachTestimonials))?;

    let deleted = db
        .delete_project(user_id, project_id)
        .await
        .map_err(at(CascadeStep::DeleteProject))?;
    if !deleted {
        tracing::warn!(%project_id, user_id, "project vanished before its row was deleted");
        return Ok(DeleteOutcome::AlreadyGone);
    }

    let name = if display_name.trim().is_empty() {
        project.name.as_str()
    } else {
        display_name
    };
    report.activity_logged = log_activity(
        db,
        user_id,
        EntityType::Project,
        Some(project_id.to_string()),
        "deleted",
        format!("Project \"{}\" deleted", name),
    )
    .await;

    tracing::info!(
        %project_id,
        user_id,
        members = report.members_removed,
        files = report.files_removed,
        invoices = report.invoices_detached,
        contracts = report.contracts_detached,
        testimonials = report.testimonials_detached,
        "project deleted"
    );

    let remaining = db
        .list_projects(user_id)
        .await
        .map_err(at(CascadeStep::RefreshList))?;
    Ok(DeleteOutcome::Deleted { report, remaining })
}

/// Delete a team member after removing their assignments and uploads credit.
pub async fn delete_team_member(
    db: &dyn Database,
    user_id: &str,
    team_member_id: Uuid,
    display_name: &str,
) -> Result<DeleteOutcome<TeamMemberRecord>, CascadeError> {
    let Some(member) = db
        .get_team_member(user_id, team_member_id)
        .await
        .map_err(at(CascadeStep::LookupTeamMember))?
    else {
        tracing::warn!(%team_member_id, user_id, "team member already gone, nothing deleted");
        return Ok(DeleteOutcome::AlreadyGone);
    };

    let mut report = CascadeReport {
        members_removed: db
            .delete_assignments_for_team_member(user_id, team_member_id)
            .await
            .map_err(at(CascadeStep::RemoveTeamAssignments))?,
        ..Default::default()
    };
    report.files_uploader_cleared = db
        .clear_uploader_for_team_member(user_id, team_member_id)
        .await
        .map_err(at(CascadeStep::ClearFileUploader))?;

    let deleted = db
        .delete_team_member(user_id, team_member_id)
        .await
        .map_err(at(CascadeStep::DeleteTeamMember))?;
    if !deleted {
        tracing::warn!(%team_member_id, user_id, "team member vanished before its row was deleted");
        return Ok(DeleteOutcome::AlreadyGone);
    }

    let name = if display_name.trim().is_empty() {
        member.name.as_str()
    } else {
        display_name
    };
    report.activity_logged = log_activity(
        db,
        user_id,
        EntityType::TeamMember,
        Some(team_member_id.to_string()),
        "deleted",
        format!("Team member \"{}\" removed", name),
    )
    .await;

    tracing::info!(
        %team_member_id,
        user_id,
        assignments = report.members_removed,
        uploads = report.files_uploader_cleared,
        "team member deleted"
    );

    let remaining = db
        .list_team_members(user_id)
        .await
        .map_err(at(CascadeStep::RefreshList))?;
    Ok(DeleteOutcome::Deleted { report, remaining })
}
