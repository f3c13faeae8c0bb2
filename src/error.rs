//! Error types shared across the crate.

use thiserror::Error;

/// Configuration resolution errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence errors raised by any `Database` backend.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Pool(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Caller-supplied input was rejected before reaching the database.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },
}

#[cfg(feature = "libsql")]
impl From<libsql::Error> for DatabaseError {
    fn from(err: libsql::Error) -> Self {
        let message = err.to_string();
        if message.contains("constraint failed") || message.contains("FOREIGN KEY") {
            DatabaseError::Constraint(message)
        } else {
            DatabaseError::Query(message)
        }
    }
}

/// A step of a cascading delete sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    LookupProject,
    RemoveProjectMembers,
    RemoveProjectFiles,
    DetachInvoices,
    DetachContracts,
    DetachTestimonials,
    DeleteProject,
    LookupTeamMember,
    RemoveTeamAssignments,
    ClearFileUploader,
    DeleteTeamMember,
    RefreshList,
}

impl CascadeStep {
    /// Short description shown to the user when the step fails.
    pub fn describe(self) -> &'static str {
        match self {
            Self::LookupProject => "look up the project",
            Self::RemoveProjectMembers => "remove project members",
            Self::RemoveProjectFiles => "remove project files",
            Self::DetachInvoices => "detach invoices from the project",
            Self::DetachContracts => "detach contracts from the project",
            Self::DetachTestimonials => "detach testimonials from the project",
            Self::DeleteProject => "delete the project",
            Self::LookupTeamMember => "look up the team member",
            Self::RemoveTeamAssignments => "remove the member's project assignments",
            Self::ClearFileUploader => "clear the member from uploaded files",
            Self::DeleteTeamMember => "delete the team member",
            Self::RefreshList => "refresh the list",
        }
    }
}

/// A cascading delete aborted part-way. Steps before `step` stay applied.
#[derive(Debug, Error)]
#[error("cascade aborted at '{}': {source}", .step.describe())]
pub struct CascadeError {
    pub step: CascadeStep,
    #[source]
    pub source: DatabaseError,
}

impl CascadeError {
    pub fn new(step: CascadeStep, source: DatabaseError) -> Self {
        Self { step, source }
    }

    /// Message for the blocking alert shown to the user.
    pub fn alert_message(&self, subject: &str) -> String {
        format!(
            "Failed to delete {}: could not {}. Some related records may already have been updated.",
            subject,
            self.step.describe()
        )
    }
}

/// Channel startup/runtime errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },
}
