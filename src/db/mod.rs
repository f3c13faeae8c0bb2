//! Database abstraction layer.
//!
//! Provides a backend-agnostic `Database` trait that unifies all persistence
//! operations. Every owner-scoped operation takes the owning `user_id` and
//! never touches rows belonging to another user.
//!
//! The libSQL backend (feature `libsql`, on by default) runs against a local
//! file or against a remote replica of a hosted database.

#[cfg(feature = "libsql")]
pub mod libsql;

#[cfg(feature = "libsql")]
pub mod libsql_migrations;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Create a database backend from configuration, run migrations, and return it.
pub async fn connect_from_config(
    config: &crate::config::DatabaseConfig,
) -> Result<Arc<dyn Database>, DatabaseError> {
    match config.backend {
        #[cfg(feature = "libsql")]
        crate::config::DatabaseBackend::LibSql => {
            use secrecy::ExposeSecret as _;

            let default_path = crate::config::default_libsql_path();
            let db_path = config.libsql_path.as_deref().unwrap_or(&default_path);

            let backend = if let Some(ref url) = config.libsql_url {
                let token = config.libsql_auth_token.as_ref().ok_or_else(|| {
                    DatabaseError::Pool(
                        "LIBSQL_AUTH_TOKEN required when LIBSQL_URL is set".to_string(),
                    )
                })?;
                libsql::LibSqlBackend::new_remote_replica(db_path, url, token.expose_secret())
                    .await?
            } else {
                libsql::LibSqlBackend::new_local(db_path).await?
            };
            backend.run_migrations().await?;
            Ok(Arc::new(backend))
        }
        #[cfg(not(feature = "libsql"))]
        _ => Err(DatabaseError::Pool(
            "No database backend available. Enable the 'libsql' feature.".to_string(),
        )),
    }
}

// ==================== Enumerations ====================

/// Account role of a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Todo,
    InProgress,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Employment state of a team member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamMemberStatus {
    Active,
    OnLeave,
    Terminated,
}

impl TeamMemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnLeave => "on_leave",
            Self::Terminated => "terminated",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "on_leave" => Some(Self::OnLeave),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }
}

/// Invoice billing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

/// Kind of row an activity entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Client,
    TeamMember,
    Invoice,
    Contract,
    Testimonial,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Client => "client",
            Self::TeamMember => "team_member",
            Self::Invoice => "invoice",
            Self::Contract => "contract",
            Self::Testimonial => "testimonial",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "project" => Some(Self::Project),
            "client" => Some(Self::Client),
            "team_member" => Some(Self::TeamMember),
            "invoice" => Some(Self::Invoice),
            "contract" => Some(Self::Contract),
            "testimonial" => Some(Self::Testimonial),
            _ => None,
        }
    }
}

// ==================== Records and params ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileRecord {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertUserProfileParams {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateClientParams {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateClientParams {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub company: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub user_id: String,
    pub client_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Completion percentage, 0–100.
    pub progress: u8,
    pub budget: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project joined with its client's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListEntry {
    #[serde(flatten)]
    pub project: ProjectRecord,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectParams {
    pub name: String,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub progress: u8,
    pub budget: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl CreateProjectParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client_id: None,
            description: None,
            status: ProjectStatus::Todo,
            progress: 0,
            budget: None,
            start_date: None,
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProjectParams {
    pub name: Option<String>,
    pub client_id: Option<Option<Uuid>>,
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub progress: Option<u8>,
    pub budget: Option<Option<Decimal>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Job title / position.
    pub position: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub status: TeamMemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTeamMemberParams {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub status: TeamMemberStatus,
}

impl CreateTeamMemberParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            position: None,
            hourly_rate: None,
            status: TeamMemberStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTeamMemberParams {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub position: Option<Option<String>>,
    pub hourly_rate: Option<Option<Decimal>>,
    pub status: Option<TeamMemberStatus>,
}

/// Assignment of a team member to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMemberRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub team_member_id: Uuid,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFileRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Team member who uploaded the file, if still on the team.
    pub uploaded_by: Option<Uuid>,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProjectFileParams {
    pub uploaded_by: Option<Uuid>,
    pub file_name: String,
    pub storage_path: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: Uuid,
    pub user_id: String,
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    /// Percentage, 0–100.
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An invoice joined with its client's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceListEntry {
    #[serde(flatten)]
    pub invoice: InvoiceRecord,
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItemRecord {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct CreateInvoiceParams {
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateInvoiceItemParams {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id: Uuid,
    pub user_id: String,
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateContractParams {
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialRecord {
    pub id: Uuid,
    pub user_id: String,
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub author_name: String,
    pub author_title: Option<String>,
    pub content: String,
    /// 1–5 stars.
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTestimonialParams {
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub author_name: String,
    pub author_title: Option<String>,
    pub content: String,
    pub rating: Option<u8>,
}

/// Append-only timeline entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub user_id: String,
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub action: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivityParams {
    pub entity_type: EntityType,
    pub entity_id: Option<String>,
    pub action: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmissionRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateContactSubmissionParams {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSubmissionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub rating: Option<u8>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateFeedbackParams {
    pub rating: Option<u8>,
    pub message: String,
}

// ==================== Sub-traits ====================
//
// Each sub-trait groups related persistence methods. The `Database` supertrait
// combines them all; leaf consumers can depend on a specific sub-trait instead.

#[async_trait]
pub trait UserProfileStore: Send + Sync {
    async fn upsert_user_profile(
        &self,
        user_id: &str,
        input: &UpsertUserProfileParams,
    ) -> Result<UserProfileRecord, DatabaseError>;
    async fn get_user_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProfileRecord>, DatabaseError>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_client(
        &self,
        user_id: &str,
        input: &CreateClientParams,
    ) -> Result<ClientRecord, DatabaseError>;
    async fn list_clients(&self, user_id: &str) -> Result<Vec<ClientRecord>, DatabaseError>;
    async fn get_client(
        &self,
        user_id: &str,
        client_id: Uuid,
    ) -> Result<Option<ClientRecord>, DatabaseError>;
    async fn update_client(
        &self,
        user_id: &str,
        client_id: Uuid,
        input: &UpdateClientParams,
    ) -> Result<Option<ClientRecord>, DatabaseError>;
    async fn delete_client(&self, user_id: &str, client_id: Uuid) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(
        &self,
        user_id: &str,
        input: &CreateProjectParams,
    ) -> Result<ProjectRecord, DatabaseError>;
    async fn list_projects(&self, user_id: &str) -> Result<Vec<ProjectListEntry>, DatabaseError>;
    async fn get_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Option<ProjectRecord>, DatabaseError>;
    async fn update_project(
        &self,
        user_id: &str,
        project_id: Uuid,
        input: &UpdateProjectParams,
    ) -> Result<Option<ProjectRecord>, DatabaseError>;
    async fn set_project_status(
        &self,
        user_id: &str,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Option<ProjectRecord>, DatabaseError>;
    async fn delete_project(&self, user_id: &str, project_id: Uuid)
    -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ProjectMemberStore: Send + Sync {
    async fn add_project_member(
        &self,
        user_id: &str,
        project_id: Uuid,
        team_member_id: Uuid,
        role: Option<&str>,
    ) -> Result<ProjectMemberRecord, DatabaseError>;
    async fn list_project_members(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<ProjectMemberRecord>, DatabaseError>;
    /// Remove every assignment to the project. Returns rows removed.
    async fn delete_members_for_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError>;
    /// Remove every project assignment of the team member. Returns rows removed.
    async fn delete_assignments_for_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait ProjectFileStore: Send + Sync {
    async fn create_project_file(
        &self,
        user_id: &str,
        project_id: Uuid,
        input: &CreateProjectFileParams,
    ) -> Result<ProjectFileRecord, DatabaseError>;
    async fn list_project_files(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<Vec<ProjectFileRecord>, DatabaseError>;
    async fn delete_files_for_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError>;
    /// Null `uploaded_by` on files uploaded by the team member.
    async fn clear_uploader_for_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait TeamMemberStore: Send + Sync {
    async fn create_team_member(
        &self,
        user_id: &str,
        input: &CreateTeamMemberParams,
    ) -> Result<TeamMemberRecord, DatabaseError>;
    async fn list_team_members(&self, user_id: &str)
    -> Result<Vec<TeamMemberRecord>, DatabaseError>;
    async fn get_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<Option<TeamMemberRecord>, DatabaseError>;
    async fn update_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
        input: &UpdateTeamMemberParams,
    ) -> Result<Option<TeamMemberRecord>, DatabaseError>;
    async fn set_team_member_status(
        &self,
        user_id: &str,
        team_member_id: Uuid,
        status: TeamMemberStatus,
    ) -> Result<Option<TeamMemberRecord>, DatabaseError>;
    async fn delete_team_member(
        &self,
        user_id: &str,
        team_member_id: Uuid,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn create_invoice(
        &self,
        user_id: &str,
        invoice: &CreateInvoiceParams,
        items: &[CreateInvoiceItemParams],
    ) -> Result<(InvoiceRecord, Vec<InvoiceItemRecord>), DatabaseError>;
    async fn list_invoices(&self, user_id: &str) -> Result<Vec<InvoiceListEntry>, DatabaseError>;
    async fn get_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceRecord>, DatabaseError>;
    async fn list_invoice_items(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceItemRecord>, DatabaseError>;
    async fn set_invoice_status(
        &self,
        user_id: &str,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Option<InvoiceRecord>, DatabaseError>;
    async fn delete_invoice(&self, user_id: &str, invoice_id: Uuid)
    -> Result<bool, DatabaseError>;
    /// Null `project_id` on the owner's invoices for the project.
    async fn detach_invoices_from_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn create_contract(
        &self,
        user_id: &str,
        input: &CreateContractParams,
    ) -> Result<ContractRecord, DatabaseError>;
    async fn list_contracts(&self, user_id: &str) -> Result<Vec<ContractRecord>, DatabaseError>;
    async fn get_contract(
        &self,
        user_id: &str,
        contract_id: Uuid,
    ) -> Result<Option<ContractRecord>, DatabaseError>;
    async fn delete_contract(
        &self,
        user_id: &str,
        contract_id: Uuid,
    ) -> Result<bool, DatabaseError>;
    async fn detach_contracts_from_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait TestimonialStore: Send + Sync {
    async fn create_testimonial(
        &self,
        user_id: &str,
        input: &CreateTestimonialParams,
    ) -> Result<TestimonialRecord, DatabaseError>;
    async fn list_testimonials(
        &self,
        user_id: &str,
    ) -> Result<Vec<TestimonialRecord>, DatabaseError>;
    async fn delete_testimonial(
        &self,
        user_id: &str,
        testimonial_id: Uuid,
    ) -> Result<bool, DatabaseError>;
    async fn detach_testimonials_from_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn record_activity(
        &self,
        user_id: &str,
        input: &CreateActivityParams,
    ) -> Result<ActivityRecord, DatabaseError>;
    /// Newest first.
    async fn list_activities(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<ActivityRecord>, DatabaseError>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn create_contact_submission(
        &self,
        input: &CreateContactSubmissionParams,
    ) -> Result<ContactSubmissionRecord, DatabaseError>;
    async fn list_contact_submissions(
        &self,
        limit: i64,
    ) -> Result<Vec<ContactSubmissionRecord>, DatabaseError>;
    async fn create_feedback_submission(
        &self,
        user_id: &str,
        input: &CreateFeedbackParams,
    ) -> Result<FeedbackSubmissionRecord, DatabaseError>;
    async fn list_feedback_submissions(
        &self,
        limit: i64,
    ) -> Result<Vec<FeedbackSubmissionRecord>, DatabaseError>;
}

/// Backend-agnostic database supertrait.
#[async_trait]
pub trait Database:
    UserProfileStore
    + ClientStore
    + ProjectStore
    + ProjectMemberStore
    + ProjectFileStore
    + TeamMemberStore
    + InvoiceStore
    + ContractStore
    + TestimonialStore
    + ActivityStore
    + SubmissionStore
    + Send
    + Sync
{
    /// Run schema migrations for this backend.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::{EntityType, InvoiceStatus, ProjectStatus, TeamMemberStatus, UserRole};

    #[test]
    fn status_strings_match_store_vocabulary() {
        assert_eq!(ProjectStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TeamMemberStatus::OnLeave.as_str(), "on_leave");
        assert_eq!(InvoiceStatus::Overdue.as_str(), "overdue");
        assert_eq!(EntityType::TeamMember.as_str(), "team_member");
        assert_eq!(UserRole::Admin.as_str(), "admin");
    }

    #[test]
    fn unknown_db_values_are_rejected() {
        assert_eq!(ProjectStatus::from_db_value("done"), None);
        assert_eq!(TeamMemberStatus::from_db_value("Active"), None);
        assert_eq!(InvoiceStatus::from_db_value(""), None);
        assert_eq!(EntityType::from_db_value("user"), None);
    }

    #[test]
    fn serde_uses_db_vocabulary() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
        let parsed: TeamMemberStatus = serde_json::from_str("\"on_leave\"").expect("parse");
        assert_eq!(parsed, TeamMemberStatus::OnLeave);
    }

    #[cfg(feature = "libsql")]
    #[tokio::test]
    async fn connect_from_config_migrates_local_file() {
        let tmpdir = tempfile::tempdir().expect("tempdir");
        let config = crate::config::DatabaseConfig::local(tmpdir.path().join("nested/app.db"));

        let db = super::connect_from_config(&config).await.expect("connect");
        assert!(db.list_projects("u1").await.expect("list").is_empty());

        // Reopening runs the migrations again without error.
        super::connect_from_config(&config).await.expect("reconnect");
    }
}
