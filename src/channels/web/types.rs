//! Request and response DTOs for the web gateway API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::business::StatusOption;
use crate::context::SidebarState;
use crate::db::{
    ActivityRecord, ClientRecord, ContactSubmissionRecord, ContractRecord,
    FeedbackSubmissionRecord, InvoiceItemRecord, InvoiceListEntry, InvoiceRecord,
    ProjectFileRecord, ProjectListEntry, ProjectMemberRecord, ProjectRecord, TeamMemberRecord,
    TestimonialRecord, UserRole,
};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- Session / UI ---

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct UiStateResponse {
    pub theme: &'static str,
    pub sidebar: SidebarState,
    pub currency: &'static str,
    pub currency_symbol: &'static str,
}

/// `theme` omitted toggles between light and dark.
#[derive(Debug, Default, Deserialize)]
pub struct ThemeRequest {
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SidebarRequest {
    #[serde(default)]
    pub open: Option<bool>,
    #[serde(default)]
    pub collapsed: Option<bool>,
    #[serde(default)]
    pub toggle_collapsed: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusOptionsResponse {
    pub kind: String,
    pub options: Vec<StatusOption>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

/// Query for destructive routes that need explicit confirmation.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
    /// Name shown in the timeline entry; the stored name is used when absent.
    #[serde(default)]
    pub name: Option<String>,
}

impl ConfirmQuery {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// --- Clients ---

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientRecord>,
}

// --- Projects ---

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub progress: Option<u8>,
    pub budget: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub client_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "double_option")]
    pub budget: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectListEntry>,
    /// Rows before search and status filtering.
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub project: ProjectRecord,
    pub members: Vec<ProjectMemberRecord>,
    pub files: Vec<ProjectFileRecord>,
    pub budget_display: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddProjectMemberRequest {
    pub team_member_id: Uuid,
    pub role: Option<String>,
}

/// Metadata for a file already placed in storage by the client.
#[derive(Debug, Deserialize)]
pub struct ProjectFileRequest {
    pub file_name: String,
    pub storage_path: String,
    pub uploaded_by: Option<Uuid>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: i64,
}

// --- Team ---

#[derive(Debug, Deserialize)]
pub struct CreateTeamMemberRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTeamMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub hourly_rate: Option<Option<Decimal>>,
}

#[derive(Debug, Serialize)]
pub struct TeamListResponse {
    pub members: Vec<TeamMemberRecord>,
    pub total: usize,
}

// --- Invoices ---

#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub entry: InvoiceListEntry,
    pub total_display: String,
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    pub invoice: InvoiceRecord,
    pub items: Vec<InvoiceItemRecord>,
    pub total_display: String,
}

// --- Contracts / testimonials ---

#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub value: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ContractListResponse {
    pub contracts: Vec<ContractRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTestimonialRequest {
    pub author_name: String,
    pub content: String,
    pub author_title: Option<String>,
    pub client_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub rating: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct TestimonialListResponse {
    pub testimonials: Vec<TestimonialRecord>,
}

// --- Activity / submissions ---

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    #[serde(flatten)]
    pub record: ActivityRecord,
    /// Relative label such as "5 minutes ago".
    pub when: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub entries: Vec<ActivityEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: Option<u8>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionAck {
    pub id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub submissions: Vec<ContactSubmissionRecord>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub submissions: Vec<FeedbackSubmissionRecord>,
}

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub channel: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_client_distinguishes_null_from_absent() {
        let req: UpdateClientRequest =
            serde_json::from_str(r#"{"email":null,"company":"Initech"}"#).unwrap();
        assert_eq!(req.email, Some(None));
        assert_eq!(req.company, Some(Some("Initech".to_string())));
        assert!(req.phone.is_none());
        assert!(req.name.is_none());
    }

    #[test]
    fn update_project_parses_decimal_and_dates() {
        let req: UpdateProjectRequest =
            serde_json::from_str(r#"{"budget":"1200.50","due_date":"2026-03-01","progress":40}"#)
                .unwrap();
        assert_eq!(req.budget, Some(Some(Decimal::new(120050, 2))));
        assert_eq!(req.due_date, Some(NaiveDate::from_ymd_opt(2026, 3, 1)));
        assert_eq!(req.progress, Some(40));
    }

    #[test]
    fn confirm_defaults_to_false() {
        let query: ConfirmQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.confirm);
        assert_eq!(query.display_name(), "");

        let query: ConfirmQuery =
            serde_json::from_str(r#"{"confirm":true,"name":"Website Redesign"}"#).unwrap();
        assert!(query.confirm);
        assert_eq!(query.display_name(), "Website Redesign");
    }

    #[test]
    fn theme_request_allows_empty_body() {
        let req: ThemeRequest = serde_json::from_str("{}").unwrap();
        assert!(req.theme.is_none());
    }
}
