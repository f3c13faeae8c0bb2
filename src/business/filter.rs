//! In-memory search and status filtering for list screens.
//!
//! Rows are fetched whole for the owner and narrowed here. A row is kept when
//! one of its search fields contains the search text (case-insensitive, no
//! trimming) and its status matches the status filter.

use serde::{Deserialize, Serialize};

use crate::business::status::StatusOptions;
use crate::db::{
    InvoiceListEntry, InvoiceStatus, ProjectListEntry, ProjectStatus, TeamMemberRecord,
    TeamMemberStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<S> {
    #[default]
    All,
    Only(S),
}

impl<S: StatusOptions> StatusFilter<S> {
    /// `"all"` (or empty) keeps every status; anything else must be a stored
    /// status value.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        S::parse(raw).map(Self::Only)
    }

    pub fn matches(&self, status: S) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

/// A row a list screen can search and filter.
pub trait Filterable {
    type Status: StatusOptions;

    /// Text fields the search box matches against.
    fn search_fields(&self) -> Vec<&str>;

    fn status(&self) -> Self::Status;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter<S> {
    pub search: String,
    pub status: StatusFilter<S>,
}

impl<S> Default for ListFilter<S> {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
        }
    }
}

impl<S: StatusOptions> ListFilter<S> {
    pub fn new(search: impl Into<String>, status: StatusFilter<S>) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    pub fn matches<T>(&self, row: &T) -> bool
    where
        T: Filterable<Status = S>,
    {
        if !self.status.matches(row.status()) {
            return false;
        }
        let needle = self.search.to_lowercase();
        row.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Keep matching rows, preserving fetch order.
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T>
    where
        T: Filterable<Status = S>,
    {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

/// Query-string shape shared by the list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ListQuery {
    /// `None` when `status` names no known value.
    pub fn to_filter<S: StatusOptions>(&self) -> Option<ListFilter<S>> {
        let status = StatusFilter::parse(self.status.as_deref().unwrap_or("all"))?;
        Some(ListFilter::new(self.search.clone().unwrap_or_default(), status))
    }
}

impl Filterable for ProjectListEntry {
    type Status = ProjectStatus;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.project.name.as_str()];
        fields.extend(self.client_name.as_deref());
        fields
    }

    fn status(&self) -> ProjectStatus {
        self.project.status
    }
}

impl Filterable for TeamMemberRecord {
    type Status = TeamMemberStatus;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.email.as_deref());
        fields
    }

    fn status(&self) -> TeamMemberStatus {
        self.status
    }
}

impl Filterable for InvoiceListEntry {
    type Status = InvoiceStatus;

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.invoice.invoice_number.as_str()];
        fields.extend(self.client_name.as_deref());
        fields
    }

    fn status(&self) -> InvoiceStatus {
        self.invoice.status
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::db::ProjectRecord;

    fn project(name: &str, client: Option<&str>, status: ProjectStatus) -> ProjectListEntry {
        ProjectListEntry {
            project: ProjectRecord {
                id: Uuid::new_v4(),
                user_id: "u1".to_string(),
                client_id: None,
                name: name.to_string(),
                description: None,
                status,
                progress: 0,
                budget: None,
                start_date: None,
                due_date: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            client_name: client.map(str::to_string),
        }
    }

    fn member(name: &str, email: Option<&str>, status: TeamMemberStatus) -> TeamMemberRecord {
        TeamMemberRecord {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: None,
            position: None,
            hourly_rate: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fixture() -> Vec<ProjectListEntry> {
        vec![
            project("Website Redesign", Some("Acme Corp"), ProjectStatus::InProgress),
            project("Mobile App", Some("Globex"), ProjectStatus::Todo),
            project("Brand Guide", None, ProjectStatus::Completed),
            project("ACME Portal", Some("Initech"), ProjectStatus::Completed),
        ]
    }

    fn names(rows: &[ProjectListEntry]) -> Vec<&str> {
        rows.iter().map(|row| row.project.name.as_str()).collect()
    }

    #[test]
    fn search_matches_name_or_client_case_insensitively() {
        let filter = ListFilter::new("acme", StatusFilter::All);
        let kept = filter.apply(fixture());
        assert_eq!(names(&kept), vec!["Website Redesign", "ACME Portal"]);
    }

    #[test]
    fn search_and_status_combine_with_and() {
        let filter = ListFilter::new("acme", StatusFilter::Only(ProjectStatus::Completed));
        let kept = filter.apply(fixture());
        assert_eq!(names(&kept), vec!["ACME Portal"]);
    }

    #[test]
    fn search_is_not_trimmed() {
        let filter: ListFilter<ProjectStatus> = ListFilter::new(" app", StatusFilter::All);
        assert_eq!(names(&filter.apply(fixture())), vec!["Mobile App"]);
        let filter: ListFilter<ProjectStatus> = ListFilter::new("app ", StatusFilter::All);
        assert!(filter.apply(fixture()).is_empty());
    }

    #[test]
    fn filtered_set_equals_predicate_subset() {
        let searches = ["", "a", "ACME", "glob", "guide", "zzz", "e p"];
        let statuses = [
            StatusFilter::All,
            StatusFilter::Only(ProjectStatus::Todo),
            StatusFilter::Only(ProjectStatus::InProgress),
            StatusFilter::Only(ProjectStatus::Completed),
        ];
        for search in searches {
            for status in statuses {
                let rows = fixture();
                let expected: Vec<String> = rows
                    .iter()
                    .filter(|row| {
                        let needle = search.to_lowercase();
                        let hit = row.project.name.to_lowercase().contains(&needle)
                            || row
                                .client_name
                                .as_deref()
                                .is_some_and(|c| c.to_lowercase().contains(&needle));
                        let status_ok = match status {
                            StatusFilter::All => true,
                            StatusFilter::Only(s) => row.project.status == s,
                        };
                        hit && status_ok
                    })
                    .map(|row| row.project.name.clone())
                    .collect();
                let actual: Vec<String> = ListFilter::new(search, status)
                    .apply(rows)
                    .into_iter()
                    .map(|row| row.project.name)
                    .collect();
                assert_eq!(actual, expected, "search={search:?} status={status:?}");
            }
        }
    }

    #[test]
    fn team_search_covers_email() {
        let rows = vec![
            member("Ana Souza", Some("ana@studio.test"), TeamMemberStatus::Active),
            member("Bo Chen", Some("bo@STUDIO.test"), TeamMemberStatus::OnLeave),
            member("Cy Ode", None, TeamMemberStatus::Terminated),
        ];
        let filter = ListFilter::new("studio", StatusFilter::Only(TeamMemberStatus::OnLeave));
        let kept = filter.apply(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Bo Chen");
    }

    #[test]
    fn status_filter_parses_all_and_known_values() {
        assert_eq!(
            StatusFilter::<InvoiceStatus>::parse("all"),
            Some(StatusFilter::All)
        );
        assert_eq!(
            StatusFilter::<InvoiceStatus>::parse("overdue"),
            Some(StatusFilter::Only(InvoiceStatus::Overdue))
        );
        assert_eq!(StatusFilter::<InvoiceStatus>::parse("late"), None);
    }

    #[test]
    fn list_query_rejects_unknown_status() {
        let query = ListQuery {
            search: Some("x".to_string()),
            status: Some("archived".to_string()),
        };
        assert!(query.to_filter::<ProjectStatus>().is_none());
        let query = ListQuery::default();
        assert_eq!(
            query.to_filter::<ProjectStatus>(),
            Some(ListFilter::default())
        );
    }
}
