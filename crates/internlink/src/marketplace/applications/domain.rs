use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::accounts::UserId;
use crate::marketplace::documents::domain::DocumentId;
use crate::marketplace::postings::PostingId;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Review ladder for an application. `Accepted` and `Rejected` are terminal;
/// everything else moves only along the edges in [`ApplicationStatus::can_advance_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Shortlisted,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }

    /// Legal single-step moves. Rejection is reachable from any live status;
    /// acceptance only from the shortlist.
    pub const fn can_advance_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Pending, ApplicationStatus::Reviewing)
                | (ApplicationStatus::Pending, ApplicationStatus::Rejected)
                | (ApplicationStatus::Reviewing, ApplicationStatus::Shortlisted)
                | (ApplicationStatus::Reviewing, ApplicationStatus::Rejected)
                | (ApplicationStatus::Shortlisted, ApplicationStatus::Accepted)
                | (ApplicationStatus::Shortlisted, ApplicationStatus::Rejected)
        )
    }

    pub const fn ordered() -> [ApplicationStatus; 5] {
        [
            ApplicationStatus::Pending,
            ApplicationStatus::Reviewing,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
        ]
    }
}

/// One entry in an application's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Stored application record. `decided_on` tracks the date of the most
/// recent status change; it stays empty while the application sits in
/// `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub posting: PostingId,
    pub student: UserId,
    pub student_name: String,
    pub cover_note: Option<String>,
    pub resume: Option<DocumentId>,
    pub status: ApplicationStatus,
    pub decided_on: Option<NaiveDate>,
    pub history: Vec<StatusChange>,
    pub submitted_at: DateTime<Utc>,
}

impl Application {
    pub fn view(&self, posting_title: &str) -> ApplicationView {
        ApplicationView {
            id: self.id.clone(),
            posting: self.posting.clone(),
            posting_title: posting_title.to_string(),
            student: self.student.clone(),
            student_name: self.student_name.clone(),
            cover_note: self.cover_note.clone(),
            resume: self.resume.clone(),
            status: self.status.label(),
            decided_on: self.decided_on,
            history: self
                .history
                .iter()
                .map(|change| StatusChangeView {
                    status: change.status.label(),
                    changed_at: change.changed_at,
                    note: change.note.clone(),
                })
                .collect(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Payload accepted when a student applies to a posting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub cover_note: Option<String>,
    #[serde(default)]
    pub resume: Option<DocumentId>,
}

/// Payload accepted when a company moves an application along the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceRequest {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Sanitized representation of an application for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub posting: PostingId,
    pub posting_title: String,
    pub student: UserId,
    pub student_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<DocumentId>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_on: Option<NaiveDate>,
    pub history: Vec<StatusChangeView>,
    pub submitted_at: DateTime<Utc>,
}

/// History entry as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeView {
    pub status: &'static str,
    pub changed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
