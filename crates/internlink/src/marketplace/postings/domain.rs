use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::marketplace::accounts::UserId;

/// Identifier wrapper for internship postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingId(pub String);

/// Broad discipline buckets students filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOfWork {
    SoftwareEngineering,
    DataScience,
    Design,
    Marketing,
    Finance,
    Operations,
    Research,
    Other,
}

impl FieldOfWork {
    pub const fn label(self) -> &'static str {
        match self {
            FieldOfWork::SoftwareEngineering => "software_engineering",
            FieldOfWork::DataScience => "data_science",
            FieldOfWork::Design => "design",
            FieldOfWork::Marketing => "marketing",
            FieldOfWork::Finance => "finance",
            FieldOfWork::Operations => "operations",
            FieldOfWork::Research => "research",
            FieldOfWork::Other => "other",
        }
    }

    pub const fn ordered() -> [FieldOfWork; 8] {
        [
            FieldOfWork::SoftwareEngineering,
            FieldOfWork::DataScience,
            FieldOfWork::Design,
            FieldOfWork::Marketing,
            FieldOfWork::Finance,
            FieldOfWork::Operations,
            FieldOfWork::Research,
            FieldOfWork::Other,
        ]
    }
}

/// Lifecycle of a posting. Closed postings stay visible to their company but
/// leave the public catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Open,
    Closed,
}

impl PostingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PostingStatus::Open => "open",
            PostingStatus::Closed => "closed",
        }
    }
}

/// Stored internship posting. A stipend of zero means the position is unpaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub id: PostingId,
    pub company: UserId,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub field: FieldOfWork,
    pub stipend: u32,
    pub openings: u16,
    pub deadline: NaiveDate,
    pub skills: Vec<String>,
    pub status: PostingStatus,
    pub posted_on: NaiveDate,
}

impl Posting {
    /// Whether a student may still apply on the given day.
    pub fn accepting_on(&self, today: NaiveDate) -> bool {
        matches!(self.status, PostingStatus::Open) && today <= self.deadline
    }

    pub fn view(&self) -> PostingView {
        PostingView {
            id: self.id.clone(),
            company: self.company.clone(),
            company_name: self.company_name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            field: self.field.label(),
            stipend: self.stipend,
            openings: self.openings,
            deadline: self.deadline,
            skills: self.skills.clone(),
            status: self.status.label(),
            posted_on: self.posted_on,
        }
    }
}

/// Payload accepted when a company creates a posting. Also the row shape the
/// CSV importer produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub field: FieldOfWork,
    #[serde(default)]
    pub stipend: u32,
    #[serde(default = "default_openings")]
    pub openings: u16,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_openings() -> u16 {
    1
}

/// Partial posting edit; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub field: Option<FieldOfWork>,
    pub stipend: Option<u32>,
    pub openings: Option<u16>,
    pub deadline: Option<NaiveDate>,
    pub skills: Option<Vec<String>>,
}

/// Catalog search criteria. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PostingFilter {
    pub field: Option<FieldOfWork>,
    pub location: Option<String>,
    pub company: Option<UserId>,
    pub status: Option<PostingStatus>,
    pub min_stipend: Option<u32>,
    pub text: Option<String>,
}

impl PostingFilter {
    /// Predicate shared by storage implementations so they rank and filter
    /// identically.
    pub fn matches(&self, posting: &Posting) -> bool {
        if let Some(field) = self.field {
            if posting.field != field {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !posting
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(company) = &self.company {
            if posting.company != *company {
                return false;
            }
        }
        if let Some(status) = self.status {
            if posting.status != status {
                return false;
            }
        }
        if let Some(min_stipend) = self.min_stipend {
            if posting.stipend < min_stipend {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let in_title = posting.title.to_lowercase().contains(&needle);
            let in_description = posting.description.to_lowercase().contains(&needle);
            let in_skills = posting
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(&needle));
            if !(in_title || in_description || in_skills) {
                return false;
            }
        }
        true
    }
}

/// Sanitized representation of a posting for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct PostingView {
    pub id: PostingId,
    pub company: UserId,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub field: &'static str,
    pub stipend: u32,
    pub openings: u16,
    pub deadline: NaiveDate,
    pub skills: Vec<String>,
    pub status: &'static str,
    pub posted_on: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(status: PostingStatus, deadline: NaiveDate) -> Posting {
        Posting {
            id: PostingId("post-000001".to_string()),
            company: UserId("user-000002".to_string()),
            company_name: "Meridian Robotics".to_string(),
            title: "Backend Intern".to_string(),
            description: "Work on the fleet telemetry ingest service.".to_string(),
            location: "Des Moines, IA".to_string(),
            field: FieldOfWork::SoftwareEngineering,
            stipend: 2400,
            openings: 2,
            deadline,
            skills: vec!["rust".to_string(), "sql".to_string()],
            status,
            posted_on: NaiveDate::from_ymd_opt(2026, 2, 20).expect("valid date"),
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn accepting_on_honors_status_and_deadline() {
        let day = date(2026, 3, 10);

        let open_future = posting(PostingStatus::Open, date(2026, 3, 20));
        assert!(open_future.accepting_on(day));

        let due_today = posting(PostingStatus::Open, day);
        assert!(due_today.accepting_on(day), "deadline day still accepts");

        let open_past = posting(PostingStatus::Open, date(2026, 3, 9));
        assert!(!open_past.accepting_on(day));

        let closed = posting(PostingStatus::Closed, date(2026, 3, 20));
        assert!(!closed.accepting_on(day));
    }

    #[test]
    fn filter_matches_field_text_and_status() {
        let posting = posting(PostingStatus::Open, date(2026, 3, 20));

        let mut filter = PostingFilter {
            field: Some(FieldOfWork::SoftwareEngineering),
            text: Some("telemetry".to_string()),
            status: Some(PostingStatus::Open),
            ..PostingFilter::default()
        };
        assert!(filter.matches(&posting));

        filter.text = Some("RUST".to_string());
        assert!(filter.matches(&posting), "skill match is case-insensitive");

        filter.field = Some(FieldOfWork::Finance);
        assert!(!filter.matches(&posting));
    }

    #[test]
    fn filter_matches_location_and_stipend_floor() {
        let posting = posting(PostingStatus::Open, date(2026, 3, 20));

        let filter = PostingFilter {
            location: Some("des moines".to_string()),
            min_stipend: Some(2000),
            ..PostingFilter::default()
        };
        assert!(filter.matches(&posting));

        let too_low = PostingFilter {
            min_stipend: Some(3000),
            ..PostingFilter::default()
        };
        assert!(!too_low.matches(&posting));
    }
}
