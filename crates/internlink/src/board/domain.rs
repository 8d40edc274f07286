use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier for a board job, e.g. `job-000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A board listing. Salary bounds are advisory and optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_floor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_ceiling: Option<u32>,
    pub posted_on: NaiveDate,
}

/// Body of `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub contact_email: String,
    #[serde(default)]
    pub salary_floor: Option<u32>,
    #[serde(default)]
    pub salary_ceiling: Option<u32>,
}

/// Keyword and location narrowing for the catalog listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub text: Option<String>,
    pub location: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(location) = &self.location {
            if !job.location.to_lowercase().contains(&location.to_lowercase()) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let haystack = format!(
                "{} {} {}",
                job.title.to_lowercase(),
                job.company.to_lowercase(),
                job.description.to_lowercase()
            );
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job {
            id: JobId("job-000001".to_string()),
            title: "Junior Backend Developer".to_string(),
            company: "Fjordworks".to_string(),
            location: "Trondheim".to_string(),
            description: "REST services in a small product team".to_string(),
            contact_email: "jobs@fjordworks.no".to_string(),
            salary_floor: Some(52_000),
            salary_ceiling: Some(61_000),
            posted_on: NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
        }
    }

    #[test]
    fn filter_matches_keyword_across_title_company_and_description() {
        let mut filter = JobFilter::default();
        assert!(filter.matches(&job()));

        filter.text = Some("backend".to_string());
        assert!(filter.matches(&job()));
        filter.text = Some("fjordworks".to_string());
        assert!(filter.matches(&job()));
        filter.text = Some("product team".to_string());
        assert!(filter.matches(&job()));
        filter.text = Some("welding".to_string());
        assert!(!filter.matches(&job()));
    }

    #[test]
    fn filter_matches_location_case_insensitively() {
        let filter = JobFilter {
            location: Some("trond".to_string()),
            ..JobFilter::default()
        };
        assert!(filter.matches(&job()));

        let filter = JobFilter {
            location: Some("oslo".to_string()),
            ..JobFilter::default()
        };
        assert!(!filter.matches(&job()));
    }
}
