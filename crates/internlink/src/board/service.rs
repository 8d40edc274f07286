use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use super::domain::{Job, JobDraft, JobFilter, JobId};
use super::repository::JobRepository;
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Service behind the standalone board. Listings are open to everyone, so
/// the operations take no caller identity.
pub struct JobBoardService<R> {
    jobs: Arc<R>,
}

impl<R> JobBoardService<R>
where
    R: JobRepository + 'static,
{
    pub fn new(jobs: Arc<R>) -> Self {
        Self { jobs }
    }

    /// Publish a listing.
    pub fn create(&self, draft: JobDraft, today: NaiveDate) -> Result<Job, JobError> {
        let draft = validate_draft(draft)?;

        let job = Job {
            id: next_job_id(),
            title: draft.title,
            company: draft.company,
            location: draft.location,
            description: draft.description,
            contact_email: draft.contact_email,
            salary_floor: draft.salary_floor,
            salary_ceiling: draft.salary_ceiling,
            posted_on: today,
        };

        let stored = self.jobs.insert(job)?;
        Ok(stored)
    }

    pub fn get(&self, id: &JobId) -> Result<Job, JobError> {
        self.jobs.fetch(id)?.ok_or(JobError::NotFound)
    }

    /// Remove a listing. The board has no accounts, so anyone holding the id
    /// may delete it.
    pub fn delete(&self, id: &JobId) -> Result<(), JobError> {
        if self.jobs.fetch(id)?.is_none() {
            return Err(JobError::NotFound);
        }
        self.jobs.delete(id)?;
        Ok(())
    }

    pub fn search(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>, JobError> {
        let jobs = self.jobs.search(filter, page)?;
        Ok(jobs)
    }
}

fn validate_draft(mut draft: JobDraft) -> Result<JobDraft, JobError> {
    draft.title = nonblank(draft.title, "title")?;
    draft.company = nonblank(draft.company, "company")?;
    draft.location = nonblank(draft.location, "location")?;
    draft.description = nonblank(draft.description, "description")?;
    draft.contact_email = plausible_email(&draft.contact_email)?;
    if let (Some(floor), Some(ceiling)) = (draft.salary_floor, draft.salary_ceiling) {
        if floor > ceiling {
            return Err(JobError::Validation(
                "salary floor exceeds the ceiling".to_string(),
            ));
        }
    }
    Ok(draft)
}

fn nonblank(value: String, field: &str) -> Result<String, JobError> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        return Err(JobError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed)
}

fn plausible_email(raw: &str) -> Result<String, JobError> {
    let email = raw.trim().to_ascii_lowercase();
    let plausible = email
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        .unwrap_or(false);

    if plausible {
        Ok(email)
    } else {
        Err(JobError::Validation(format!(
            "contact email {raw:?} does not look deliverable"
        )))
    }
}

/// Error raised by the board service.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job not found")]
    NotFound,
    #[error("invalid job: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
