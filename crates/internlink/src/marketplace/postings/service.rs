use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use super::domain::{
    Posting, PostingDraft, PostingFilter, PostingId, PostingStatus, PostingUpdate,
};
use super::repository::PostingRepository;
use crate::marketplace::accounts::{AuthenticatedUser, UserRole};
use crate::marketplace::applications::repository::ApplicationRepository;
use crate::marketplace::notifications::{NotificationError, NotificationKind, Notifier};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

static POSTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_posting_id() -> PostingId {
    let id = POSTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PostingId(format!("post-{id:06}"))
}

/// Service composing the posting catalog, applicant lookups, and the
/// notification hook fired when a posting closes.
pub struct PostingService<P, A, N> {
    postings: Arc<P>,
    applications: Arc<A>,
    notifier: Arc<N>,
}

impl<P, A, N> PostingService<P, A, N>
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(postings: Arc<P>, applications: Arc<A>, notifier: Arc<N>) -> Self {
        Self {
            postings,
            applications,
            notifier,
        }
    }

    /// Publish a new posting on behalf of the calling company.
    pub fn create(
        &self,
        user: &AuthenticatedUser,
        draft: PostingDraft,
        today: NaiveDate,
    ) -> Result<Posting, PostingError> {
        if user.role != UserRole::Company {
            return Err(PostingError::Forbidden("only companies may create postings"));
        }
        let draft = validate_draft(draft, today)?;

        let posting = Posting {
            id: next_posting_id(),
            company: user.id.clone(),
            company_name: user.display_name.clone(),
            title: draft.title,
            description: draft.description,
            location: draft.location,
            field: draft.field,
            stipend: draft.stipend,
            openings: draft.openings,
            deadline: draft.deadline,
            skills: draft.skills,
            status: PostingStatus::Open,
            posted_on: today,
        };

        let stored = self.postings.insert(posting)?;
        Ok(stored)
    }

    /// Publish a batch of postings, typically rows from the CSV importer.
    /// Every draft is validated before any posting is stored.
    pub fn bulk_create(
        &self,
        user: &AuthenticatedUser,
        drafts: Vec<PostingDraft>,
        today: NaiveDate,
    ) -> Result<Vec<Posting>, PostingError> {
        if user.role != UserRole::Company {
            return Err(PostingError::Forbidden("only companies may create postings"));
        }
        let drafts = drafts
            .into_iter()
            .map(|draft| validate_draft(draft, today))
            .collect::<Result<Vec<_>, _>>()?;

        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let posting = Posting {
                id: next_posting_id(),
                company: user.id.clone(),
                company_name: user.display_name.clone(),
                title: draft.title,
                description: draft.description,
                location: draft.location,
                field: draft.field,
                stipend: draft.stipend,
                openings: draft.openings,
                deadline: draft.deadline,
                skills: draft.skills,
                status: PostingStatus::Open,
                posted_on: today,
            };
            created.push(self.postings.insert(posting)?);
        }
        Ok(created)
    }

    /// Edit a posting. The deadline can never be moved into the past, so a
    /// closed posting stays closed to applicants no matter what is edited.
    pub fn update(
        &self,
        user: &AuthenticatedUser,
        id: &PostingId,
        update: PostingUpdate,
        today: NaiveDate,
    ) -> Result<Posting, PostingError> {
        let mut posting = self.postings.fetch(id)?.ok_or(PostingError::NotFound)?;
        authorize_manage(user, &posting)?;

        if let Some(title) = update.title {
            posting.title = nonblank(title, "title")?;
        }
        if let Some(description) = update.description {
            posting.description = nonblank(description, "description")?;
        }
        if let Some(location) = update.location {
            posting.location = nonblank(location, "location")?;
        }
        if let Some(field) = update.field {
            posting.field = field;
        }
        if let Some(stipend) = update.stipend {
            posting.stipend = stipend;
        }
        if let Some(openings) = update.openings {
            if openings == 0 {
                return Err(PostingError::Validation(
                    "openings must be at least 1".to_string(),
                ));
            }
            posting.openings = openings;
        }
        if let Some(deadline) = update.deadline {
            if deadline < today {
                return Err(PostingError::Validation(
                    "deadline must not be in the past".to_string(),
                ));
            }
            posting.deadline = deadline;
        }
        if let Some(skills) = update.skills {
            posting.skills = cleaned_skills(skills);
        }

        self.postings.update(posting.clone())?;
        Ok(posting)
    }

    /// Close a posting and tell every student with an undecided application.
    /// Closing an already-closed posting is a no-op; the fan-out fires once.
    pub fn close(
        &self,
        user: &AuthenticatedUser,
        id: &PostingId,
    ) -> Result<Posting, PostingError> {
        let mut posting = self.postings.fetch(id)?.ok_or(PostingError::NotFound)?;
        authorize_manage(user, &posting)?;
        if matches!(posting.status, PostingStatus::Closed) {
            return Ok(posting);
        }

        posting.status = PostingStatus::Closed;
        self.postings.update(posting.clone())?;

        let applicants = self.applications.active_for_posting(&posting.id)?;
        for application in &applicants {
            self.notifier.notify(
                &application.student,
                NotificationKind::PostingClosed,
                format!(
                    "{} at {} is no longer accepting applications",
                    posting.title, posting.company_name
                ),
                Some(format!("/postings/{}", posting.id.0)),
            )?;
        }

        tracing::info!(
            posting = %posting.id.0,
            notified = applicants.len(),
            "posting closed"
        );
        Ok(posting)
    }

    pub fn get(&self, id: &PostingId) -> Result<Posting, PostingError> {
        let posting = self.postings.fetch(id)?.ok_or(PostingError::NotFound)?;
        Ok(posting)
    }

    pub fn search(
        &self,
        filter: PostingFilter,
        page: PageRequest,
    ) -> Result<Page<Posting>, PostingError> {
        let page = self.postings.search(&filter, page)?;
        Ok(page)
    }
}

fn authorize_manage(user: &AuthenticatedUser, posting: &Posting) -> Result<(), PostingError> {
    match user.role {
        UserRole::Admin => Ok(()),
        UserRole::Company if posting.company == user.id => Ok(()),
        _ => Err(PostingError::Forbidden(
            "posting belongs to another company",
        )),
    }
}

fn validate_draft(mut draft: PostingDraft, today: NaiveDate) -> Result<PostingDraft, PostingError> {
    draft.title = nonblank(draft.title, "title")?;
    draft.description = nonblank(draft.description, "description")?;
    draft.location = nonblank(draft.location, "location")?;
    if draft.openings == 0 {
        return Err(PostingError::Validation(
            "openings must be at least 1".to_string(),
        ));
    }
    if draft.deadline < today {
        return Err(PostingError::Validation(
            "deadline must not be in the past".to_string(),
        ));
    }
    draft.skills = cleaned_skills(draft.skills);
    Ok(draft)
}

fn nonblank(value: String, field: &str) -> Result<String, PostingError> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        return Err(PostingError::Validation(format!(
            "{field} must not be blank"
        )));
    }
    Ok(trimmed)
}

fn cleaned_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect()
}

/// Error raised by the posting service.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    #[error("posting not found")]
    NotFound,
    #[error("invalid posting: {0}")]
    Validation(String),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
