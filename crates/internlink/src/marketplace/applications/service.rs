use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::domain::{
    AdvanceRequest, Application, ApplicationId, ApplicationStatus, ApplicationView, StatusChange,
    SubmissionRequest,
};
use super::repository::ApplicationRepository;
use crate::marketplace::accounts::{AuthenticatedUser, UserRole};
use crate::marketplace::notifications::{NotificationError, NotificationKind, Notifier};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::postings::repository::PostingRepository;
use crate::marketplace::postings::{Posting, PostingId, PostingStatus};
use crate::marketplace::repository::RepositoryError;

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("appl-{id:06}"))
}

/// Service composing the application store, the posting catalog, and the
/// notification hook.
pub struct ApplicationService<A, P, N> {
    applications: Arc<A>,
    postings: Arc<P>,
    notifier: Arc<N>,
}

impl<A, P, N> ApplicationService<A, P, N>
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(applications: Arc<A>, postings: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            applications,
            postings,
            notifier,
        }
    }

    /// Submit an application to an open posting. The posting's company is
    /// notified once the record is stored.
    pub fn submit(
        &self,
        student: &AuthenticatedUser,
        posting_id: &PostingId,
        request: SubmissionRequest,
        today: NaiveDate,
    ) -> Result<Application, ApplicationError> {
        if student.role != UserRole::Student {
            return Err(ApplicationError::Forbidden("only students may apply"));
        }

        let posting = self
            .postings
            .fetch(posting_id)?
            .ok_or(ApplicationError::PostingNotFound)?;

        if !posting.accepting_on(today) {
            return Err(match posting.status {
                PostingStatus::Closed => ApplicationError::PostingClosed,
                PostingStatus::Open => ApplicationError::DeadlinePassed,
            });
        }

        if self
            .applications
            .find_for_student(&student.id, posting_id)?
            .is_some()
        {
            return Err(ApplicationError::AlreadyApplied);
        }

        let submitted_at = Utc::now();
        let application = Application {
            id: next_application_id(),
            posting: posting.id.clone(),
            student: student.id.clone(),
            student_name: student.display_name.clone(),
            cover_note: request.cover_note.and_then(none_if_blank),
            resume: request.resume,
            status: ApplicationStatus::Pending,
            decided_on: None,
            history: vec![StatusChange {
                status: ApplicationStatus::Pending,
                changed_at: submitted_at,
                note: None,
            }],
            submitted_at,
        };

        let stored = self.applications.insert(application)?;

        self.notifier.notify(
            &posting.company,
            NotificationKind::NewApplication,
            format!("{} applied to {}", stored.student_name, posting.title),
            Some(format!("/postings/{}/applications", posting.id.0)),
        )?;

        Ok(stored)
    }

    /// Move an application one step along the review ladder. Only the
    /// posting's company (or an admin) may do this; the student is notified.
    pub fn advance(
        &self,
        actor: &AuthenticatedUser,
        id: &ApplicationId,
        request: AdvanceRequest,
    ) -> Result<Application, ApplicationError> {
        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(ApplicationError::NotFound)?;
        let posting = self
            .postings
            .fetch(&application.posting)?
            .ok_or(ApplicationError::PostingNotFound)?;

        authorize_review(actor, &posting)?;

        if !application.status.can_advance_to(request.status) {
            return Err(ApplicationError::IllegalTransition {
                from: application.status.label(),
                to: request.status.label(),
            });
        }

        let changed_at = Utc::now();
        application.status = request.status;
        application.decided_on = Some(changed_at.date_naive());
        application.history.push(StatusChange {
            status: request.status,
            changed_at,
            note: request.note.and_then(none_if_blank),
        });

        self.applications.update(application.clone())?;

        self.notifier.notify(
            &application.student,
            NotificationKind::ApplicationStatusChanged,
            format!(
                "Your application to {} is now {}",
                posting.title,
                application.status.label()
            ),
            Some(format!("/applications/{}", application.id.0)),
        )?;

        Ok(application)
    }

    /// Withdraw an undecided application. The record is removed and the
    /// company notified; the student may apply to the posting again later.
    pub fn withdraw(
        &self,
        student: &AuthenticatedUser,
        id: &ApplicationId,
    ) -> Result<(), ApplicationError> {
        let application = self
            .applications
            .fetch(id)?
            .filter(|application| application.student == student.id)
            .ok_or(ApplicationError::NotFound)?;

        if application.status.is_terminal() {
            return Err(ApplicationError::AlreadyDecided);
        }

        let posting = self
            .postings
            .fetch(&application.posting)?
            .ok_or(ApplicationError::PostingNotFound)?;

        self.applications.delete(id)?;

        self.notifier.notify(
            &posting.company,
            NotificationKind::ApplicationWithdrawn,
            format!(
                "{} withdrew their application to {}",
                application.student_name, posting.title
            ),
            Some(format!("/postings/{}/applications", posting.id.0)),
        )?;

        Ok(())
    }

    /// Fetch one application. Visible to the applicant, the posting's
    /// company, and admins; reported as missing to anyone else.
    pub fn get(
        &self,
        actor: &AuthenticatedUser,
        id: &ApplicationId,
    ) -> Result<Application, ApplicationError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or(ApplicationError::NotFound)?;

        if application.student == actor.id || actor.role == UserRole::Admin {
            return Ok(application);
        }

        let posting = self
            .postings
            .fetch(&application.posting)?
            .ok_or(ApplicationError::PostingNotFound)?;
        if posting.company == actor.id {
            Ok(application)
        } else {
            Err(ApplicationError::NotFound)
        }
    }

    pub fn for_student(
        &self,
        student: &AuthenticatedUser,
        page: PageRequest,
    ) -> Result<Page<Application>, ApplicationError> {
        let page = self.applications.for_student(&student.id, page)?;
        Ok(page)
    }

    pub fn for_posting(
        &self,
        actor: &AuthenticatedUser,
        posting_id: &PostingId,
        page: PageRequest,
    ) -> Result<Page<Application>, ApplicationError> {
        let posting = self
            .postings
            .fetch(posting_id)?
            .ok_or(ApplicationError::PostingNotFound)?;
        authorize_review(actor, &posting)?;

        let page = self.applications.for_posting(posting_id, page)?;
        Ok(page)
    }

    /// Join an application against its posting title for API responses.
    pub fn render(&self, application: &Application) -> Result<ApplicationView, ApplicationError> {
        let title = self
            .postings
            .fetch(&application.posting)?
            .map(|posting| posting.title)
            .unwrap_or_else(|| "unknown posting".to_string());
        Ok(application.view(&title))
    }

    pub fn render_page(
        &self,
        page: Page<Application>,
    ) -> Result<Page<ApplicationView>, ApplicationError> {
        let mut views = Vec::with_capacity(page.items.len());
        for application in &page.items {
            views.push(self.render(application)?);
        }
        Ok(Page {
            items: views,
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages,
        })
    }
}

fn authorize_review(actor: &AuthenticatedUser, posting: &Posting) -> Result<(), ApplicationError> {
    match actor.role {
        UserRole::Admin => Ok(()),
        UserRole::Company if posting.company == actor.id => Ok(()),
        _ => Err(ApplicationError::Forbidden(
            "applications are reviewed by the posting's company",
        )),
    }
}

fn none_if_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("application not found")]
    NotFound,
    #[error("posting not found")]
    PostingNotFound,
    #[error("posting is closed")]
    PostingClosed,
    #[error("application deadline has passed")]
    DeadlinePassed,
    #[error("an application for this posting already exists")]
    AlreadyApplied,
    #[error("cannot move application from {from} to {to}")]
    IllegalTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("application is already decided")]
    AlreadyDecided,
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
