use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::marketplace::accounts::{AuthError, AuthenticatedUser, Authenticator, UserId, UserRole};
use crate::marketplace::applications::domain::{
    Application, ApplicationId, ApplicationStatus, SubmissionRequest,
};
use crate::marketplace::applications::repository::{ApplicationRepository, StatusCount};
use crate::marketplace::applications::router::ApplicationRoutes;
use crate::marketplace::applications::{application_router, ApplicationService};
use crate::marketplace::notifications::{
    Notification, NotificationError, NotificationId, NotificationKind, Notifier,
};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::postings::repository::{FieldCount, PostingRepository, PostingStatusCounts};
use crate::marketplace::postings::{FieldOfWork, Posting, PostingFilter, PostingId, PostingStatus};
use crate::marketplace::repository::RepositoryError;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

pub(super) fn student() -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId("user-000101".to_string()),
        role: UserRole::Student,
        display_name: "Mara Lindqvist".to_string(),
    }
}

pub(super) fn second_student() -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId("user-000102".to_string()),
        role: UserRole::Student,
        display_name: "Jonas Petersen".to_string(),
    }
}

pub(super) fn company() -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId("user-000201".to_string()),
        role: UserRole::Company,
        display_name: "Nordlys Analytics".to_string(),
    }
}

pub(super) fn rival_company() -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId("user-000202".to_string()),
        role: UserRole::Company,
        display_name: "Brightwater Labs".to_string(),
    }
}

pub(super) fn admin() -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId("user-000001".to_string()),
        role: UserRole::Admin,
        display_name: "Administrator".to_string(),
    }
}

pub(super) fn open_posting() -> Posting {
    Posting {
        id: PostingId("post-000301".to_string()),
        company: company().id,
        company_name: company().display_name,
        title: "Data Engineering Intern".to_string(),
        description: "Build ingestion pipelines for harbour sensor data.".to_string(),
        location: "Oslo".to_string(),
        field: FieldOfWork::DataScience,
        stipend: 1400,
        openings: 2,
        deadline: NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date"),
        skills: vec!["rust".to_string(), "sql".to_string()],
        status: PostingStatus::Open,
        posted_on: today(),
    }
}

pub(super) fn submission() -> SubmissionRequest {
    SubmissionRequest {
        cover_note: Some("I spent last summer wiring up a tide gauge network.".to_string()),
        resume: None,
    }
}

pub(super) fn build_service() -> (
    ApplicationService<MemoryApplications, MemoryPostings, RecordingNotifier>,
    Arc<MemoryApplications>,
    Arc<MemoryPostings>,
    Arc<RecordingNotifier>,
) {
    let applications = Arc::new(MemoryApplications::default());
    let postings = Arc::new(MemoryPostings::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let service =
        ApplicationService::new(applications.clone(), postings.clone(), notifier.clone());
    (service, applications, postings, notifier)
}

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: Mutex<BTreeMap<String, Application>>,
}

impl MemoryApplications {
    pub(super) fn seed(&self, application: Application) {
        self.records
            .lock()
            .expect("applications mutex poisoned")
            .insert(application.id.0.clone(), application);
    }
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("applications mutex poisoned");
        if guard.contains_key(&application.id.0) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.0.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("applications mutex poisoned");
        if !guard.contains_key(&application.id.0) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(application.id.0.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("applications mutex poisoned");
        guard.remove(&id.0).ok_or(RepositoryError::NotFound)?;
        Ok(())
    }

    fn find_for_student(
        &self,
        student: &UserId,
        posting: &PostingId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(guard
            .values()
            .find(|a| a.student == *student && a.posting == *posting)
            .cloned())
    }

    fn for_student(
        &self,
        student: &UserId,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        let mut items: Vec<_> = guard
            .values()
            .filter(|a| a.student == *student)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.id.0.cmp(&a.id.0));
        Ok(page.paginate(items))
    }

    fn for_posting(
        &self,
        posting: &PostingId,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        let mut items: Vec<_> = guard
            .values()
            .filter(|a| a.posting == *posting)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.id.0.cmp(&a.id.0));
        Ok(page.paginate(items))
    }

    fn active_for_posting(&self, posting: &PostingId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(guard
            .values()
            .filter(|a| a.posting == *posting && !a.status.is_terminal())
            .cloned()
            .collect())
    }

    fn status_counts(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let guard = self.records.lock().expect("applications mutex poisoned");
        Ok(ApplicationStatus::ordered()
            .into_iter()
            .map(|status| StatusCount {
                status: status.label(),
                total: guard.values().filter(|a| a.status == status).count(),
            })
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryPostings {
    records: Mutex<BTreeMap<String, Posting>>,
}

impl MemoryPostings {
    pub(super) fn seed(&self, posting: Posting) {
        self.records
            .lock()
            .expect("postings mutex poisoned")
            .insert(posting.id.0.clone(), posting);
    }
}

impl PostingRepository for MemoryPostings {
    fn insert(&self, posting: Posting) -> Result<Posting, RepositoryError> {
        let mut guard = self.records.lock().expect("postings mutex poisoned");
        if guard.contains_key(&posting.id.0) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(posting.id.0.clone(), posting.clone());
        Ok(posting)
    }

    fn update(&self, posting: Posting) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("postings mutex poisoned");
        if !guard.contains_key(&posting.id.0) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(posting.id.0.clone(), posting);
        Ok(())
    }

    fn fetch(&self, id: &PostingId) -> Result<Option<Posting>, RepositoryError> {
        let guard = self.records.lock().expect("postings mutex poisoned");
        Ok(guard.get(&id.0).cloned())
    }

    fn search(
        &self,
        filter: &PostingFilter,
        page: PageRequest,
    ) -> Result<Page<Posting>, RepositoryError> {
        let guard = self.records.lock().expect("postings mutex poisoned");
        let mut matches: Vec<_> = guard
            .values()
            .filter(|posting| filter.matches(posting))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.id.0.cmp(&a.id.0));
        Ok(page.paginate(matches))
    }

    fn status_counts(&self) -> Result<PostingStatusCounts, RepositoryError> {
        let guard = self.records.lock().expect("postings mutex poisoned");
        Ok(PostingStatusCounts {
            open: guard
                .values()
                .filter(|p| p.status == PostingStatus::Open)
                .count(),
            closed: guard
                .values()
                .filter(|p| p.status == PostingStatus::Closed)
                .count(),
        })
    }

    fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError> {
        let guard = self.records.lock().expect("postings mutex poisoned");
        Ok(FieldOfWork::ordered()
            .into_iter()
            .map(|field| FieldCount {
                field: field.label(),
                total: guard.values().filter(|p| p.field == field).count(),
            })
            .collect())
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, NotificationKind, String, Option<String>)>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<(UserId, NotificationKind, String, Option<String>)> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        recipient: &UserId,
        kind: NotificationKind,
        message: String,
        link: Option<String>,
    ) -> Result<Notification, NotificationError> {
        let mut guard = self.sent.lock().expect("notifier mutex poisoned");
        guard.push((recipient.clone(), kind, message.clone(), link.clone()));
        Ok(Notification {
            id: NotificationId(format!("ntf-test-{:03}", guard.len())),
            recipient: recipient.clone(),
            kind,
            message,
            link,
            read: false,
            created_at: Utc::now(),
        })
    }
}

/// Token-keyed stand-in for the account service's session lookup.
pub(super) struct StaticAuth {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticAuth {
    pub(super) fn with_fixtures() -> Self {
        let mut users = HashMap::new();
        users.insert("tok-student".to_string(), student());
        users.insert("tok-second-student".to_string(), second_student());
        users.insert("tok-company".to_string(), company());
        users.insert("tok-rival".to_string(), rival_company());
        users.insert("tok-admin".to_string(), admin());
        Self { users }
    }
}

impl Authenticator for StaticAuth {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.users
            .get(token)
            .cloned()
            .ok_or(AuthError::SessionExpired)
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_for_student(
        &self,
        _student: &UserId,
        _posting: &PostingId,
    ) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_student(
        &self,
        _student: &UserId,
        _page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_posting(
        &self,
        _posting: &PostingId,
        _page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active_for_posting(
        &self,
        _posting: &PostingId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn status_counts(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn application_router_with_fixtures() -> (
    axum::Router,
    Arc<MemoryApplications>,
    Arc<MemoryPostings>,
    Arc<RecordingNotifier>,
) {
    let (service, applications, postings, notifier) = build_service();
    postings.seed(open_posting());
    let router = application_router(Arc::new(ApplicationRoutes {
        service,
        auth: Arc::new(StaticAuth::with_fixtures()),
    }));
    (router, applications, postings, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
