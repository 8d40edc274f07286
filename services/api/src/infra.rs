use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::broadcast;

use internlink::config::{SessionConfig, UploadConfig};
use internlink::marketplace::accounts::repository::{AccountRepository, RoleCount, SessionStore};
use internlink::marketplace::accounts::{AccountService, Session, UserAccount, UserId, UserRole};
use internlink::marketplace::admin::AdminService;
use internlink::marketplace::applications::repository::{ApplicationRepository, StatusCount};
use internlink::marketplace::applications::{
    Application, ApplicationId, ApplicationService, ApplicationStatus,
};
use internlink::marketplace::documents::{
    DiskDocumentStore, DocumentId, DocumentRepository, DocumentService, StoredDocument,
};
use internlink::marketplace::notifications::repository::NotificationTotals;
use internlink::marketplace::notifications::{
    FanoutError, Notification, NotificationFanout, NotificationId, NotificationRepository,
    NotificationService,
};
use internlink::marketplace::pagination::{Page, PageRequest};
use internlink::marketplace::postings::repository::{
    FieldCount, PostingRepository, PostingStatusCounts,
};
use internlink::marketplace::postings::{
    FieldOfWork, Posting, PostingFilter, PostingId, PostingService, PostingStatus,
};
use internlink::marketplace::repository::RepositoryError;
use internlink::marketplace::wishlist::repository::WishlistRepository;
use internlink::marketplace::wishlist::{WishlistItem, WishlistItemId, WishlistService};

/// Handles shared with every handler through an axum Extension.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification service variant wired to the live websocket hub.
pub(crate) type LiveNotifier = NotificationService<MemoryNotifications, LiveNotificationHub>;

#[derive(Default)]
pub(crate) struct MemoryAccounts {
    records: Mutex<BTreeMap<String, UserAccount>>,
}

impl AccountRepository for MemoryAccounts {
    fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError> {
        let mut records = self.records.lock().expect("account store poisoned");
        if records.contains_key(&account.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(account.id.0.clone(), account.clone());
        Ok(account)
    }

    fn update(&self, account: UserAccount) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("account store poisoned");
        if !records.contains_key(&account.id.0) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(account.id.0.clone(), account);
        Ok(())
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
        let records = self.records.lock().expect("account store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn fetch_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let records = self.records.lock().expect("account store poisoned");
        Ok(records.values().find(|a| a.email == email).cloned())
    }

    fn list(
        &self,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<Page<UserAccount>, RepositoryError> {
        let records = self.records.lock().expect("account store poisoned");
        let accounts: Vec<UserAccount> = records
            .values()
            .rev()
            .filter(|a| role.map_or(true, |wanted| a.role == wanted))
            .cloned()
            .collect();
        Ok(page.paginate(accounts))
    }

    fn role_breakdown(&self) -> Result<Vec<RoleCount>, RepositoryError> {
        let records = self.records.lock().expect("account store poisoned");
        Ok([UserRole::Student, UserRole::Company, UserRole::Admin]
            .into_iter()
            .map(|role| RoleCount {
                role: role.label(),
                total: records.values().filter(|a| a.role == role).count(),
                active: records
                    .values()
                    .filter(|a| a.role == role && a.active)
                    .count(),
            })
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct MemorySessions {
    records: Mutex<HashMap<String, Session>>,
}

impl SessionStore for MemorySessions {
    fn insert(&self, session: Session) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("session store poisoned");
        records.insert(session.token.clone(), session);
        Ok(())
    }

    fn fetch(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let records = self.records.lock().expect("session store poisoned");
        Ok(records.get(token).cloned())
    }

    fn revoke(&self, token: &str) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("session store poisoned");
        records.remove(token);
        Ok(())
    }

    fn revoke_for_user(&self, user: &UserId) -> Result<usize, RepositoryError> {
        let mut records = self.records.lock().expect("session store poisoned");
        let before = records.len();
        records.retain(|_, session| session.user != *user);
        Ok(before - records.len())
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut records = self.records.lock().expect("session store poisoned");
        let before = records.len();
        records.retain(|_, session| session.expires_at > now);
        Ok(before - records.len())
    }
}

#[derive(Default)]
pub(crate) struct MemoryPostings {
    records: Mutex<BTreeMap<String, Posting>>,
}

impl PostingRepository for MemoryPostings {
    fn insert(&self, posting: Posting) -> Result<Posting, RepositoryError> {
        let mut records = self.records.lock().expect("posting store poisoned");
        if records.contains_key(&posting.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(posting.id.0.clone(), posting.clone());
        Ok(posting)
    }

    fn update(&self, posting: Posting) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("posting store poisoned");
        if !records.contains_key(&posting.id.0) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(posting.id.0.clone(), posting);
        Ok(())
    }

    fn fetch(&self, id: &PostingId) -> Result<Option<Posting>, RepositoryError> {
        let records = self.records.lock().expect("posting store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn search(
        &self,
        filter: &PostingFilter,
        page: PageRequest,
    ) -> Result<Page<Posting>, RepositoryError> {
        let records = self.records.lock().expect("posting store poisoned");
        let matches: Vec<Posting> = records
            .values()
            .rev()
            .filter(|posting| filter.matches(posting))
            .cloned()
            .collect();
        Ok(page.paginate(matches))
    }

    fn status_counts(&self) -> Result<PostingStatusCounts, RepositoryError> {
        let records = self.records.lock().expect("posting store poisoned");
        Ok(PostingStatusCounts {
            open: records
                .values()
                .filter(|p| p.status == PostingStatus::Open)
                .count(),
            closed: records
                .values()
                .filter(|p| p.status == PostingStatus::Closed)
                .count(),
        })
    }

    fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError> {
        let records = self.records.lock().expect("posting store poisoned");
        let mut counts = Vec::new();
        for field in FieldOfWork::ordered() {
            let total = records.values().filter(|p| p.field == field).count();
            if total > 0 {
                counts.push(FieldCount {
                    field: field.label(),
                    total,
                });
            }
        }
        Ok(counts)
    }
}

#[derive(Default)]
pub(crate) struct MemoryApplications {
    records: Mutex<BTreeMap<String, Application>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut records = self.records.lock().expect("application store poisoned");
        if records.contains_key(&application.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(application.id.0.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("application store poisoned");
        if !records.contains_key(&application.id.0) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(application.id.0.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let records = self.records.lock().expect("application store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("application store poisoned");
        records.remove(&id.0);
        Ok(())
    }

    fn find_for_student(
        &self,
        student: &UserId,
        posting: &PostingId,
    ) -> Result<Option<Application>, RepositoryError> {
        let records = self.records.lock().expect("application store poisoned");
        Ok(records
            .values()
            .find(|a| a.student == *student && a.posting == *posting)
            .cloned())
    }

    fn for_student(
        &self,
        student: &UserId,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        let records = self.records.lock().expect("application store poisoned");
        let matches: Vec<Application> = records
            .values()
            .rev()
            .filter(|a| a.student == *student)
            .cloned()
            .collect();
        Ok(page.paginate(matches))
    }

    fn for_posting(
        &self,
        posting: &PostingId,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        let records = self.records.lock().expect("application store poisoned");
        let matches: Vec<Application> = records
            .values()
            .rev()
            .filter(|a| a.posting == *posting)
            .cloned()
            .collect();
        Ok(page.paginate(matches))
    }

    fn active_for_posting(
        &self,
        posting: &PostingId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let records = self.records.lock().expect("application store poisoned");
        Ok(records
            .values()
            .filter(|a| a.posting == *posting && !a.status.is_terminal())
            .cloned()
            .collect())
    }

    fn status_counts(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let records = self.records.lock().expect("application store poisoned");
        let mut counts = Vec::new();
        for status in ApplicationStatus::ordered() {
            let total = records.values().filter(|a| a.status == status).count();
            if total > 0 {
                counts.push(StatusCount {
                    status: status.label(),
                    total,
                });
            }
        }
        Ok(counts)
    }
}

#[derive(Default)]
pub(crate) struct MemoryNotifications {
    records: Mutex<BTreeMap<String, Notification>>,
}

impl NotificationRepository for MemoryNotifications {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut records = self.records.lock().expect("notification store poisoned");
        if records.contains_key(&notification.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(notification.id.0.clone(), notification.clone());
        Ok(notification)
    }

    fn update(&self, notification: Notification) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("notification store poisoned");
        if !records.contains_key(&notification.id.0) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(notification.id.0.clone(), notification);
        Ok(())
    }

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let records = self.records.lock().expect("notification store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn for_recipient(
        &self,
        recipient: &UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, RepositoryError> {
        let records = self.records.lock().expect("notification store poisoned");
        let matches: Vec<Notification> = records
            .values()
            .rev()
            .filter(|n| n.recipient == *recipient)
            .cloned()
            .collect();
        Ok(page.paginate(matches))
    }

    fn unread_count(&self, recipient: &UserId) -> Result<usize, RepositoryError> {
        let records = self.records.lock().expect("notification store poisoned");
        Ok(records
            .values()
            .filter(|n| n.recipient == *recipient && !n.read)
            .count())
    }

    fn mark_all_read(&self, recipient: &UserId) -> Result<usize, RepositoryError> {
        let mut records = self.records.lock().expect("notification store poisoned");
        let mut updated = 0;
        for notification in records.values_mut() {
            if notification.recipient == *recipient && !notification.read {
                notification.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn totals(&self) -> Result<NotificationTotals, RepositoryError> {
        let records = self.records.lock().expect("notification store poisoned");
        Ok(NotificationTotals {
            total: records.len(),
            unread: records.values().filter(|n| !n.read).count(),
        })
    }
}

#[derive(Default)]
pub(crate) struct MemoryWishlist {
    records: Mutex<BTreeMap<String, WishlistItem>>,
}

impl WishlistRepository for MemoryWishlist {
    fn insert(&self, item: WishlistItem) -> Result<WishlistItem, RepositoryError> {
        let mut records = self.records.lock().expect("wishlist store poisoned");
        if records.contains_key(&item.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(item.id.0.clone(), item.clone());
        Ok(item)
    }

    fn update(&self, item: WishlistItem) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("wishlist store poisoned");
        if !records.contains_key(&item.id.0) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(item.id.0.clone(), item);
        Ok(())
    }

    fn fetch(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError> {
        let records = self.records.lock().expect("wishlist store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn delete(&self, id: &WishlistItemId) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("wishlist store poisoned");
        records.remove(&id.0);
        Ok(())
    }

    fn find_for_student(
        &self,
        student: &UserId,
        posting: &PostingId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let records = self.records.lock().expect("wishlist store poisoned");
        Ok(records
            .values()
            .find(|item| item.student == *student && item.posting == *posting)
            .cloned())
    }

    fn for_student(&self, student: &UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let records = self.records.lock().expect("wishlist store poisoned");
        Ok(records
            .values()
            .rev()
            .filter(|item| item.student == *student)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<WishlistItem>, RepositoryError> {
        let records = self.records.lock().expect("wishlist store poisoned");
        Ok(records.values().cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryDocuments {
    records: Mutex<BTreeMap<String, StoredDocument>>,
}

impl DocumentRepository for MemoryDocuments {
    fn insert(&self, document: StoredDocument) -> Result<StoredDocument, RepositoryError> {
        let mut records = self.records.lock().expect("document store poisoned");
        if records.contains_key(&document.id.0) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(document.id.0.clone(), document.clone());
        Ok(document)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Option<StoredDocument>, RepositoryError> {
        let records = self.records.lock().expect("document store poisoned");
        Ok(records.get(&id.0).cloned())
    }

    fn for_owner(&self, owner: &UserId) -> Result<Vec<StoredDocument>, RepositoryError> {
        let records = self.records.lock().expect("document store poisoned");
        Ok(records
            .values()
            .rev()
            .filter(|document| document.owner == *owner)
            .cloned()
            .collect())
    }
}

const STREAM_BUFFER: usize = 64;

/// Per-user broadcast channels feeding the websocket stream. A sender whose
/// receivers have all hung up is pruned on the next push for that user.
#[derive(Default)]
pub(crate) struct LiveNotificationHub {
    channels: Mutex<HashMap<UserId, broadcast::Sender<String>>>,
}

impl LiveNotificationHub {
    /// Open a live feed for one user. Slow readers miss messages once the
    /// channel buffer wraps; persistence remains the source of truth.
    pub(crate) fn subscribe(&self, user: &UserId) -> broadcast::Receiver<String> {
        let mut channels = self.channels.lock().expect("hub mutex poisoned");
        channels
            .entry(user.clone())
            .or_insert_with(|| broadcast::channel(STREAM_BUFFER).0)
            .subscribe()
    }
}

impl NotificationFanout for LiveNotificationHub {
    fn push(&self, notification: &Notification) -> Result<(), FanoutError> {
        let payload = serde_json::to_string(notification)
            .map_err(|err| FanoutError::Encode(err.to_string()))?;
        let mut channels = self.channels.lock().expect("hub mutex poisoned");
        let Some(sender) = channels.get(&notification.recipient) else {
            return Ok(());
        };
        if sender.send(payload).is_err() {
            channels.remove(&notification.recipient);
        }
        Ok(())
    }
}

/// Every repository backing the service, shared so the admin dashboard can
/// aggregate across all of them.
#[derive(Default)]
pub(crate) struct MemoryStores {
    pub(crate) accounts: Arc<MemoryAccounts>,
    pub(crate) sessions: Arc<MemorySessions>,
    pub(crate) postings: Arc<MemoryPostings>,
    pub(crate) applications: Arc<MemoryApplications>,
    pub(crate) notifications: Arc<MemoryNotifications>,
    pub(crate) wishlist: Arc<MemoryWishlist>,
    pub(crate) documents: Arc<MemoryDocuments>,
}

/// One set of stores wired behind the domain services. The account service
/// doubles as the authenticator for every protected router.
pub(crate) struct Marketplace {
    pub(crate) stores: MemoryStores,
    pub(crate) hub: Arc<LiveNotificationHub>,
    pub(crate) accounts: Arc<AccountService<MemoryAccounts, MemorySessions>>,
    pub(crate) notifications: Arc<LiveNotifier>,
    pub(crate) postings: Arc<PostingService<MemoryPostings, MemoryApplications, LiveNotifier>>,
    files: Arc<DiskDocumentStore>,
    upload_cap: usize,
}

impl Marketplace {
    pub(crate) fn new(sessions: &SessionConfig, uploads: &UploadConfig) -> Marketplace {
        let stores = MemoryStores::default();
        let hub = Arc::new(LiveNotificationHub::default());
        let accounts = Arc::new(AccountService::new(
            stores.accounts.clone(),
            stores.sessions.clone(),
            sessions,
        ));
        let notifications = Arc::new(NotificationService::new(
            stores.notifications.clone(),
            hub.clone(),
        ));
        let postings = Arc::new(PostingService::new(
            stores.postings.clone(),
            stores.applications.clone(),
            notifications.clone(),
        ));
        let files = Arc::new(DiskDocumentStore::new(uploads.dir.clone()));

        Marketplace {
            stores,
            hub,
            accounts,
            notifications,
            postings,
            files,
            upload_cap: uploads.max_bytes,
        }
    }

    pub(crate) fn applications(
        &self,
    ) -> ApplicationService<MemoryApplications, MemoryPostings, LiveNotifier> {
        ApplicationService::new(
            self.stores.applications.clone(),
            self.stores.postings.clone(),
            self.notifications.clone(),
        )
    }

    pub(crate) fn wishlist(
        &self,
    ) -> WishlistService<MemoryWishlist, MemoryPostings, LiveNotifier> {
        WishlistService::new(
            self.stores.wishlist.clone(),
            self.stores.postings.clone(),
            self.notifications.clone(),
        )
    }

    pub(crate) fn documents(&self) -> DocumentService<MemoryDocuments, DiskDocumentStore> {
        DocumentService::new(
            self.stores.documents.clone(),
            self.files.clone(),
            self.upload_cap,
        )
    }

    pub(crate) fn admin(
        &self,
    ) -> AdminService<MemoryAccounts, MemorySessions, MemoryPostings, MemoryApplications, MemoryNotifications>
    {
        AdminService::new(
            self.stores.accounts.clone(),
            self.stores.sessions.clone(),
            self.stores.postings.clone(),
            self.stores.applications.clone(),
            self.stores.notifications.clone(),
        )
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
