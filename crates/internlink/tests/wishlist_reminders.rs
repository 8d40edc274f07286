//! End-to-end specifications for the wishlist and its deadline reminder
//! sweep, driven through the routers with the real notification service so
//! reminders land in the recipient's inbox.

mod common {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use internlink::config::SessionConfig;
    use internlink::marketplace::accounts::repository::{
        AccountRepository, RoleCount, SessionStore,
    };
    use internlink::marketplace::accounts::{
        auth_router, AccountService, Session, UserAccount, UserId, UserRole,
    };
    use internlink::marketplace::notifications::repository::NotificationTotals;
    use internlink::marketplace::notifications::router::NotificationRoutes;
    use internlink::marketplace::notifications::{
        notification_router, FanoutError, Notification, NotificationFanout, NotificationId,
        NotificationRepository, NotificationService,
    };
    use internlink::marketplace::pagination::{Page, PageRequest};
    use internlink::marketplace::postings::repository::{
        FieldCount, PostingRepository, PostingStatusCounts,
    };
    use internlink::marketplace::postings::{
        FieldOfWork, Posting, PostingFilter, PostingId, PostingStatus,
    };
    use internlink::marketplace::repository::RepositoryError;
    use internlink::marketplace::wishlist::router::WishlistRoutes;
    use internlink::marketplace::wishlist::{
        wishlist_router, WishlistItem, WishlistItemId, WishlistRepository, WishlistService,
    };

    #[derive(Default)]
    struct MemoryAccounts {
        records: Mutex<HashMap<String, UserAccount>>,
    }

    impl AccountRepository for MemoryAccounts {
        fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError> {
            let mut guard = self.records.lock().expect("accounts mutex");
            guard.insert(account.id.0.clone(), account.clone());
            Ok(account)
        }

        fn update(&self, account: UserAccount) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("accounts mutex");
            guard.insert(account.id.0.clone(), account);
            Ok(())
        }

        fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError> {
            let guard = self.records.lock().expect("accounts mutex");
            Ok(guard.get(&id.0).cloned())
        }

        fn fetch_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
            let guard = self.records.lock().expect("accounts mutex");
            Ok(guard.values().find(|a| a.email == email).cloned())
        }

        fn list(
            &self,
            role: Option<UserRole>,
            page: PageRequest,
        ) -> Result<Page<UserAccount>, RepositoryError> {
            let guard = self.records.lock().expect("accounts mutex");
            let mut accounts: Vec<_> = guard
                .values()
                .filter(|a| role.map_or(true, |role| a.role == role))
                .cloned()
                .collect();
            accounts.sort_by(|a, b| b.id.0.cmp(&a.id.0));
            Ok(page.paginate(accounts))
        }

        fn role_breakdown(&self) -> Result<Vec<RoleCount>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemorySessions {
        records: Mutex<HashMap<String, Session>>,
    }

    impl SessionStore for MemorySessions {
        fn insert(&self, session: Session) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex");
            guard.insert(session.token.clone(), session);
            Ok(())
        }

        fn fetch(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
            let guard = self.records.lock().expect("sessions mutex");
            Ok(guard.get(token).cloned())
        }

        fn revoke(&self, token: &str) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex");
            guard.remove(token);
            Ok(())
        }

        fn revoke_for_user(&self, user: &UserId) -> Result<usize, RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex");
            let before = guard.len();
            guard.retain(|_, session| session.user != *user);
            Ok(before - guard.len())
        }

        fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
            let mut guard = self.records.lock().expect("sessions mutex");
            let before = guard.len();
            guard.retain(|_, session| session.expires_at > now);
            Ok(before - guard.len())
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
                .expect("postings mutex")
                .insert(posting.id.0.clone(), posting);
        }
    }

    impl PostingRepository for MemoryPostings {
        fn insert(&self, posting: Posting) -> Result<Posting, RepositoryError> {
            self.seed(posting.clone());
            Ok(posting)
        }

        fn update(&self, posting: Posting) -> Result<(), RepositoryError> {
            self.seed(posting);
            Ok(())
        }

        fn fetch(&self, id: &PostingId) -> Result<Option<Posting>, RepositoryError> {
            let guard = self.records.lock().expect("postings mutex");
            Ok(guard.get(&id.0).cloned())
        }

        fn search(
            &self,
            filter: &PostingFilter,
            page: PageRequest,
        ) -> Result<Page<Posting>, RepositoryError> {
            let guard = self.records.lock().expect("postings mutex");
            let matches: Vec<_> = guard
                .values()
                .filter(|posting| filter.matches(posting))
                .cloned()
                .collect();
            Ok(page.paginate(matches))
        }

        fn status_counts(&self) -> Result<PostingStatusCounts, RepositoryError> {
            Ok(PostingStatusCounts { open: 0, closed: 0 })
        }

        fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemoryWishlist {
        records: Mutex<BTreeMap<String, WishlistItem>>,
    }

    impl WishlistRepository for MemoryWishlist {
        fn insert(&self, item: WishlistItem) -> Result<WishlistItem, RepositoryError> {
            let mut guard = self.records.lock().expect("wishlist mutex");
            guard.insert(item.id.0.clone(), item.clone());
            Ok(item)
        }

        fn update(&self, item: WishlistItem) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("wishlist mutex");
            if !guard.contains_key(&item.id.0) {
                return Err(RepositoryError::NotFound);
            }
            guard.insert(item.id.0.clone(), item);
            Ok(())
        }

        fn fetch(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError> {
            let guard = self.records.lock().expect("wishlist mutex");
            Ok(guard.get(&id.0).cloned())
        }

        fn delete(&self, id: &WishlistItemId) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("wishlist mutex");
            guard.remove(&id.0).ok_or(RepositoryError::NotFound)?;
            Ok(())
        }

        fn find_for_student(
            &self,
            student: &UserId,
            posting: &PostingId,
        ) -> Result<Option<WishlistItem>, RepositoryError> {
            let guard = self.records.lock().expect("wishlist mutex");
            Ok(guard
                .values()
                .find(|item| item.student == *student && item.posting == *posting)
                .cloned())
        }

        fn for_student(&self, student: &UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
            let guard = self.records.lock().expect("wishlist mutex");
            Ok(guard
                .values()
                .filter(|item| item.student == *student)
                .cloned()
                .collect())
        }

        fn all(&self) -> Result<Vec<WishlistItem>, RepositoryError> {
            let guard = self.records.lock().expect("wishlist mutex");
            Ok(guard.values().cloned().collect())
        }
    }

    #[derive(Default)]
    struct MemoryNotifications {
        records: Mutex<BTreeMap<String, Notification>>,
    }

    impl NotificationRepository for MemoryNotifications {
        fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
            let mut guard = self.records.lock().expect("notifications mutex");
            guard.insert(notification.id.0.clone(), notification.clone());
            Ok(notification)
        }

        fn update(&self, notification: Notification) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("notifications mutex");
            guard.insert(notification.id.0.clone(), notification);
            Ok(())
        }

        fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
            let guard = self.records.lock().expect("notifications mutex");
            Ok(guard.get(&id.0).cloned())
        }

        fn for_recipient(
            &self,
            recipient: &UserId,
            page: PageRequest,
        ) -> Result<Page<Notification>, RepositoryError> {
            let guard = self.records.lock().expect("notifications mutex");
            let mut items: Vec<_> = guard
                .values()
                .filter(|n| n.recipient == *recipient)
                .cloned()
                .collect();
            items.sort_by(|a, b| b.id.0.cmp(&a.id.0));
            Ok(page.paginate(items))
        }

        fn unread_count(&self, recipient: &UserId) -> Result<usize, RepositoryError> {
            let guard = self.records.lock().expect("notifications mutex");
            Ok(guard
                .values()
                .filter(|n| n.recipient == *recipient && !n.read)
                .count())
        }

        fn mark_all_read(&self, recipient: &UserId) -> Result<usize, RepositoryError> {
            let mut guard = self.records.lock().expect("notifications mutex");
            let mut updated = 0;
            for notification in guard.values_mut() {
                if notification.recipient == *recipient && !notification.read {
                    notification.read = true;
                    updated += 1;
                }
            }
            Ok(updated)
        }

        fn totals(&self) -> Result<NotificationTotals, RepositoryError> {
            let guard = self.records.lock().expect("notifications mutex");
            Ok(NotificationTotals {
                total: guard.len(),
                unread: guard.values().filter(|n| !n.read).count(),
            })
        }
    }

    struct NoopFanout;

    impl NotificationFanout for NoopFanout {
        fn push(&self, _notification: &Notification) -> Result<(), FanoutError> {
            Ok(())
        }
    }

    pub(super) fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub(super) fn posting(id: &str, title: &str, deadline: NaiveDate) -> Posting {
        Posting {
            id: PostingId(id.to_string()),
            company: UserId("user-900001".to_string()),
            company_name: "Nordlys Analytics".to_string(),
            title: title.to_string(),
            description: "Work on harbour sensor ingestion.".to_string(),
            location: "Oslo".to_string(),
            field: FieldOfWork::DataScience,
            stipend: 1400,
            openings: 2,
            deadline,
            skills: vec!["rust".to_string()],
            status: PostingStatus::Open,
            posted_on: today() - Duration::days(10),
        }
    }

    /// Routers plus the seeded posting repository and an admin token.
    pub(super) async fn build_fixture() -> (axum::Router, Arc<MemoryPostings>, String) {
        let accounts = Arc::new(AccountService::new(
            Arc::new(MemoryAccounts::default()),
            Arc::new(MemorySessions::default()),
            &SessionConfig { ttl_hours: 24 },
        ));
        let postings = Arc::new(MemoryPostings::default());
        let notifier = Arc::new(NotificationService::new(
            Arc::new(MemoryNotifications::default()),
            Arc::new(NoopFanout),
        ));

        let wishlist_service = WishlistService::new(
            Arc::new(MemoryWishlist::default()),
            postings.clone(),
            notifier.clone(),
        );

        let router = auth_router(accounts.clone())
            .merge(wishlist_router(Arc::new(WishlistRoutes {
                service: wishlist_service,
                auth: accounts.clone(),
            })))
            .merge(notification_router(Arc::new(NotificationRoutes {
                service: notifier,
                auth: accounts.clone(),
            })));

        accounts
            .provision_admin("ops@internlink.example", "rotate-me-soon-1")
            .expect("admin provisioned");
        let admin = login(&router, "ops@internlink.example").await;

        (router, postings, admin)
    }

    pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub(super) fn authed_request(
        method: &str,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"));
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request")
    }

    pub(super) async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json payload")
    }

    pub(super) async fn login(router: &axum::Router, email: &str) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/login",
                json!({ "email": email, "password": "rotate-me-soon-1" }),
            ))
            .await
            .expect("login dispatch");
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        read_json(response).await["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    pub(super) async fn signup_student(router: &axum::Router, email: &str) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/register",
                json!({
                    "email": email,
                    "password": "rotate-me-soon-1",
                    "display_name": "Mara Lindqvist",
                    "role": "student",
                }),
            ))
            .await
            .expect("register dispatch");
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        login(router, email).await
    }
}

mod reminders {
    use axum::http::StatusCode;
    use chrono::Duration;
    use serde_json::json;
    use tower::ServiceExt;

    use super::common::*;

    #[tokio::test]
    async fn the_sweep_notifies_once_per_day_per_item() {
        let (router, postings, admin) = build_fixture().await;
        let student = signup_student(&router, "mara@example.com").await;
        postings.seed(posting(
            "post-700001",
            "Data Intern",
            today() + Duration::days(2),
        ));

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist",
                &student,
                Some(json!({ "posting": "post-700001", "remind_days_before": 3 })),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let saved = read_json(response).await;
        assert_eq!(saved["outlook"]["state"], "approaching");
        assert_eq!(saved["outlook"]["days_left"], 2);

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist/reminders/run",
                &admin,
                None,
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["sent"], 1);

        let response = router
            .clone()
            .oneshot(authed_request(
                "GET",
                "/api/v1/notifications",
                &student,
                None,
            ))
            .await
            .expect("dispatch");
        let inbox = read_json(response).await;
        assert_eq!(inbox["items"][0]["kind"], "wishlist_deadline");
        assert_eq!(
            inbox["items"][0]["message"],
            "Data Intern closes for applications in 2 days"
        );

        // Same day, nothing new to send.
        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist/reminders/run",
                &admin,
                None,
            ))
            .await
            .expect("dispatch");
        assert_eq!(read_json(response).await["sent"], 0);
    }

    #[tokio::test]
    async fn the_sweep_is_admin_only_and_skips_quiet_items() {
        let (router, postings, admin) = build_fixture().await;
        let student = signup_student(&router, "mara@example.com").await;
        postings.seed(posting(
            "post-700001",
            "Data Intern",
            today() + Duration::days(2),
        ));
        // Saved without a reminder window, so the sweep leaves it alone.
        router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist",
                &student,
                Some(json!({ "posting": "post-700001" })),
            ))
            .await
            .expect("dispatch");

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist/reminders/run",
                &student,
                None,
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist/reminders/run",
                &admin,
                None,
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["sent"], 0);
    }

    #[tokio::test]
    async fn saving_twice_conflicts_and_the_listing_shows_the_posting_state() {
        let (router, postings, _admin) = build_fixture().await;
        let student = signup_student(&router, "mara@example.com").await;
        postings.seed(posting(
            "post-700001",
            "Data Intern",
            today() + Duration::days(20),
        ));

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist",
                &student,
                Some(json!({ "posting": "post-700001", "priority": "high" })),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CREATED);
        let item_id = read_json(response).await["id"]
            .as_str()
            .expect("id")
            .to_string();

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/api/v1/wishlist",
                &student,
                Some(json!({ "posting": "post-700001" })),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/api/v1/wishlist", &student, None))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let items = read_json(response).await;
        assert_eq!(items.as_array().expect("array").len(), 1);
        assert_eq!(items[0]["priority"], "high");
        assert_eq!(items[0]["posting_title"], "Data Intern");
        assert_eq!(items[0]["outlook"]["state"], "no_deadline_pressure");

        let response = router
            .clone()
            .oneshot(authed_request(
                "PATCH",
                &format!("/api/v1/wishlist/{item_id}"),
                &student,
                Some(json!({ "priority": "low", "note": "backup option" })),
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let updated = read_json(response).await;
        assert_eq!(updated["priority"], "low");
        assert_eq!(updated["note"], "backup option");

        let response = router
            .clone()
            .oneshot(authed_request(
                "DELETE",
                &format!("/api/v1/wishlist/{item_id}"),
                &student,
                None,
            ))
            .await
            .expect("dispatch");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/api/v1/wishlist", &student, None))
            .await
            .expect("dispatch");
        let items = read_json(response).await;
        assert!(items.as_array().expect("array").is_empty());
    }
}
