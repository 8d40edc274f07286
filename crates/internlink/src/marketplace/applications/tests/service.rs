use super::common::*;

use crate::marketplace::applications::domain::{
    AdvanceRequest, Application, ApplicationId, ApplicationStatus, SubmissionRequest,
};
use crate::marketplace::applications::{
    ApplicationError, ApplicationRepository, ApplicationService,
};
use crate::marketplace::notifications::NotificationKind;
use crate::marketplace::pagination::PageRequest;
use crate::marketplace::postings::{PostingId, PostingStatus};

#[test]
fn submit_stores_pending_application_and_notifies_company() {
    let (service, applications, postings, notifier) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let stored = service
        .submit(&student(), &posting.id, submission(), today())
        .expect("submission succeeds");

    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert_eq!(stored.student, student().id);
    assert_eq!(stored.history.len(), 1);
    assert_eq!(stored.history[0].status, ApplicationStatus::Pending);
    assert!(applications
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .is_some());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, company().id);
    assert_eq!(sent[0].1, NotificationKind::NewApplication);
    assert!(sent[0].2.contains("Mara Lindqvist"));
    assert!(sent[0].2.contains("Data Engineering Intern"));
    assert_eq!(
        sent[0].3.as_deref(),
        Some("/postings/post-000301/applications")
    );
}

#[test]
fn submit_rejects_companies_and_admins() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    for actor in [company(), admin()] {
        let error = service
            .submit(&actor, &posting.id, submission(), today())
            .expect_err("non-students cannot apply");
        assert!(matches!(error, ApplicationError::Forbidden(_)));
    }
}

#[test]
fn submit_rejects_duplicates_until_withdrawn() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let first = service
        .submit(&student(), &posting.id, submission(), today())
        .expect("first submission succeeds");

    let error = service
        .submit(&student(), &posting.id, submission(), today())
        .expect_err("second submission is rejected");
    assert!(matches!(error, ApplicationError::AlreadyApplied));

    service
        .withdraw(&student(), &first.id)
        .expect("withdrawal succeeds");

    service
        .submit(&student(), &posting.id, submission(), today())
        .expect("reapplying after withdrawal succeeds");
}

#[test]
fn submit_rejects_closed_postings_and_passed_deadlines() {
    let (service, _, postings, _) = build_service();

    let mut closed = open_posting();
    closed.id = PostingId("post-000311".to_string());
    closed.status = PostingStatus::Closed;
    postings.seed(closed.clone());

    let error = service
        .submit(&student(), &closed.id, submission(), today())
        .expect_err("closed posting rejects applications");
    assert!(matches!(error, ApplicationError::PostingClosed));

    let mut expired = open_posting();
    expired.id = PostingId("post-000312".to_string());
    expired.deadline = today().pred_opt().expect("valid date");
    postings.seed(expired.clone());

    let error = service
        .submit(&student(), &expired.id, submission(), today())
        .expect_err("past deadline rejects applications");
    assert!(matches!(error, ApplicationError::DeadlinePassed));
}

#[test]
fn submit_drops_blank_cover_notes() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let stored = service
        .submit(
            &student(),
            &posting.id,
            SubmissionRequest {
                cover_note: Some("   ".to_string()),
                resume: None,
            },
            today(),
        )
        .expect("submission succeeds");

    assert_eq!(stored.cover_note, None);
}

#[test]
fn withdraw_removes_record_and_notifies_company() {
    let (service, applications, postings, notifier) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let stored = service
        .submit(&student(), &posting.id, submission(), today())
        .expect("submission succeeds");
    service
        .withdraw(&student(), &stored.id)
        .expect("withdrawal succeeds");

    assert!(applications
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .is_none());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, company().id);
    assert_eq!(sent[1].1, NotificationKind::ApplicationWithdrawn);
}

#[test]
fn withdraw_rejects_other_students_and_decided_applications() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let stored = service
        .submit(&student(), &posting.id, submission(), today())
        .expect("submission succeeds");

    let error = service
        .withdraw(&second_student(), &stored.id)
        .expect_err("someone else's application looks missing");
    assert!(matches!(error, ApplicationError::NotFound));

    let reviewing = advance_to(&service, &stored.id, ApplicationStatus::Reviewing);
    let rejected = advance_to(&service, &reviewing.id, ApplicationStatus::Rejected);

    let error = service
        .withdraw(&student(), &rejected.id)
        .expect_err("decided applications cannot be withdrawn");
    assert!(matches!(error, ApplicationError::AlreadyDecided));
}

#[test]
fn get_is_limited_to_applicant_company_and_admin() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let stored = service
        .submit(&student(), &posting.id, submission(), today())
        .expect("submission succeeds");

    for actor in [student(), company(), admin()] {
        service
            .get(&actor, &stored.id)
            .expect("authorized actor sees the application");
    }

    for actor in [second_student(), rival_company()] {
        let error = service
            .get(&actor, &stored.id)
            .expect_err("outsiders see nothing");
        assert!(matches!(error, ApplicationError::NotFound));
    }
}

#[test]
fn posting_listing_requires_the_owning_company() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    service
        .submit(&student(), &posting.id, submission(), today())
        .expect("submission succeeds");

    let page = service
        .for_posting(&company(), &posting.id, PageRequest::new(None, None))
        .expect("owner lists applications");
    assert_eq!(page.total, 1);

    let page = service
        .for_posting(&admin(), &posting.id, PageRequest::new(None, None))
        .expect("admin lists applications");
    assert_eq!(page.total, 1);

    let error = service
        .for_posting(&rival_company(), &posting.id, PageRequest::new(None, None))
        .expect_err("other companies are rejected");
    assert!(matches!(error, ApplicationError::Forbidden(_)));
}

#[test]
fn student_listing_pages_newest_first() {
    let (service, _, postings, _) = build_service();
    let first = open_posting();
    postings.seed(first.clone());
    let mut second = open_posting();
    second.id = PostingId("post-000302".to_string());
    second.title = "Platform Intern".to_string();
    postings.seed(second.clone());

    let early = service
        .submit(&student(), &first.id, submission(), today())
        .expect("first submission succeeds");
    let late = service
        .submit(&student(), &second.id, submission(), today())
        .expect("second submission succeeds");

    let page = service
        .for_student(&student(), PageRequest::new(None, None))
        .expect("listing succeeds");
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, late.id);
    assert_eq!(page.items[1].id, early.id);
}

#[test]
fn render_joins_the_posting_title() {
    let (service, _, postings, _) = build_service();
    let posting = open_posting();
    postings.seed(posting.clone());

    let stored = service
        .submit(&student(), &posting.id, submission(), today())
        .expect("submission succeeds");
    let view = service.render(&stored).expect("render succeeds");

    assert_eq!(view.posting_title, posting.title);
    assert_eq!(view.status, "pending");
}

fn advance_to(
    service: &ApplicationService<MemoryApplications, MemoryPostings, RecordingNotifier>,
    id: &ApplicationId,
    status: ApplicationStatus,
) -> Application {
    service
        .advance(&company(), id, AdvanceRequest { status, note: None })
        .expect("advance succeeds")
}
