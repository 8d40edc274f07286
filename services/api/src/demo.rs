use chrono::{Duration, Local, NaiveDate};
use clap::Args;

use internlink::config::{SessionConfig, UploadConfig};
use internlink::error::AppError;
use internlink::marketplace::accounts::domain::{LoginRequest, RegistrationRequest};
use internlink::marketplace::accounts::{AuthenticatedUser, Authenticator, UserAccount, UserRole};
use internlink::marketplace::applications::{AdvanceRequest, ApplicationStatus, SubmissionRequest};
use internlink::marketplace::pagination::PageRequest;
use internlink::marketplace::postings::{FieldOfWork, PostingDraft, PostingFilter, PostingStatus};
use internlink::marketplace::wishlist::{
    DeadlineOutlook, WishCategory, WishPriority, WishlistDraft,
};

use crate::infra::Marketplace;

const DEMO_PASSWORD: &str = "quayside-gull-7";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Run the walkthrough as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the wishlist reminder sweep portion of the walkthrough.
    #[arg(long)]
    pub(crate) skip_sweep: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReminderArgs {
    /// Run the sweep as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Days between the sweep date and the seeded posting deadline.
    #[arg(long, default_value_t = 5)]
    pub(crate) deadline_days: i64,
    /// Reminder window saved on the seeded wishlist item.
    #[arg(long, default_value_t = 7)]
    pub(crate) window: u8,
}

/// Seeded end-to-end pass over the marketplace: accounts, the posting
/// catalog, an application walked up the review ladder, a wishlist reminder,
/// a posting close, and the admin counters. Everything runs in memory.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let market = demo_marketplace();

    println!("InternLink marketplace walkthrough ({today})");
    if let Err(fault) = walkthrough(&market, today, args.skip_sweep) {
        println!("walkthrough stopped early: {fault}");
    }
    Ok(())
}

/// Seed one reminder-bearing wishlist item and run the sweep for the given
/// date, twice, to show that an item reminds at most once per day.
pub(crate) fn run_reminder_demo(args: ReminderArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let deadline = today + Duration::days(args.deadline_days);
    let market = demo_marketplace();

    println!("Wishlist reminder sweep ({today}, posting deadline {deadline})");
    if let Err(fault) = reminder_run(&market, today, deadline, args.window) {
        println!("sweep stopped early: {fault}");
    }
    Ok(())
}

fn walkthrough(market: &Marketplace, today: NaiveDate, skip_sweep: bool) -> Result<(), String> {
    let applications = market.applications();
    let wishlist = market.wishlist();

    println!("\nAccounts");
    let company_account = register_company(
        market,
        "talent@meridianrobotics.example",
        "Meridian Robotics",
    )?;
    let mara_account = register_student(market, "mara@example.org", "Mara Lindqvist")?;
    let jonas_account = register_student(market, "jonas@example.org", "Jonas Berg")?;
    let admin_account = market
        .accounts
        .provision_admin("ops@internlink.example", "prairie-lantern-9")
        .map_err(fault)?;
    for account in [
        &company_account,
        &mara_account,
        &jonas_account,
        &admin_account,
    ] {
        println!(
            "- {} {} ({})",
            account.id.0,
            account.display_name,
            account.role.label()
        );
    }

    let (session, _) = market
        .accounts
        .login(LoginRequest {
            email: mara_account.email.clone(),
            password: DEMO_PASSWORD.to_string(),
        })
        .map_err(fault)?;
    let mara = market
        .accounts
        .authenticate(&session.token)
        .map_err(fault)?;
    println!(
        "- {} logged in; session expires {}",
        mara_account.email,
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    let company = actor(&company_account);
    let jonas = actor(&jonas_account);
    let admin = actor(&admin_account);

    println!("\nPostings");
    let backend = market
        .postings
        .create(
            &company,
            PostingDraft {
                title: "Backend Intern".to_string(),
                description: "Work on the fleet telemetry ingest service.".to_string(),
                location: "Des Moines, IA".to_string(),
                field: FieldOfWork::SoftwareEngineering,
                stipend: 2400,
                openings: 2,
                deadline: today + Duration::days(10),
                skills: vec!["rust".to_string(), "sql".to_string()],
            },
            today,
        )
        .map_err(fault)?;
    let data = market
        .postings
        .create(
            &company,
            PostingDraft {
                title: "Data Intern".to_string(),
                description: "Own the usage dashboards and the weekly metrics digest.".to_string(),
                location: "Remote".to_string(),
                field: FieldOfWork::DataScience,
                stipend: 1800,
                openings: 1,
                deadline: today + Duration::days(5),
                skills: vec!["python".to_string(), "sql".to_string()],
            },
            today,
        )
        .map_err(fault)?;
    let catalog = market
        .postings
        .search(
            PostingFilter {
                status: Some(PostingStatus::Open),
                ..PostingFilter::default()
            },
            PageRequest::default(),
        )
        .map_err(fault)?;
    for posting in &catalog.items {
        println!(
            "- {} {} | {} | {} | deadline {}",
            posting.id.0,
            posting.title,
            posting.location,
            posting.field.label(),
            posting.deadline
        );
    }

    println!("\nApplications");
    let mara_application = applications
        .submit(
            &mara,
            &backend.id,
            SubmissionRequest {
                cover_note: Some(
                    "I built the ingest pipeline for our robotics club's match data.".to_string(),
                ),
                resume: None,
            },
            today,
        )
        .map_err(fault)?;
    println!(
        "- {} applied to {} ({})",
        mara.display_name, backend.title, mara_application.id.0
    );

    let jonas_backend = applications
        .submit(&jonas, &backend.id, SubmissionRequest::default(), today)
        .map_err(fault)?;
    applications
        .withdraw(&jonas, &jonas_backend.id)
        .map_err(fault)?;
    println!(
        "- {} applied to {} and withdrew",
        jonas.display_name, backend.title
    );

    applications
        .submit(&jonas, &data.id, SubmissionRequest::default(), today)
        .map_err(fault)?;
    println!("- {} applied to {}", jonas.display_name, data.title);

    match applications.advance(
        &company,
        &mara_application.id,
        AdvanceRequest {
            status: ApplicationStatus::Accepted,
            note: None,
        },
    ) {
        Ok(_) => return Err("a pending application skipped the review ladder".to_string()),
        Err(err) => println!("- jumping straight to accepted is refused: {err}"),
    }

    for status in [
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
    ] {
        let note =
            matches!(status, ApplicationStatus::Accepted).then(|| "Welcome aboard".to_string());
        applications
            .advance(&company, &mara_application.id, AdvanceRequest { status, note })
            .map_err(fault)?;
    }
    let accepted = applications
        .get(&company, &mara_application.id)
        .map_err(fault)?;
    let ladder: Vec<&str> = accepted
        .history
        .iter()
        .map(|change| change.status.label())
        .collect();
    println!(
        "- review ladder for {}: {}",
        accepted.id.0,
        ladder.join(" -> ")
    );

    println!("\nWishlist");
    let saved = wishlist
        .add(
            &mara,
            WishlistDraft {
                posting: data.id.clone(),
                priority: WishPriority::High,
                category: WishCategory::DreamRole,
                note: Some("Ask about the metrics stack".to_string()),
                remind_days_before: Some(7),
            },
            today,
        )
        .map_err(fault)?;
    let view = wishlist.render(&saved, today).map_err(fault)?;
    println!(
        "- {} saved {} ({} / {}), {}",
        mara.display_name,
        view.posting_title,
        view.priority,
        view.category,
        outlook_line(view.outlook)
    );

    if !skip_sweep {
        println!("\nReminder sweep");
        let sent = wishlist.run_reminder_sweep(&admin, today).map_err(fault)?;
        println!("- {sent} reminder(s) sent");
        let repeat = wishlist.run_reminder_sweep(&admin, today).map_err(fault)?;
        println!("- repeat sweep on the same day sends {repeat}");
    }

    println!("\nClosing {}", data.title);
    market.postings.close(&company, &data.id).map_err(fault)?;
    println!("- undecided applicants were notified");

    println!("\nNotification feeds");
    for user in [&mara, &jonas, &company] {
        print_feed(market, user)?;
    }
    let cleared = market
        .notifications
        .mark_all_read(&mara.id)
        .map_err(fault)?;
    println!(
        "- {} marked {cleared} notification(s) read",
        mara.display_name
    );

    println!("\nMarketplace stats");
    let stats = market.admin().stats(&admin).map_err(fault)?;
    for role in &stats.users {
        println!(
            "- {} accounts: {} ({} active)",
            role.role, role.total, role.active
        );
    }
    println!(
        "- postings: {} open / {} closed",
        stats.postings.open, stats.postings.closed
    );
    for field in &stats.posting_fields {
        println!("- postings in {}: {}", field.field, field.total);
    }
    for status in &stats.applications {
        println!("- applications {}: {}", status.status, status.total);
    }
    println!(
        "- notifications: {} total, {} unread",
        stats.notifications.total, stats.notifications.unread
    );

    Ok(())
}

struct ReminderScene {
    admin: AuthenticatedUser,
    student: AuthenticatedUser,
}

fn seed_reminder_scene(
    market: &Marketplace,
    today: NaiveDate,
    deadline: NaiveDate,
    window: u8,
) -> Result<ReminderScene, String> {
    let company_account = register_company(market, "talent@fjordworks.example", "Fjordworks")?;
    let mara_account = register_student(market, "mara@example.org", "Mara Lindqvist")?;
    let jonas_account = register_student(market, "jonas@example.org", "Jonas Berg")?;
    let admin_account = market
        .accounts
        .provision_admin("ops@internlink.example", "prairie-lantern-9")
        .map_err(fault)?;

    let company = actor(&company_account);
    let mara = actor(&mara_account);
    let jonas = actor(&jonas_account);

    let posting = market
        .postings
        .create(
            &company,
            PostingDraft {
                title: "Data Intern".to_string(),
                description: "Own the usage dashboards and the weekly metrics digest.".to_string(),
                location: "Remote".to_string(),
                field: FieldOfWork::DataScience,
                stipend: 1800,
                openings: 1,
                deadline,
                skills: vec!["python".to_string(), "sql".to_string()],
            },
            today,
        )
        .map_err(fault)?;

    let wishlist = market.wishlist();
    wishlist
        .add(
            &mara,
            WishlistDraft {
                posting: posting.id.clone(),
                priority: WishPriority::High,
                category: WishCategory::StrongFit,
                note: None,
                remind_days_before: Some(window),
            },
            today,
        )
        .map_err(fault)?;
    // No reminder window, so this item never takes part in the sweep.
    wishlist
        .add(
            &jonas,
            WishlistDraft {
                posting: posting.id.clone(),
                priority: WishPriority::Low,
                category: WishCategory::Exploring,
                note: None,
                remind_days_before: None,
            },
            today,
        )
        .map_err(fault)?;

    Ok(ReminderScene {
        admin: actor(&admin_account),
        student: mara,
    })
}

fn reminder_run(
    market: &Marketplace,
    today: NaiveDate,
    deadline: NaiveDate,
    window: u8,
) -> Result<(), String> {
    let scene = seed_reminder_scene(market, today, deadline, window)?;
    let wishlist = market.wishlist();

    println!("\nDue items");
    let due = wishlist.due_reminders(today).map_err(fault)?;
    if due.is_empty() {
        println!("- none (deadline outside every reminder window)");
    }
    for (item, posting) in &due {
        println!(
            "- {} saved by {} | deadline {} | window {} day(s)",
            posting.title,
            item.student.0,
            posting.deadline,
            item.remind_days_before.unwrap_or(0)
        );
    }

    let sent = wishlist
        .run_reminder_sweep(&scene.admin, today)
        .map_err(fault)?;
    println!("\nSweep sent {sent} reminder(s)");
    let repeat = wishlist
        .run_reminder_sweep(&scene.admin, today)
        .map_err(fault)?;
    println!("Repeat sweep on the same day sent {repeat}");

    let unread = market
        .notifications
        .unread_count(&scene.student.id)
        .map_err(fault)?;
    println!(
        "{} now has {unread} unread notification(s)",
        scene.student.display_name
    );
    Ok(())
}

fn print_feed(market: &Marketplace, user: &AuthenticatedUser) -> Result<(), String> {
    let unread = market
        .notifications
        .unread_count(&user.id)
        .map_err(fault)?;
    let page = market
        .notifications
        .list_for(&user.id, PageRequest::default())
        .map_err(fault)?;
    println!("- {} ({unread} unread)", user.display_name);
    for notification in &page.items {
        println!("  - [{}] {}", notification.kind.label(), notification.message);
    }
    Ok(())
}

fn demo_marketplace() -> Marketplace {
    Marketplace::new(
        &SessionConfig { ttl_hours: 24 },
        &UploadConfig {
            dir: std::env::temp_dir().join("internlink-demo"),
            max_bytes: 5 * 1024 * 1024,
        },
    )
}

fn register_company(market: &Marketplace, email: &str, name: &str) -> Result<UserAccount, String> {
    market
        .accounts
        .register(RegistrationRequest {
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            display_name: name.to_string(),
            role: UserRole::Company,
            headline: None,
            bio: None,
            skills: Vec::new(),
            website: None,
        })
        .map_err(fault)
}

fn register_student(market: &Marketplace, email: &str, name: &str) -> Result<UserAccount, String> {
    market
        .accounts
        .register(RegistrationRequest {
            email: email.to_string(),
            password: DEMO_PASSWORD.to_string(),
            display_name: name.to_string(),
            role: UserRole::Student,
            headline: Some("Final-year CS student".to_string()),
            bio: None,
            skills: vec!["sql".to_string()],
            website: None,
        })
        .map_err(fault)
}

fn actor(account: &UserAccount) -> AuthenticatedUser {
    AuthenticatedUser {
        id: account.id.clone(),
        role: account.role,
        display_name: account.display_name.clone(),
    }
}

fn fault(err: impl std::fmt::Display) -> String {
    err.to_string()
}

fn outlook_line(outlook: DeadlineOutlook) -> String {
    match outlook {
        DeadlineOutlook::NoDeadlinePressure => "no deadline pressure".to_string(),
        DeadlineOutlook::Approaching { days_left } => {
            format!("deadline approaching in {days_left} day(s)")
        }
        DeadlineOutlook::DueToday => "deadline today".to_string(),
        DeadlineOutlook::Passed => "deadline passed".to_string(),
    }
}
