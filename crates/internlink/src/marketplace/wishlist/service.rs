use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use super::domain::{
    WishView, WishlistDraft, WishlistItem, WishlistItemId, WishlistUpdate,
};
use super::repository::WishlistRepository;
use crate::marketplace::accounts::{AuthenticatedUser, UserRole};
use crate::marketplace::notifications::{NotificationError, NotificationKind, Notifier};
use crate::marketplace::postings::repository::PostingRepository;
use crate::marketplace::postings::{Posting, PostingStatus};
use crate::marketplace::repository::RepositoryError;

static WISH_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_wishlist_item_id() -> WishlistItemId {
    let id = WISH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    WishlistItemId(format!("wish-{id:06}"))
}

/// Service keeping per-student wishlists and running the deadline
/// reminder sweep over them.
pub struct WishlistService<W, P, N> {
    wishlist: Arc<W>,
    postings: Arc<P>,
    notifier: Arc<N>,
}

impl<W, P, N> WishlistService<W, P, N>
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(wishlist: Arc<W>, postings: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            wishlist,
            postings,
            notifier,
        }
    }

    /// Save a posting to the calling student's wishlist. A posting can be
    /// saved once per student.
    pub fn add(
        &self,
        user: &AuthenticatedUser,
        draft: WishlistDraft,
        today: NaiveDate,
    ) -> Result<WishlistItem, WishlistError> {
        if user.role != UserRole::Student {
            return Err(WishlistError::Forbidden("only students keep a wishlist"));
        }
        let posting = self
            .postings
            .fetch(&draft.posting)?
            .ok_or(WishlistError::PostingNotFound)?;
        if self
            .wishlist
            .find_for_student(&user.id, &posting.id)?
            .is_some()
        {
            return Err(WishlistError::AlreadySaved);
        }

        let item = WishlistItem {
            id: next_wishlist_item_id(),
            student: user.id.clone(),
            posting: posting.id,
            priority: draft.priority,
            category: draft.category,
            note: draft.note.and_then(none_if_blank),
            remind_days_before: draft.remind_days_before,
            added_on: today,
            last_reminded_on: None,
        };
        let stored = self.wishlist.insert(item)?;
        Ok(stored)
    }

    /// Adjust priority, category, note or reminder window. Absent fields
    /// stay as they are; a blank note clears the stored one.
    pub fn update(
        &self,
        user: &AuthenticatedUser,
        id: &WishlistItemId,
        update: WishlistUpdate,
    ) -> Result<WishlistItem, WishlistError> {
        let mut item = self.owned_item(user, id)?;

        if let Some(priority) = update.priority {
            item.priority = priority;
        }
        if let Some(category) = update.category {
            item.category = category;
        }
        if let Some(note) = update.note {
            item.note = none_if_blank(note);
        }
        if let Some(days) = update.remind_days_before {
            item.remind_days_before = Some(days);
        }

        self.wishlist.update(item.clone())?;
        Ok(item)
    }

    pub fn remove(
        &self,
        user: &AuthenticatedUser,
        id: &WishlistItemId,
    ) -> Result<(), WishlistError> {
        let item = self.owned_item(user, id)?;
        self.wishlist.delete(&item.id)?;
        Ok(())
    }

    /// The student's wishlist joined with posting details, highest
    /// priority first and nearer deadlines ahead within a priority.
    pub fn list(
        &self,
        user: &AuthenticatedUser,
        today: NaiveDate,
    ) -> Result<Vec<WishView>, WishlistError> {
        let items = self.wishlist.for_student(&user.id)?;
        let mut joined = Vec::with_capacity(items.len());
        for item in items {
            // Items whose posting vanished are dropped from the listing.
            if let Some(posting) = self.postings.fetch(&item.posting)? {
                joined.push((item, posting));
            }
        }
        joined.sort_by(|(a, pa), (b, pb)| {
            a.priority
                .cmp(&b.priority)
                .then(pa.deadline.cmp(&pb.deadline))
        });
        Ok(joined
            .into_iter()
            .map(|(item, posting)| render(&item, &posting, today))
            .collect())
    }

    /// Join a single item with its posting, for add/update responses.
    pub fn render(
        &self,
        item: &WishlistItem,
        today: NaiveDate,
    ) -> Result<WishView, WishlistError> {
        let posting = self
            .postings
            .fetch(&item.posting)?
            .ok_or(WishlistError::PostingNotFound)?;
        Ok(render(item, &posting, today))
    }

    /// Items whose reminder window covers `today`: an explicit
    /// `remind_days_before`, a deadline that has not passed, an Open
    /// posting, and no reminder sent yet today.
    pub fn due_reminders(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<(WishlistItem, Posting)>, WishlistError> {
        let mut due = Vec::new();
        for item in self.wishlist.all()? {
            let Some(posting) = self.postings.fetch(&item.posting)? else {
                continue;
            };
            if posting.status != PostingStatus::Open {
                continue;
            }
            if item.reminder_due(posting.deadline, today) {
                due.push((item, posting));
            }
        }
        Ok(due)
    }

    /// Publish a `WishlistDeadline` notification for every due reminder
    /// and stamp the item so it stays quiet until tomorrow. Returns the
    /// number of reminders sent.
    pub fn run_reminder_sweep(
        &self,
        actor: &AuthenticatedUser,
        today: NaiveDate,
    ) -> Result<usize, WishlistError> {
        if actor.role != UserRole::Admin {
            return Err(WishlistError::Forbidden(
                "the reminder sweep is an admin task",
            ));
        }

        let due = self.due_reminders(today)?;
        let mut sent = 0;
        for (mut item, posting) in due {
            let days_left = (posting.deadline - today).num_days();
            let message = match days_left {
                0 => format!("{} closes for applications today", posting.title),
                1 => format!("{} closes for applications tomorrow", posting.title),
                n => format!("{} closes for applications in {n} days", posting.title),
            };
            self.notifier.notify(
                &item.student,
                NotificationKind::WishlistDeadline,
                message,
                Some(format!("/postings/{}", posting.id.0)),
            )?;
            item.last_reminded_on = Some(today);
            self.wishlist.update(item)?;
            sent += 1;
        }

        tracing::info!(sent, "wishlist reminder sweep finished");
        Ok(sent)
    }

    fn owned_item(
        &self,
        user: &AuthenticatedUser,
        id: &WishlistItemId,
    ) -> Result<WishlistItem, WishlistError> {
        self.wishlist
            .fetch(id)?
            .filter(|item| item.student == user.id)
            .ok_or(WishlistError::NotFound)
    }
}

fn render(item: &WishlistItem, posting: &Posting, today: NaiveDate) -> WishView {
    WishView {
        id: item.id.clone(),
        posting: posting.id.clone(),
        posting_title: posting.title.clone(),
        posting_status: posting.status.label(),
        deadline: posting.deadline,
        priority: item.priority.label(),
        category: item.category.label(),
        note: item.note.clone(),
        remind_days_before: item.remind_days_before,
        added_on: item.added_on,
        outlook: item.outlook(posting.deadline, today),
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

#[derive(Debug, thiserror::Error)]
pub enum WishlistError {
    #[error("wishlist item not found")]
    NotFound,
    #[error("posting not found")]
    PostingNotFound,
    #[error("posting is already on the wishlist")]
    AlreadySaved,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
