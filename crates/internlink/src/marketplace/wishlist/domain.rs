use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::marketplace::accounts::UserId;
use crate::marketplace::postings::PostingId;

/// Identifier for a wishlist entry, e.g. `wish-000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WishlistItemId(pub String);

impl std::fmt::Display for WishlistItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priorities sort `High` before `Medium` before `Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum WishPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl WishPriority {
    pub const fn label(self) -> &'static str {
        match self {
            WishPriority::High => "high",
            WishPriority::Medium => "medium",
            WishPriority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WishCategory {
    DreamRole,
    StrongFit,
    Backup,
    #[default]
    Exploring,
}

impl WishCategory {
    pub const fn label(self) -> &'static str {
        match self {
            WishCategory::DreamRole => "dream_role",
            WishCategory::StrongFit => "strong_fit",
            WishCategory::Backup => "backup",
            WishCategory::Exploring => "exploring",
        }
    }
}

/// A posting a student is keeping an eye on. `remind_days_before` opts the
/// item into the reminder sweep; without it the item never produces a
/// notification, though the listing still reports deadline pressure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub student: UserId,
    pub posting: PostingId,
    pub priority: WishPriority,
    pub category: WishCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remind_days_before: Option<u8>,
    pub added_on: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reminded_on: Option<NaiveDate>,
}

impl WishlistItem {
    /// How the posting deadline looks from `today`. The window that counts
    /// as "approaching" is the item's reminder setting, defaulting to a
    /// week for items without one.
    pub fn outlook(&self, deadline: NaiveDate, today: NaiveDate) -> DeadlineOutlook {
        if deadline < today {
            return DeadlineOutlook::Passed;
        }
        if deadline == today {
            return DeadlineOutlook::DueToday;
        }
        let days_left = (deadline - today).num_days();
        let window = i64::from(self.remind_days_before.unwrap_or(7));
        if days_left <= window {
            DeadlineOutlook::Approaching { days_left }
        } else {
            DeadlineOutlook::NoDeadlinePressure
        }
    }

    /// Whether the reminder sweep should fire for this item today. Only
    /// items with an explicit `remind_days_before` take part, at most once
    /// per day, and never after the deadline.
    pub fn reminder_due(&self, deadline: NaiveDate, today: NaiveDate) -> bool {
        let Some(window) = self.remind_days_before else {
            return false;
        };
        if today > deadline || self.last_reminded_on == Some(today) {
            return false;
        }
        (deadline - today).num_days() <= i64::from(window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DeadlineOutlook {
    NoDeadlinePressure,
    Approaching { days_left: i64 },
    DueToday,
    Passed,
}

/// Body of `POST /wishlist`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistDraft {
    pub posting: PostingId,
    #[serde(default)]
    pub priority: WishPriority,
    #[serde(default)]
    pub category: WishCategory,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub remind_days_before: Option<u8>,
}

/// Body of `PATCH /wishlist/:id`. Absent fields stay unchanged; a blank
/// note clears the stored one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WishlistUpdate {
    #[serde(default)]
    pub priority: Option<WishPriority>,
    #[serde(default)]
    pub category: Option<WishCategory>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub remind_days_before: Option<u8>,
}

/// Wishlist entry joined with the posting it points at.
#[derive(Debug, Clone, Serialize)]
pub struct WishView {
    pub id: WishlistItemId,
    pub posting: PostingId,
    pub posting_title: String,
    pub posting_status: &'static str,
    pub deadline: NaiveDate,
    pub priority: &'static str,
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remind_days_before: Option<u8>,
    pub added_on: NaiveDate,
    pub outlook: DeadlineOutlook,
}
