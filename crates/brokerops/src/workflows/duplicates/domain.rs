use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{BrokerId, ReviewerId};

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub u64);

/// Identifier wrapper for duplicate review tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketId(pub u64);

/// Geographic coordinates captured for a listing, when the broker pinned one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Customer-facing lifecycle of a listing.
///
/// The duplicate workflow is the only writer of `HiddenDuplicateReview`,
/// `DuplicateRejected`, and `Backup`; listings in any of those states always
/// carry a `primary_listing_id` and a `duplicate_score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Active,
    Sold,
    Withdrawn,
    HiddenDuplicateReview,
    DuplicateRejected,
    Backup,
}

impl ListingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Withdrawn => "withdrawn",
            ListingStatus::HiddenDuplicateReview => "hidden_duplicate_review",
            ListingStatus::DuplicateRejected => "duplicate_rejected",
            ListingStatus::Backup => "backup",
        }
    }

    /// Whether a listing in this state competes as a duplicate candidate.
    pub const fn competes_for_duplicates(self) -> bool {
        matches!(
            self,
            ListingStatus::Active
                | ListingStatus::Backup
                | ListingStatus::HiddenDuplicateReview
                | ListingStatus::Sold
        )
    }
}

/// A broker-owned property record as the listing subsystem hands it to us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyListing {
    pub id: ListingId,
    pub broker_id: BrokerId,
    pub title: String,
    pub city: String,
    pub asset_type: String,
    pub configuration: String,
    pub area_value: Option<f64>,
    pub price: Option<f64>,
    pub location_text: String,
    pub geo: Option<GeoPoint>,
    pub image_url: Option<String>,
    pub status: ListingStatus,
    pub hidden_from_customers: bool,
    pub duplicate_score: Option<f64>,
    pub primary_listing_id: Option<ListingId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Listing payload accepted from the listing subsystem before an id is assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub broker_id: BrokerId,
    pub title: String,
    pub city: String,
    pub asset_type: String,
    pub configuration: String,
    pub area_value: Option<f64>,
    pub price: Option<f64>,
    pub location_text: String,
    pub geo: Option<GeoPoint>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Pending,
    Resolved,
}

impl TicketStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
        }
    }
}

/// Reviewer verdict on a queued duplicate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    ApproveVisible,
    MarkDuplicate,
    KeepBackup,
}

impl ReviewDecision {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewDecision::ApproveVisible => "approve_visible",
            ReviewDecision::MarkDuplicate => "mark_duplicate",
            ReviewDecision::KeepBackup => "keep_backup",
        }
    }
}

/// Human review item created when a new listing scores above the review threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReviewTicket {
    pub id: TicketId,
    pub listing_id: ListingId,
    pub matched_listing_id: ListingId,
    pub similarity: f64,
    pub auto_hidden: bool,
    pub status: TicketStatus,
    pub resolved_by: Option<ReviewerId>,
    pub decision: Option<ReviewDecision>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Result of running the duplicate check for one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DuplicateOutcome {
    /// No candidate scored above the review threshold; the listing is live.
    Cleared { best_score: Option<f64> },
    /// The listing was hidden pending review against its best match.
    QueuedForReview {
        ticket_id: TicketId,
        matched_listing_id: ListingId,
        similarity: f64,
        auto_hidden: bool,
    },
}
