use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;

use super::domain::{
    DuplicateOutcome, DuplicateReviewTicket, ListingId, ListingStatus, NewListing,
    PropertyListing, ReviewDecision, TicketId, TicketStatus,
};
use super::repository::{ListingStore, RepositoryError, TicketStore};
use super::similarity::similarity_score;
use crate::workflows::events::{emit, EventPublisher, TrustEvent};
use crate::workflows::ids::ReviewerId;

/// Score thresholds steering the workflow: above `review_threshold` a pair is
/// a likely duplicate worth human review, above `auto_hide_threshold` it is
/// near-certain and hidden without waiting for the reviewer.
#[derive(Debug, Clone, Copy)]
pub struct DuplicatePolicy {
    pub review_threshold: f64,
    pub auto_hide_threshold: f64,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            review_threshold: 75.0,
            auto_hide_threshold: 95.0,
        }
    }
}

static LISTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TICKET_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_listing_id() -> ListingId {
    ListingId(LISTING_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_ticket_id() -> TicketId {
    TicketId(TICKET_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Service running duplicate detection on listing changes and applying
/// reviewer verdicts to the affected listing cluster.
pub struct DuplicateWorkflow<L, T, E> {
    listings: Arc<L>,
    tickets: Arc<T>,
    events: Arc<E>,
    policy: DuplicatePolicy,
}

/// Error raised by the duplicate workflow.
#[derive(Debug, thiserror::Error)]
pub enum DuplicateWorkflowError {
    #[error("listing city must not be blank")]
    MissingCity,
    #[error("ticket already resolved")]
    TicketAlreadyResolved,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl<L, T, E> DuplicateWorkflow<L, T, E>
where
    L: ListingStore + 'static,
    T: TicketStore + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(listings: Arc<L>, tickets: Arc<T>, events: Arc<E>, policy: DuplicatePolicy) -> Self {
        Self {
            listings,
            tickets,
            events,
            policy,
        }
    }

    /// Register a listing handed over by the listing subsystem and immediately
    /// run the duplicate check against its city.
    pub fn register_listing(
        &self,
        new: NewListing,
        now: NaiveDateTime,
    ) -> Result<(PropertyListing, DuplicateOutcome), DuplicateWorkflowError> {
        if new.city.trim().is_empty() {
            return Err(DuplicateWorkflowError::MissingCity);
        }

        let listing = PropertyListing {
            id: next_listing_id(),
            broker_id: new.broker_id,
            title: new.title,
            city: new.city,
            asset_type: new.asset_type,
            configuration: new.configuration,
            area_value: new.area_value,
            price: new.price,
            location_text: new.location_text,
            geo: new.geo,
            image_url: new.image_url,
            status: ListingStatus::Active,
            hidden_from_customers: false,
            duplicate_score: None,
            primary_listing_id: None,
            created_at: now,
            updated_at: now,
        };
        let stored = self.listings.insert(listing)?;
        let outcome = self.scan_listing(stored.id, now)?;
        let refreshed = self
            .listings
            .fetch(stored.id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok((refreshed, outcome))
    }

    /// Run the duplicate check for an existing listing, typically after the
    /// listing subsystem reports an update.
    pub fn scan_listing(
        &self,
        listing_id: ListingId,
        now: NaiveDateTime,
    ) -> Result<DuplicateOutcome, DuplicateWorkflowError> {
        let mut listing = self
            .listings
            .fetch(listing_id)?
            .ok_or(RepositoryError::NotFound)?;

        let candidates = self.listings.in_city(&listing.city, listing.id)?;
        let mut best: Option<(PropertyListing, f64)> = None;
        for candidate in candidates {
            if !candidate.status.competes_for_duplicates() {
                continue;
            }
            let score = similarity_score(&listing, &candidate);
            if best.as_ref().map_or(score > 0.0, |(_, b)| score > *b) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((matched, score)) if score > self.policy.review_threshold => {
                // The older record anchors the cluster; on a created_at tie the
                // matched candidate wins.
                let primary_id = if matched.created_at <= listing.created_at {
                    matched.id
                } else {
                    listing.id
                };
                let auto_hidden = score > self.policy.auto_hide_threshold;

                listing.status = ListingStatus::HiddenDuplicateReview;
                listing.hidden_from_customers = true;
                listing.duplicate_score = Some(score);
                listing.primary_listing_id = Some(primary_id);
                listing.updated_at = now;
                self.listings.update(listing.clone())?;

                let ticket = self.tickets.insert(DuplicateReviewTicket {
                    id: next_ticket_id(),
                    listing_id: listing.id,
                    matched_listing_id: matched.id,
                    similarity: score,
                    auto_hidden,
                    status: TicketStatus::Pending,
                    resolved_by: None,
                    decision: None,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                })?;

                emit(
                    self.events.as_ref(),
                    TrustEvent::DuplicateTicketCreated {
                        ticket_id: ticket.id,
                        listing_id: listing.id,
                        matched_listing_id: matched.id,
                        similarity: score,
                        auto_hidden,
                    },
                );

                Ok(DuplicateOutcome::QueuedForReview {
                    ticket_id: ticket.id,
                    matched_listing_id: matched.id,
                    similarity: score,
                    auto_hidden,
                })
            }
            best => {
                let best_score = best.map(|(_, score)| score);
                listing.status = ListingStatus::Active;
                listing.hidden_from_customers = false;
                listing.duplicate_score = None;
                listing.updated_at = now;
                self.listings.update(listing)?;
                Ok(DuplicateOutcome::Cleared { best_score })
            }
        }
    }

    /// Apply a reviewer verdict to a pending ticket; a ticket is resolved at
    /// most once, and a second attempt fails without touching state.
    pub fn resolve_ticket(
        &self,
        ticket_id: TicketId,
        resolver: ReviewerId,
        decision: ReviewDecision,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> Result<DuplicateReviewTicket, DuplicateWorkflowError> {
        let mut ticket = self
            .tickets
            .fetch(ticket_id)?
            .ok_or(RepositoryError::NotFound)?;
        if ticket.status != TicketStatus::Pending {
            return Err(DuplicateWorkflowError::TicketAlreadyResolved);
        }

        let mut listing = self
            .listings
            .fetch(ticket.listing_id)?
            .ok_or(RepositoryError::NotFound)?;

        ticket.status = TicketStatus::Resolved;
        ticket.resolved_by = Some(resolver);
        ticket.decision = Some(decision);
        ticket.notes = notes;
        ticket.updated_at = now;
        // Claim the ticket first; the conditional write loses gracefully if a
        // concurrent reviewer got there in between.
        self.tickets
            .update_if_pending(ticket.clone())
            .map_err(|err| match err {
                RepositoryError::Stale => DuplicateWorkflowError::TicketAlreadyResolved,
                other => DuplicateWorkflowError::Repository(other),
            })?;

        match decision {
            ReviewDecision::ApproveVisible => {
                listing.status = ListingStatus::Active;
                listing.hidden_from_customers = false;
            }
            ReviewDecision::MarkDuplicate => {
                listing.status = ListingStatus::DuplicateRejected;
                listing.hidden_from_customers = true;
            }
            ReviewDecision::KeepBackup => {
                listing.status = ListingStatus::Backup;
                listing.hidden_from_customers = true;
                listing.primary_listing_id = Some(ticket.matched_listing_id);
            }
        }
        listing.updated_at = now;
        self.listings.update(listing)?;

        Ok(ticket)
    }

    /// Tickets awaiting a reviewer verdict.
    pub fn pending_tickets(&self) -> Result<Vec<DuplicateReviewTicket>, DuplicateWorkflowError> {
        Ok(self.tickets.pending()?)
    }
}
