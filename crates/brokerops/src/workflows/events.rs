//! Outbound notification seam for messaging and reporting collaborators.
//!
//! Events are advisory: the owning operation commits regardless of whether
//! delivery succeeds, and failures are logged rather than propagated.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::workflows::duplicates::{ListingId, TicketId};
use crate::workflows::ids::BrokerId;
use crate::workflows::incidents::{IncidentId, IncidentStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TrustEvent {
    DuplicateTicketCreated {
        ticket_id: TicketId,
        listing_id: ListingId,
        matched_listing_id: ListingId,
        similarity: f64,
        auto_hidden: bool,
    },
    IncidentResolved {
        incident_id: IncidentId,
        broker_id: BrokerId,
        status: IncidentStatus,
    },
    IncidentEscalated {
        incident_id: IncidentId,
        broker_id: BrokerId,
        srm_due_at: NaiveDateTime,
    },
    FlagApplied {
        broker_id: BrokerId,
        incident_id: Option<IncidentId>,
        level: u32,
        decays_at: NaiveDateTime,
    },
    BrokerDeactivated {
        broker_id: BrokerId,
        level: u32,
    },
}

/// Trait describing outbound event hooks (e.g., WhatsApp or reporting adapters).
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: TrustEvent) -> Result<(), EventError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Fire-and-forget dispatch; a failed hand-off never fails the caller.
pub(crate) fn emit<E: EventPublisher + ?Sized>(events: &E, event: TrustEvent) {
    if let Err(err) = events.publish(event) {
        tracing::warn!(error = %err, "dropped trust event");
    }
}
