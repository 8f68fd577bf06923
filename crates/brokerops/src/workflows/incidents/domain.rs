use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{BrokerId, ReviewerId, SlotId, VisitId};

/// Identifier wrapper for cancellation incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(pub u64);

/// Escalation state machine for a broker cancellation of a booked visit.
///
/// `PendingRmReview` and `EscalatedToSrm` are the only non-terminal states;
/// every other variant carries exactly one `resolved_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentStatus {
    PendingRmReview,
    EscalatedToSrm,
    ApprovedEmergency,
    RejectedEmergency,
    RejectedNoEmergency,
    ApprovedBySrm,
    RejectedBySrm,
}

impl IncidentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            IncidentStatus::PendingRmReview => "pending_rm_review",
            IncidentStatus::EscalatedToSrm => "escalated_to_srm",
            IncidentStatus::ApprovedEmergency => "approved_emergency",
            IncidentStatus::RejectedEmergency => "rejected_emergency",
            IncidentStatus::RejectedNoEmergency => "rejected_no_emergency",
            IncidentStatus::ApprovedBySrm => "approved_by_srm",
            IncidentStatus::RejectedBySrm => "rejected_by_srm",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(
            self,
            IncidentStatus::PendingRmReview | IncidentStatus::EscalatedToSrm
        )
    }
}

/// Broker-supplied justification for cancelling inside the protection window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyClaim {
    pub reason: String,
    #[serde(default)]
    pub details: String,
}

/// Cancellation report handed over by the booking subsystem. The caller has
/// already determined whether the visit start fell inside the 24-hour
/// protection window and whether the slot was actually booked.
#[derive(Debug, Clone, Deserialize)]
pub struct CancellationNotice {
    pub visit_id: VisitId,
    pub slot_id: SlotId,
    pub broker_id: BrokerId,
    pub raised_at: NaiveDateTime,
    pub within_24h: bool,
    pub was_booked: bool,
    #[serde(default)]
    pub emergency: Option<EmergencyClaim>,
}

/// A tracked integrity incident for one high-risk cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationIncident {
    pub id: IncidentId,
    pub visit_id: VisitId,
    pub slot_id: SlotId,
    pub broker_id: BrokerId,
    pub raised_at: NaiveDateTime,
    pub within_24h: bool,
    pub was_booked: bool,
    pub emergency: Option<EmergencyClaim>,
    pub status: IncidentStatus,
    pub sla_due_at: Option<NaiveDateTime>,
    pub escalated_to_srm: bool,
    pub srm_due_at: Option<NaiveDateTime>,
    pub rm_id: Option<ReviewerId>,
    pub rm_note: Option<String>,
    pub srm_id: Option<ReviewerId>,
    pub srm_note: Option<String>,
    /// Customers bumped by a protected-window cancellation get 48 hours of
    /// priority rebooking.
    pub priority_rebook_until: Option<NaiveDateTime>,
    pub resolved_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}
