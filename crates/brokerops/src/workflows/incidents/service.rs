use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use super::domain::{
    CancellationIncident, CancellationNotice, IncidentId, IncidentStatus,
};
use super::repository::{IncidentStore, RepositoryError};
use super::sla::{sla_deadline, SlaPolicy};
use crate::workflows::events::{emit, EventPublisher, TrustEvent};
use crate::workflows::ids::ReviewerId;
use crate::workflows::reliability::{
    AccountDirectory, FlagLedger, FlagReceipt, FlagStore,
    RepositoryError as LedgerRepositoryError,
};

const PRIORITY_REBOOK_HOURS: i64 = 48;

const REASON_NO_EMERGENCY: &str =
    "Booked visit cancelled within 24h without emergency approval";
const REASON_RM_REJECTED: &str = "Emergency cancellation rejected by RM";
const REASON_SRM_REJECTED: &str = "Emergency cancellation rejected by SRM";

static INCIDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_incident_id() -> IncidentId {
    IncidentId(INCIDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// What a cancellation report produced: the incident (if one was warranted)
/// and the flag receipt when the cancellation was penalized on the spot.
#[derive(Debug, Clone)]
pub struct IncidentReceipt {
    pub incident: CancellationIncident,
    pub flag: Option<FlagReceipt>,
}

/// Error raised by the incident desk.
#[derive(Debug, thiserror::Error)]
pub enum IncidentDeskError {
    #[error("an emergency claim requires a reason")]
    EmptyEmergencyReason,
    #[error("incident is not awaiting {expected} review")]
    StaleState { expected: &'static str },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("flag ledger failure: {0}")]
    Ledger(#[from] LedgerRepositoryError),
}

/// Tracks broker cancellations of booked visits through RM review, SLA-driven
/// escalation, and SRM resolution.
pub struct IncidentDesk<I, F, A, E> {
    incidents: Arc<I>,
    ledger: Arc<FlagLedger<F, A, E>>,
    events: Arc<E>,
    sla: SlaPolicy,
}

impl<I, F, A, E> IncidentDesk<I, F, A, E>
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(
        incidents: Arc<I>,
        ledger: Arc<FlagLedger<F, A, E>>,
        events: Arc<E>,
        sla: SlaPolicy,
    ) -> Self {
        Self {
            incidents,
            ledger,
            events,
            sla,
        }
    }

    /// Intake for broker cancellations reported by the booking subsystem.
    ///
    /// A cancellation outside the protection window, or of an unbooked slot,
    /// carries no integrity risk and produces no incident. Inside the window
    /// a missing emergency claim is rejected outright with an immediate flag;
    /// a claim opens an RM review with an SLA deadline.
    pub fn report_cancellation(
        &self,
        notice: CancellationNotice,
    ) -> Result<Option<IncidentReceipt>, IncidentDeskError> {
        if !notice.within_24h || !notice.was_booked {
            return Ok(None);
        }
        if let Some(claim) = &notice.emergency {
            if claim.reason.trim().is_empty() {
                return Err(IncidentDeskError::EmptyEmergencyReason);
            }
        }

        let raised_at = notice.raised_at;
        let (status, sla_due_at, resolved_at) = match notice.emergency {
            Some(_) => (
                IncidentStatus::PendingRmReview,
                Some(sla_deadline(raised_at, self.sla.cutoff_hour)),
                None,
            ),
            None => (IncidentStatus::RejectedNoEmergency, None, Some(raised_at)),
        };

        let incident = self.incidents.insert(CancellationIncident {
            id: next_incident_id(),
            visit_id: notice.visit_id,
            slot_id: notice.slot_id,
            broker_id: notice.broker_id,
            raised_at,
            within_24h: notice.within_24h,
            was_booked: notice.was_booked,
            emergency: notice.emergency,
            status,
            sla_due_at,
            escalated_to_srm: false,
            srm_due_at: None,
            rm_id: None,
            rm_note: None,
            srm_id: None,
            srm_note: None,
            priority_rebook_until: Some(raised_at + Duration::hours(PRIORITY_REBOOK_HOURS)),
            resolved_at,
            updated_at: raised_at,
        })?;

        let flag = if incident.status == IncidentStatus::RejectedNoEmergency {
            let receipt = self.ledger.apply_flag(
                incident.broker_id,
                Some(incident.id),
                REASON_NO_EMERGENCY,
                raised_at,
            )?;
            emit(
                self.events.as_ref(),
                TrustEvent::IncidentResolved {
                    incident_id: incident.id,
                    broker_id: incident.broker_id,
                    status: incident.status,
                },
            );
            Some(receipt)
        } else {
            None
        };

        Ok(Some(IncidentReceipt { incident, flag }))
    }

    /// RM verdict on a pending incident that has not escalated yet.
    pub fn review_by_rm(
        &self,
        incident_id: IncidentId,
        reviewer: ReviewerId,
        approve: bool,
        note: Option<String>,
        now: NaiveDateTime,
    ) -> Result<IncidentReceipt, IncidentDeskError> {
        let mut incident = self
            .incidents
            .fetch(incident_id)?
            .ok_or(RepositoryError::NotFound)?;
        if incident.status != IncidentStatus::PendingRmReview || incident.escalated_to_srm {
            return Err(IncidentDeskError::StaleState { expected: "RM" });
        }

        incident.status = if approve {
            IncidentStatus::ApprovedEmergency
        } else {
            IncidentStatus::RejectedEmergency
        };
        incident.rm_id = Some(reviewer);
        incident.rm_note = note;
        incident.resolved_at = Some(now);
        incident.updated_at = now;
        self.transition(&incident, IncidentStatus::PendingRmReview, "RM")?;

        let flag = if incident.status == IncidentStatus::RejectedEmergency {
            Some(self.ledger.apply_flag(
                incident.broker_id,
                Some(incident.id),
                REASON_RM_REJECTED,
                now,
            )?)
        } else {
            None
        };
        Ok(IncidentReceipt { incident, flag })
    }

    /// SRM verdict on an escalated incident.
    pub fn review_by_srm(
        &self,
        incident_id: IncidentId,
        reviewer: ReviewerId,
        approve: bool,
        note: Option<String>,
        now: NaiveDateTime,
    ) -> Result<IncidentReceipt, IncidentDeskError> {
        let mut incident = self
            .incidents
            .fetch(incident_id)?
            .ok_or(RepositoryError::NotFound)?;
        if incident.status != IncidentStatus::EscalatedToSrm {
            return Err(IncidentDeskError::StaleState { expected: "SRM" });
        }

        incident.status = if approve {
            IncidentStatus::ApprovedBySrm
        } else {
            IncidentStatus::RejectedBySrm
        };
        incident.srm_id = Some(reviewer);
        incident.srm_note = note;
        incident.resolved_at = Some(now);
        incident.updated_at = now;
        self.transition(&incident, IncidentStatus::EscalatedToSrm, "SRM")?;

        let flag = if incident.status == IncidentStatus::RejectedBySrm {
            Some(self.ledger.apply_flag(
                incident.broker_id,
                Some(incident.id),
                REASON_SRM_REJECTED,
                now,
            )?)
        } else {
            None
        };
        Ok(IncidentReceipt { incident, flag })
    }

    /// Escalate one overdue pending incident. Returns the updated incident,
    /// or `None` when another sweep already claimed it.
    pub fn escalate(
        &self,
        incident: CancellationIncident,
        now: NaiveDateTime,
    ) -> Result<Option<CancellationIncident>, IncidentDeskError> {
        let srm_due_at = sla_deadline(now, self.sla.cutoff_hour);
        let mut incident = incident;
        incident.status = IncidentStatus::EscalatedToSrm;
        incident.escalated_to_srm = true;
        incident.srm_due_at = Some(srm_due_at);
        incident.updated_at = now;

        match self
            .incidents
            .update_from(incident.clone(), IncidentStatus::PendingRmReview)
        {
            Ok(()) => {
                emit(
                    self.events.as_ref(),
                    TrustEvent::IncidentEscalated {
                        incident_id: incident.id,
                        broker_id: incident.broker_id,
                        srm_due_at,
                    },
                );
                Ok(Some(incident))
            }
            Err(RepositoryError::Stale) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    pub fn due_for_escalation(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<CancellationIncident>, IncidentDeskError> {
        Ok(self.incidents.due_for_escalation(now)?)
    }

    /// Incidents awaiting an RM verdict.
    pub fn rm_queue(&self) -> Result<Vec<CancellationIncident>, IncidentDeskError> {
        Ok(self.incidents.with_status(IncidentStatus::PendingRmReview)?)
    }

    /// Incidents awaiting an SRM verdict.
    pub fn srm_queue(&self) -> Result<Vec<CancellationIncident>, IncidentDeskError> {
        Ok(self.incidents.with_status(IncidentStatus::EscalatedToSrm)?)
    }

    fn transition(
        &self,
        incident: &CancellationIncident,
        expected: IncidentStatus,
        step: &'static str,
    ) -> Result<(), IncidentDeskError> {
        self.incidents
            .update_from(incident.clone(), expected)
            .map_err(|err| match err {
                RepositoryError::Stale => IncidentDeskError::StaleState { expected: step },
                other => IncidentDeskError::Repository(other),
            })?;
        emit(
            self.events.as_ref(),
            TrustEvent::IncidentResolved {
                incident_id: incident.id,
                broker_id: incident.broker_id,
                status: incident.status,
            },
        );
        Ok(())
    }
}
