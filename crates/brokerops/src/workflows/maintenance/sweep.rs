use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use crate::workflows::events::EventPublisher;
use crate::workflows::incidents::{IncidentDesk, IncidentStore};
use crate::workflows::reliability::{AccountDirectory, FlagLedger, FlagStore};

/// Counts for one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub flags_decayed: usize,
    pub incidents_escalated: usize,
}

/// Periodic pass advancing the time-driven transitions: flag decay and
/// SLA-triggered escalation. Stateless and idempotent; every step is a
/// conditional update, so redundant or concurrent runs are safe.
pub struct MaintenanceSweep<I, F, A, E> {
    desk: Arc<IncidentDesk<I, F, A, E>>,
    ledger: Arc<FlagLedger<F, A, E>>,
}

impl<I, F, A, E> MaintenanceSweep<I, F, A, E>
where
    I: IncidentStore + 'static,
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(desk: Arc<IncidentDesk<I, F, A, E>>, ledger: Arc<FlagLedger<F, A, E>>) -> Self {
        Self { desk, ledger }
    }

    /// Run one pass. Failures on individual rows are logged and skipped
    /// rather than aborting the remainder of the pass.
    pub fn run(&self, now: NaiveDateTime) -> SweepReport {
        let mut report = SweepReport::default();

        match self.ledger.decay_due(now) {
            Ok(count) => report.flags_decayed = count,
            Err(err) => warn!(error = %err, "flag decay pass failed"),
        }

        match self.desk.due_for_escalation(now) {
            Ok(due) => {
                for incident in due {
                    let incident_id = incident.id;
                    match self.desk.escalate(incident, now) {
                        Ok(Some(_)) => report.incidents_escalated += 1,
                        // Another sweep claimed it between the read and the
                        // conditional write.
                        Ok(None) => {}
                        Err(err) => {
                            warn!(incident_id = incident_id.0, error = %err, "escalation failed")
                        }
                    }
                }
            }
            Err(err) => warn!(error = %err, "escalation scan failed"),
        }

        info!(
            flags_decayed = report.flags_decayed,
            incidents_escalated = report.incidents_escalated,
            "maintenance sweep complete"
        );
        report
    }
}
