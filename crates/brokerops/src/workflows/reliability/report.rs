use std::sync::Arc;

use super::domain::{BrokerFlag, BrokerPenalty, FlagStatus};
use super::ledger::FlagLedger;
use super::repository::{AccountDirectory, FlagStore, RepositoryError};
use crate::workflows::events::EventPublisher;
use crate::workflows::ids::BrokerId;
use crate::workflows::incidents::{IncidentStore, RepositoryError as IncidentRepositoryError};
use serde::Serialize;

/// One roster row of the broker reliability report consumed by ops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokerReliabilityRow {
    pub broker_id: BrokerId,
    pub broker_name: String,
    pub city: String,
    pub active: bool,
    pub late_cancel_incidents: usize,
    pub open_reviews: usize,
    pub active_flags: usize,
    pub penalties: usize,
}

/// Flags and penalties for a single broker, for the flags endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerFlagSheet {
    pub broker_id: BrokerId,
    pub flags: Vec<BrokerFlag>,
    pub penalties: Vec<BrokerPenalty>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Ledger(#[from] RepositoryError),
    #[error("incident lookup failure: {0}")]
    Incidents(#[from] IncidentRepositoryError),
    #[error("csv rendering failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer failure: {0}")]
    Buffer(#[from] std::io::Error),
}

/// Read-side companion to the ledger: per-broker views and the roster report.
pub struct ReliabilityReporter<F, A, E, I> {
    ledger: Arc<FlagLedger<F, A, E>>,
    accounts: Arc<A>,
    incidents: Arc<I>,
}

impl<F, A, E, I> ReliabilityReporter<F, A, E, I>
where
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
    I: IncidentStore + 'static,
{
    pub fn new(ledger: Arc<FlagLedger<F, A, E>>, accounts: Arc<A>, incidents: Arc<I>) -> Self {
        Self {
            ledger,
            accounts,
            incidents,
        }
    }

    pub fn flag_sheet(&self, broker_id: BrokerId) -> Result<BrokerFlagSheet, ReportError> {
        Ok(BrokerFlagSheet {
            broker_id,
            flags: self.ledger.flags_for(broker_id)?,
            penalties: self.ledger.penalties_for(broker_id)?,
        })
    }

    /// Roster-wide reliability snapshot. Every stored incident is by
    /// construction a within-24h booked cancellation, so the raw count is the
    /// late-cancel figure.
    pub fn broker_report(&self) -> Result<Vec<BrokerReliabilityRow>, ReportError> {
        let mut rows = Vec::new();
        for account in self.accounts.brokers()? {
            let incidents = self.incidents.for_broker(account.id)?;
            let open_reviews = incidents
                .iter()
                .filter(|incident| !incident.status.is_terminal())
                .count();
            let flags = self.ledger.flags_for(account.id)?;
            let active_flags = flags
                .iter()
                .filter(|flag| flag.status == FlagStatus::Active)
                .count();
            let penalties = self.ledger.penalties_for(account.id)?.len();

            rows.push(BrokerReliabilityRow {
                broker_id: account.id,
                broker_name: account.name,
                city: account.city,
                active: account.active,
                late_cancel_incidents: incidents.len(),
                open_reviews,
                active_flags,
                penalties,
            });
        }
        rows.sort_by(|a, b| a.broker_name.cmp(&b.broker_name));
        Ok(rows)
    }

    pub fn broker_report_csv(&self) -> Result<String, ReportError> {
        let rows = self.broker_report()?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "broker_id",
            "broker_name",
            "city",
            "active",
            "late_cancel_incidents",
            "open_reviews",
            "active_flags",
            "penalties",
        ])?;
        for row in &rows {
            writer.write_record([
                row.broker_id.0.to_string(),
                row.broker_name.clone(),
                row.city.clone(),
                row.active.to_string(),
                row.late_cancel_incidents.to_string(),
                row.open_reviews.to_string(),
                row.active_flags.to_string(),
                row.penalties.to_string(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| ReportError::Buffer(err.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
