use chrono::NaiveDateTime;

use super::domain::{CancellationIncident, IncidentId, IncidentStatus};
use crate::workflows::ids::BrokerId;

/// Error enumeration for incident storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record no longer in the expected state")]
    Stale,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over the incident table.
pub trait IncidentStore: Send + Sync {
    fn insert(&self, incident: CancellationIncident)
        -> Result<CancellationIncident, RepositoryError>;
    fn fetch(&self, id: IncidentId) -> Result<Option<CancellationIncident>, RepositoryError>;
    /// Conditional write keyed on the stored status, so each decision step
    /// transitions an incident at most once under concurrency.
    fn update_from(
        &self,
        incident: CancellationIncident,
        expected: IncidentStatus,
    ) -> Result<(), RepositoryError>;
    fn with_status(
        &self,
        status: IncidentStatus,
    ) -> Result<Vec<CancellationIncident>, RepositoryError>;
    /// Pending, not-yet-escalated incidents whose RM deadline has passed.
    fn due_for_escalation(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<CancellationIncident>, RepositoryError>;
    fn for_broker(&self, broker_id: BrokerId)
        -> Result<Vec<CancellationIncident>, RepositoryError>;
}
