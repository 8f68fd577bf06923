use chrono::NaiveDateTime;

use super::domain::{BrokerAccount, BrokerFlag, BrokerPenalty};
use crate::workflows::ids::BrokerId;

/// Error enumeration for flag-ledger storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over broker flags and penalty records.
pub trait FlagStore: Send + Sync {
    fn insert(&self, flag: BrokerFlag) -> Result<BrokerFlag, RepositoryError>;
    /// Mark every active flag whose decay time has passed; returns how many
    /// flags were decayed. Conditional on current status, so re-runs are
    /// no-ops for already-decayed rows.
    fn decay_due(&self, now: NaiveDateTime) -> Result<usize, RepositoryError>;
    fn active_count(&self, broker_id: BrokerId) -> Result<usize, RepositoryError>;
    fn flags_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerFlag>, RepositoryError>;
    /// Insert deduplicated on (broker, year, month, reason); returns false
    /// when an equal record already existed.
    fn record_penalty(&self, penalty: BrokerPenalty) -> Result<bool, RepositoryError>;
    fn penalties_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerPenalty>, RepositoryError>;
}

/// Narrow view of the account/user store: roster reads plus the one write the
/// ledger needs. Reactivation is a manual operation elsewhere.
pub trait AccountDirectory: Send + Sync {
    fn brokers(&self) -> Result<Vec<BrokerAccount>, RepositoryError>;
    fn deactivate(&self, broker_id: BrokerId) -> Result<(), RepositoryError>;
}
