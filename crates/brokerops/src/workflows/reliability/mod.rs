//! Broker reliability flags: accrual, progressive penalties, decay, and the
//! ops-facing reporting surface.

pub mod domain;
pub mod ledger;
pub mod report;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use domain::{
    BrokerAccount, BrokerFlag, BrokerPenalty, FlagId, FlagReceipt, FlagStatus,
};
pub use ledger::{FlagLedger, FlagPolicy, SECOND_FLAG_PENALTY_REASON};
pub use report::{BrokerFlagSheet, BrokerReliabilityRow, ReliabilityReporter, ReportError};
pub use repository::{AccountDirectory, FlagStore, RepositoryError};
pub use router::reliability_router;
