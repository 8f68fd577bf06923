//! Cancellation-incident intake and the time-bounded escalation state machine.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod sla;

#[cfg(test)]
mod tests;

pub use domain::{
    CancellationIncident, CancellationNotice, EmergencyClaim, IncidentId, IncidentStatus,
};
pub use repository::{IncidentStore, RepositoryError};
pub use router::incident_router;
pub use service::{IncidentDesk, IncidentDeskError, IncidentReceipt};
pub use sla::{sla_deadline, SlaPolicy};
