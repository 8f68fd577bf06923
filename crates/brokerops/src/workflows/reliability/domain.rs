use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::workflows::ids::BrokerId;
use crate::workflows::incidents::IncidentId;

/// Identifier wrapper for reliability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagStatus {
    Active,
    Decayed,
}

impl FlagStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FlagStatus::Active => "active",
            FlagStatus::Decayed => "decayed",
        }
    }
}

/// One reliability strike against a broker.
///
/// `level` is the count of the broker's active flags at creation time plus
/// one, so it reflects a rolling window rather than all-time history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerFlag {
    pub id: FlagId,
    pub broker_id: BrokerId,
    pub incident_id: Option<IncidentId>,
    pub level: u32,
    pub reason: String,
    pub status: FlagStatus,
    pub created_at: NaiveDateTime,
    pub decays_at: NaiveDateTime,
}

/// Monthly incentive-block record consumed by the payroll collaborator.
/// Deduplicated on (broker, year, month, reason).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPenalty {
    pub broker_id: BrokerId,
    pub year: i32,
    pub month: u32,
    pub reason: String,
}

/// What the ledger hands back to the caller for notification purposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlagReceipt {
    pub level: u32,
    pub decays_at: NaiveDateTime,
}

/// Broker roster entry as the account store exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerAccount {
    pub id: BrokerId,
    pub name: String,
    pub city: String,
    pub active: bool,
}
