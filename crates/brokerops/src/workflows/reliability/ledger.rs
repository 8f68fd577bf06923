use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Duration, NaiveDateTime};

use super::domain::{BrokerFlag, BrokerPenalty, FlagId, FlagReceipt, FlagStatus};
use super::repository::{AccountDirectory, FlagStore, RepositoryError};
use crate::workflows::events::{emit, EventPublisher, TrustEvent};
use crate::workflows::ids::BrokerId;
use crate::workflows::incidents::IncidentId;

/// Fixed reason recorded on the monthly penalty row for a second flag.
pub const SECOND_FLAG_PENALTY_REASON: &str = "month_incentive_block_due_to_second_flag";

/// Thresholds and decay window for the reliability ledger.
#[derive(Debug, Clone, Copy)]
pub struct FlagPolicy {
    pub decay_days: i64,
    pub penalty_level: u32,
    pub deactivation_level: u32,
}

impl Default for FlagPolicy {
    fn default() -> Self {
        Self {
            decay_days: 90,
            penalty_level: 2,
            deactivation_level: 3,
        }
    }
}

static FLAG_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_flag_id() -> FlagId {
    FlagId(FLAG_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Accrues reliability flags, computes progressive penalties, and deactivates
/// brokers that cross the threshold.
pub struct FlagLedger<F, A, E> {
    flags: Arc<F>,
    accounts: Arc<A>,
    events: Arc<E>,
    policy: FlagPolicy,
    // Serializes the count-then-insert sequence; two concurrent applications
    // for one broker must not compute the same level.
    apply_guard: Mutex<()>,
}

impl<F, A, E> FlagLedger<F, A, E>
where
    F: FlagStore + 'static,
    A: AccountDirectory + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(flags: Arc<F>, accounts: Arc<A>, events: Arc<E>, policy: FlagPolicy) -> Self {
        Self {
            flags,
            accounts,
            events,
            policy,
            apply_guard: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> FlagPolicy {
        self.policy
    }

    /// Record one strike against a broker. Decays stale flags first so the
    /// level reflects the current active count, writes the monthly penalty on
    /// the second concurrent flag, and deactivates the account at the third.
    pub fn apply_flag(
        &self,
        broker_id: BrokerId,
        incident_id: Option<IncidentId>,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<FlagReceipt, RepositoryError> {
        let _guard = self.apply_guard.lock().expect("ledger mutex poisoned");

        self.flags.decay_due(now)?;
        let level = self.flags.active_count(broker_id)? as u32 + 1;
        let decays_at = now + Duration::days(self.policy.decay_days);

        self.flags.insert(BrokerFlag {
            id: next_flag_id(),
            broker_id,
            incident_id,
            level,
            reason: reason.to_string(),
            status: FlagStatus::Active,
            created_at: now,
            decays_at,
        })?;

        if level == self.policy.penalty_level {
            self.flags.record_penalty(BrokerPenalty {
                broker_id,
                year: now.year(),
                month: now.month(),
                reason: SECOND_FLAG_PENALTY_REASON.to_string(),
            })?;
        }

        if level >= self.policy.deactivation_level {
            self.accounts.deactivate(broker_id)?;
            emit(
                self.events.as_ref(),
                TrustEvent::BrokerDeactivated { broker_id, level },
            );
        }

        emit(
            self.events.as_ref(),
            TrustEvent::FlagApplied {
                broker_id,
                incident_id,
                level,
                decays_at,
            },
        );

        Ok(FlagReceipt { level, decays_at })
    }

    /// Decay pass used by the maintenance sweep.
    pub fn decay_due(&self, now: NaiveDateTime) -> Result<usize, RepositoryError> {
        self.flags.decay_due(now)
    }

    pub fn flags_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerFlag>, RepositoryError> {
        self.flags.flags_for(broker_id)
    }

    pub fn penalties_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerPenalty>, RepositoryError> {
        self.flags.penalties_for(broker_id)
    }
}
