use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::workflows::events::{EventError, EventPublisher, TrustEvent};
use crate::workflows::ids::BrokerId;
use crate::workflows::reliability::domain::{
    BrokerAccount, BrokerFlag, BrokerPenalty, FlagStatus,
};
use crate::workflows::reliability::ledger::{FlagLedger, FlagPolicy};
use crate::workflows::reliability::repository::{AccountDirectory, FlagStore, RepositoryError};

pub(super) fn dt(month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, month, day)
        .expect("valid date")
        .and_hms_opt(9, 30, 0)
        .expect("valid time")
}

pub(super) type TestLedger = FlagLedger<MemoryFlags, MemoryAccounts, MemoryEvents>;

pub(super) fn build_ledger() -> (
    Arc<TestLedger>,
    Arc<MemoryFlags>,
    Arc<MemoryAccounts>,
    Arc<MemoryEvents>,
) {
    let flags = Arc::new(MemoryFlags::default());
    let accounts = Arc::new(MemoryAccounts::with_roster());
    let events = Arc::new(MemoryEvents::default());
    let ledger = Arc::new(FlagLedger::new(
        flags.clone(),
        accounts.clone(),
        events.clone(),
        FlagPolicy::default(),
    ));
    (ledger, flags, accounts, events)
}

#[derive(Default, Clone)]
pub(super) struct MemoryFlags {
    flags: Arc<Mutex<Vec<BrokerFlag>>>,
    penalties: Arc<Mutex<Vec<BrokerPenalty>>>,
}

impl MemoryFlags {
    pub(super) fn all_flags(&self) -> Vec<BrokerFlag> {
        self.flags.lock().expect("flag mutex poisoned").clone()
    }
}

impl FlagStore for MemoryFlags {
    fn insert(&self, flag: BrokerFlag) -> Result<BrokerFlag, RepositoryError> {
        self.flags
            .lock()
            .expect("flag mutex poisoned")
            .push(flag.clone());
        Ok(flag)
    }

    fn decay_due(&self, now: NaiveDateTime) -> Result<usize, RepositoryError> {
        let mut guard = self.flags.lock().expect("flag mutex poisoned");
        let mut decayed = 0;
        for flag in guard.iter_mut() {
            if flag.status == FlagStatus::Active && flag.decays_at <= now {
                flag.status = FlagStatus::Decayed;
                decayed += 1;
            }
        }
        Ok(decayed)
    }

    fn active_count(&self, broker_id: BrokerId) -> Result<usize, RepositoryError> {
        let guard = self.flags.lock().expect("flag mutex poisoned");
        Ok(guard
            .iter()
            .filter(|flag| flag.broker_id == broker_id && flag.status == FlagStatus::Active)
            .count())
    }

    fn flags_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerFlag>, RepositoryError> {
        let guard = self.flags.lock().expect("flag mutex poisoned");
        Ok(guard
            .iter()
            .filter(|flag| flag.broker_id == broker_id)
            .cloned()
            .collect())
    }

    fn record_penalty(&self, penalty: BrokerPenalty) -> Result<bool, RepositoryError> {
        let mut guard = self.penalties.lock().expect("penalty mutex poisoned");
        if guard.contains(&penalty) {
            return Ok(false);
        }
        guard.push(penalty);
        Ok(true)
    }

    fn penalties_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerPenalty>, RepositoryError> {
        let guard = self.penalties.lock().expect("penalty mutex poisoned");
        Ok(guard
            .iter()
            .filter(|penalty| penalty.broker_id == broker_id)
            .cloned()
            .collect())
    }
}

#[derive(Clone)]
pub(super) struct MemoryAccounts {
    roster: Arc<Mutex<Vec<BrokerAccount>>>,
}

impl MemoryAccounts {
    pub(super) fn with_roster() -> Self {
        Self {
            roster: Arc::new(Mutex::new(vec![
                BrokerAccount {
                    id: BrokerId(1),
                    name: "Asha Kulkarni".to_string(),
                    city: "Pune".to_string(),
                    active: true,
                },
                BrokerAccount {
                    id: BrokerId(2),
                    name: "Rohit Deshmukh".to_string(),
                    city: "Pune".to_string(),
                    active: true,
                },
            ])),
        }
    }

    pub(super) fn is_active(&self, broker_id: BrokerId) -> bool {
        self.roster
            .lock()
            .expect("roster mutex poisoned")
            .iter()
            .find(|account| account.id == broker_id)
            .map(|account| account.active)
            .unwrap_or(false)
    }
}

impl AccountDirectory for MemoryAccounts {
    fn brokers(&self) -> Result<Vec<BrokerAccount>, RepositoryError> {
        Ok(self.roster.lock().expect("roster mutex poisoned").clone())
    }

    fn deactivate(&self, broker_id: BrokerId) -> Result<(), RepositoryError> {
        let mut guard = self.roster.lock().expect("roster mutex poisoned");
        let account = guard
            .iter_mut()
            .find(|account| account.id == broker_id)
            .ok_or(RepositoryError::NotFound)?;
        account.active = false;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryEvents {
    events: Arc<Mutex<Vec<TrustEvent>>>,
}

impl MemoryEvents {
    pub(super) fn events(&self) -> Vec<TrustEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for MemoryEvents {
    fn publish(&self, event: TrustEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}
