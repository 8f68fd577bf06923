use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::workflows::events::{EventError, EventPublisher, TrustEvent};
use crate::workflows::ids::{BrokerId, SlotId, VisitId};
use crate::workflows::incidents::domain::{
    CancellationIncident, CancellationNotice, EmergencyClaim, IncidentId, IncidentStatus,
};
use crate::workflows::incidents::repository::{IncidentStore, RepositoryError};
use crate::workflows::incidents::service::IncidentDesk;
use crate::workflows::incidents::sla::SlaPolicy;
use crate::workflows::reliability::{
    AccountDirectory, BrokerAccount, BrokerFlag, BrokerPenalty, FlagLedger, FlagPolicy, FlagStore,
    FlagStatus, RepositoryError as FlagRepositoryError,
};

pub(super) fn dt(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, day)
        .expect("valid date")
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
}

pub(super) fn notice(broker: u64, raised_at: NaiveDateTime) -> CancellationNotice {
    CancellationNotice {
        visit_id: VisitId(900),
        slot_id: SlotId(300),
        broker_id: BrokerId(broker),
        raised_at,
        within_24h: true,
        was_booked: true,
        emergency: Some(EmergencyClaim {
            reason: "Hospitalized overnight".to_string(),
            details: "Admission slip attached".to_string(),
        }),
    }
}

pub(super) type TestDesk =
    IncidentDesk<MemoryIncidents, MemoryFlags, MemoryAccounts, MemoryEvents>;

pub(super) struct Harness {
    pub(super) desk: TestDesk,
    pub(super) incidents: Arc<MemoryIncidents>,
    pub(super) flags: Arc<MemoryFlags>,
    pub(super) accounts: Arc<MemoryAccounts>,
    pub(super) events: Arc<MemoryEvents>,
}

pub(super) fn build_desk() -> Harness {
    let incidents = Arc::new(MemoryIncidents::default());
    let flags = Arc::new(MemoryFlags::default());
    let accounts = Arc::new(MemoryAccounts::default());
    let events = Arc::new(MemoryEvents::default());
    let ledger = Arc::new(FlagLedger::new(
        flags.clone(),
        accounts.clone(),
        events.clone(),
        FlagPolicy::default(),
    ));
    let desk = IncidentDesk::new(
        incidents.clone(),
        ledger,
        events.clone(),
        SlaPolicy::default(),
    );
    Harness {
        desk,
        incidents,
        flags,
        accounts,
        events,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryIncidents {
    records: Arc<Mutex<HashMap<IncidentId, CancellationIncident>>>,
}

impl IncidentStore for MemoryIncidents {
    fn insert(
        &self,
        incident: CancellationIncident,
    ) -> Result<CancellationIncident, RepositoryError> {
        let mut guard = self.records.lock().expect("incident mutex poisoned");
        if guard.contains_key(&incident.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(incident.id, incident.clone());
        Ok(incident)
    }

    fn fetch(&self, id: IncidentId) -> Result<Option<CancellationIncident>, RepositoryError> {
        let guard = self.records.lock().expect("incident mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update_from(
        &self,
        incident: CancellationIncident,
        expected: IncidentStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("incident mutex poisoned");
        let stored = guard.get(&incident.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::Stale);
        }
        guard.insert(incident.id, incident);
        Ok(())
    }

    fn with_status(
        &self,
        status: IncidentStatus,
    ) -> Result<Vec<CancellationIncident>, RepositoryError> {
        let guard = self.records.lock().expect("incident mutex poisoned");
        let mut rows: Vec<_> = guard
            .values()
            .filter(|incident| incident.status == status)
            .cloned()
            .collect();
        rows.sort_by_key(|incident| incident.id.0);
        Ok(rows)
    }

    fn due_for_escalation(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<CancellationIncident>, RepositoryError> {
        let guard = self.records.lock().expect("incident mutex poisoned");
        let mut rows: Vec<_> = guard
            .values()
            .filter(|incident| {
                incident.status == IncidentStatus::PendingRmReview
                    && !incident.escalated_to_srm
                    && incident.sla_due_at.is_some_and(|due| due <= now)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|incident| incident.id.0);
        Ok(rows)
    }

    fn for_broker(
        &self,
        broker_id: BrokerId,
    ) -> Result<Vec<CancellationIncident>, RepositoryError> {
        let guard = self.records.lock().expect("incident mutex poisoned");
        let mut rows: Vec<_> = guard
            .values()
            .filter(|incident| incident.broker_id == broker_id)
            .cloned()
            .collect();
        rows.sort_by_key(|incident| incident.id.0);
        Ok(rows)
    }
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

    pub(super) fn all_penalties(&self) -> Vec<BrokerPenalty> {
        self.penalties.lock().expect("penalty mutex poisoned").clone()
    }
}

impl FlagStore for MemoryFlags {
    fn insert(&self, flag: BrokerFlag) -> Result<BrokerFlag, FlagRepositoryError> {
        self.flags
            .lock()
            .expect("flag mutex poisoned")
            .push(flag.clone());
        Ok(flag)
    }

    fn decay_due(&self, now: NaiveDateTime) -> Result<usize, FlagRepositoryError> {
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

    fn active_count(&self, broker_id: BrokerId) -> Result<usize, FlagRepositoryError> {
        let guard = self.flags.lock().expect("flag mutex poisoned");
        Ok(guard
            .iter()
            .filter(|flag| flag.broker_id == broker_id && flag.status == FlagStatus::Active)
            .count())
    }

    fn flags_for(&self, broker_id: BrokerId) -> Result<Vec<BrokerFlag>, FlagRepositoryError> {
        let guard = self.flags.lock().expect("flag mutex poisoned");
        Ok(guard
            .iter()
            .filter(|flag| flag.broker_id == broker_id)
            .cloned()
            .collect())
    }

    fn record_penalty(&self, penalty: BrokerPenalty) -> Result<bool, FlagRepositoryError> {
        let mut guard = self.penalties.lock().expect("penalty mutex poisoned");
        if guard.contains(&penalty) {
            return Ok(false);
        }
        guard.push(penalty);
        Ok(true)
    }

    fn penalties_for(
        &self,
        broker_id: BrokerId,
    ) -> Result<Vec<BrokerPenalty>, FlagRepositoryError> {
        let guard = self.penalties.lock().expect("penalty mutex poisoned");
        Ok(guard
            .iter()
            .filter(|penalty| penalty.broker_id == broker_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAccounts {
    deactivated: Arc<Mutex<Vec<BrokerId>>>,
}

impl MemoryAccounts {
    pub(super) fn deactivated(&self) -> Vec<BrokerId> {
        self.deactivated
            .lock()
            .expect("account mutex poisoned")
            .clone()
    }
}

impl AccountDirectory for MemoryAccounts {
    fn brokers(&self) -> Result<Vec<BrokerAccount>, FlagRepositoryError> {
        Ok(Vec::new())
    }

    fn deactivate(&self, broker_id: BrokerId) -> Result<(), FlagRepositoryError> {
        self.deactivated
            .lock()
            .expect("account mutex poisoned")
            .push(broker_id);
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
