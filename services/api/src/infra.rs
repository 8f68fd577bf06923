use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use brokerops::workflows::duplicates::{
    DuplicateReviewTicket, DuplicateWorkflow, ListingId, ListingStore, PropertyListing,
    RepositoryError as ListingRepositoryError, TicketId, TicketStatus, TicketStore,
};
use brokerops::workflows::events::{EventError, EventPublisher, TrustEvent};
use brokerops::workflows::ids::BrokerId;
use brokerops::workflows::incidents::{
    CancellationIncident, IncidentDesk, IncidentId, IncidentStatus, IncidentStore,
    RepositoryError as IncidentRepositoryError,
};
use brokerops::workflows::maintenance::MaintenanceSweep;
use brokerops::workflows::reliability::{
    AccountDirectory, BrokerAccount, BrokerFlag, BrokerPenalty, FlagLedger, FlagStatus, FlagStore,
    ReliabilityReporter, RepositoryError as FlagRepositoryError,
};
use chrono::NaiveDateTime;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Workflow = DuplicateWorkflow<InMemoryListings, InMemoryTickets, LoggingEvents>;
pub(crate) type Desk =
    IncidentDesk<InMemoryIncidents, InMemoryFlags, InMemoryAccounts, LoggingEvents>;
pub(crate) type Sweep =
    MaintenanceSweep<InMemoryIncidents, InMemoryFlags, InMemoryAccounts, LoggingEvents>;
pub(crate) type Reporter =
    ReliabilityReporter<InMemoryFlags, InMemoryAccounts, LoggingEvents, InMemoryIncidents>;

/// The full in-memory backing for one process: stores, services, and the
/// collaborator seams, wired the same way for `serve` and `demo`.
pub(crate) struct TrustEngine {
    pub(crate) workflow: Arc<Workflow>,
    pub(crate) desk: Arc<Desk>,
    pub(crate) sweep: Arc<Sweep>,
    pub(crate) reporter: Arc<Reporter>,
    pub(crate) accounts: Arc<InMemoryAccounts>,
}

pub(crate) fn build_engine(config: &brokerops::config::TrustConfig) -> TrustEngine {
    let listings = Arc::new(InMemoryListings::default());
    let tickets = Arc::new(InMemoryTickets::default());
    let incidents = Arc::new(InMemoryIncidents::default());
    let flags = Arc::new(InMemoryFlags::default());
    let accounts = Arc::new(InMemoryAccounts::default());
    let events = Arc::new(LoggingEvents);

    let workflow = Arc::new(DuplicateWorkflow::new(
        listings,
        tickets,
        events.clone(),
        config.duplicate_policy(),
    ));
    let ledger = Arc::new(FlagLedger::new(
        flags.clone(),
        accounts.clone(),
        events.clone(),
        config.flag_policy(),
    ));
    let desk = Arc::new(IncidentDesk::new(
        incidents.clone(),
        ledger.clone(),
        events,
        config.sla_policy(),
    ));
    let sweep = Arc::new(MaintenanceSweep::new(desk.clone(), ledger.clone()));
    let reporter = Arc::new(ReliabilityReporter::new(
        ledger.clone(),
        accounts.clone(),
        incidents,
    ));

    TrustEngine {
        workflow,
        desk,
        sweep,
        reporter,
        accounts,
    }
}

/// Event seam wired to the log; production deployments would hand these to
/// the WhatsApp and reporting adapters instead.
#[derive(Clone)]
pub(crate) struct LoggingEvents;

impl EventPublisher for LoggingEvents {
    fn publish(&self, event: TrustEvent) -> Result<(), EventError> {
        info!(?event, "trust event");
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryListings {
    records: Arc<Mutex<HashMap<ListingId, PropertyListing>>>,
}

impl ListingStore for InMemoryListings {
    fn insert(&self, listing: PropertyListing) -> Result<PropertyListing, ListingRepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if guard.contains_key(&listing.id) {
            return Err(ListingRepositoryError::Conflict);
        }
        guard.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn fetch(&self, id: ListingId) -> Result<Option<PropertyListing>, ListingRepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update(&self, listing: PropertyListing) -> Result<(), ListingRepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if !guard.contains_key(&listing.id) {
            return Err(ListingRepositoryError::NotFound);
        }
        guard.insert(listing.id, listing);
        Ok(())
    }

    fn in_city(
        &self,
        city: &str,
        exclude: ListingId,
    ) -> Result<Vec<PropertyListing>, ListingRepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        let mut rows: Vec<_> = guard
            .values()
            .filter(|listing| listing.city == city && listing.id != exclude)
            .cloned()
            .collect();
        rows.sort_by_key(|listing| listing.id);
        Ok(rows)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTickets {
    records: Arc<Mutex<HashMap<TicketId, DuplicateReviewTicket>>>,
}

impl TicketStore for InMemoryTickets {
    fn insert(
        &self,
        ticket: DuplicateReviewTicket,
    ) -> Result<DuplicateReviewTicket, ListingRepositoryError> {
        let mut guard = self.records.lock().expect("ticket mutex poisoned");
        if guard.contains_key(&ticket.id) {
            return Err(ListingRepositoryError::Conflict);
        }
        guard.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn fetch(&self, id: TicketId) -> Result<Option<DuplicateReviewTicket>, ListingRepositoryError> {
        let guard = self.records.lock().expect("ticket mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update_if_pending(
        &self,
        ticket: DuplicateReviewTicket,
    ) -> Result<(), ListingRepositoryError> {
        let mut guard = self.records.lock().expect("ticket mutex poisoned");
        let stored = guard.get(&ticket.id).ok_or(ListingRepositoryError::NotFound)?;
        if stored.status != TicketStatus::Pending {
            return Err(ListingRepositoryError::Stale);
        }
        guard.insert(ticket.id, ticket);
        Ok(())
    }

    fn pending(&self) -> Result<Vec<DuplicateReviewTicket>, ListingRepositoryError> {
        let guard = self.records.lock().expect("ticket mutex poisoned");
        let mut rows: Vec<_> = guard
            .values()
            .filter(|ticket| ticket.status == TicketStatus::Pending)
            .cloned()
            .collect();
        rows.sort_by_key(|ticket| ticket.id);
        Ok(rows)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryIncidents {
    records: Arc<Mutex<HashMap<IncidentId, CancellationIncident>>>,
}

impl IncidentStore for InMemoryIncidents {
    fn insert(
        &self,
        incident: CancellationIncident,
    ) -> Result<CancellationIncident, IncidentRepositoryError> {
        let mut guard = self.records.lock().expect("incident mutex poisoned");
        if guard.contains_key(&incident.id) {
            return Err(IncidentRepositoryError::Conflict);
        }
        guard.insert(incident.id, incident.clone());
        Ok(incident)
    }

    fn fetch(
        &self,
        id: IncidentId,
    ) -> Result<Option<CancellationIncident>, IncidentRepositoryError> {
        let guard = self.records.lock().expect("incident mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update_from(
        &self,
        incident: CancellationIncident,
        expected: IncidentStatus,
    ) -> Result<(), IncidentRepositoryError> {
        let mut guard = self.records.lock().expect("incident mutex poisoned");
        let stored = guard
            .get(&incident.id)
            .ok_or(IncidentRepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(IncidentRepositoryError::Stale);
        }
        guard.insert(incident.id, incident);
        Ok(())
    }

    fn with_status(
        &self,
        status: IncidentStatus,
    ) -> Result<Vec<CancellationIncident>, IncidentRepositoryError> {
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
    ) -> Result<Vec<CancellationIncident>, IncidentRepositoryError> {
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
    ) -> Result<Vec<CancellationIncident>, IncidentRepositoryError> {
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
pub(crate) struct InMemoryFlags {
    flags: Arc<Mutex<Vec<BrokerFlag>>>,
    penalties: Arc<Mutex<Vec<BrokerPenalty>>>,
}

impl FlagStore for InMemoryFlags {
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
pub(crate) struct InMemoryAccounts {
    roster: Arc<Mutex<Vec<BrokerAccount>>>,
}

impl InMemoryAccounts {
    pub(crate) fn upsert(&self, account: BrokerAccount) {
        let mut guard = self.roster.lock().expect("roster mutex poisoned");
        if let Some(existing) = guard.iter_mut().find(|entry| entry.id == account.id) {
            *existing = account;
        } else {
            guard.push(account);
        }
    }
}

impl AccountDirectory for InMemoryAccounts {
    fn brokers(&self) -> Result<Vec<BrokerAccount>, FlagRepositoryError> {
        Ok(self.roster.lock().expect("roster mutex poisoned").clone())
    }

    fn deactivate(&self, broker_id: BrokerId) -> Result<(), FlagRepositoryError> {
        let mut guard = self.roster.lock().expect("roster mutex poisoned");
        let account = guard
            .iter_mut()
            .find(|entry| entry.id == broker_id)
            .ok_or(FlagRepositoryError::NotFound)?;
        account.active = false;
        Ok(())
    }
}
