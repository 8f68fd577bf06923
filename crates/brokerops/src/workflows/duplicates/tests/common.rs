use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};

use crate::workflows::duplicates::domain::{
    DuplicateReviewTicket, GeoPoint, ListingId, ListingStatus, PropertyListing, TicketId,
    TicketStatus,
};
use crate::workflows::duplicates::repository::{ListingStore, RepositoryError, TicketStore};
use crate::workflows::duplicates::service::{DuplicatePolicy, DuplicateWorkflow};
use crate::workflows::events::{EventError, EventPublisher, TrustEvent};
use crate::workflows::ids::BrokerId;

pub(super) fn dt(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, day)
        .expect("valid date")
        .and_hms_opt(hour, 0, 0)
        .expect("valid time")
}

pub(super) fn baner_geo() -> GeoPoint {
    GeoPoint {
        latitude: 18.5590,
        longitude: 73.7868,
    }
}

/// A fully-populated Baner apartment listing; tests tweak fields from here.
pub(super) fn listing(id: u64, broker: u64, created_at: NaiveDateTime) -> PropertyListing {
    PropertyListing {
        id: ListingId(id),
        broker_id: BrokerId(broker),
        title: "2BHK in Skyline Towers".to_string(),
        city: "Pune".to_string(),
        asset_type: "Apartment".to_string(),
        configuration: "2BHK".to_string(),
        area_value: Some(1150.0),
        price: Some(8_500_000.0),
        location_text: "Baner Road near Sakal Nagar".to_string(),
        geo: Some(baner_geo()),
        image_url: Some("https://img.example.com/photos/tower-a-12.jpg".to_string()),
        status: ListingStatus::Active,
        hidden_from_customers: false,
        duplicate_score: None,
        primary_listing_id: None,
        created_at,
        updated_at: created_at,
    }
}

pub(super) fn build_workflow() -> (
    DuplicateWorkflow<MemoryListings, MemoryTickets, MemoryEvents>,
    Arc<MemoryListings>,
    Arc<MemoryTickets>,
    Arc<MemoryEvents>,
) {
    let listings = Arc::new(MemoryListings::default());
    let tickets = Arc::new(MemoryTickets::default());
    let events = Arc::new(MemoryEvents::default());
    let workflow = DuplicateWorkflow::new(
        listings.clone(),
        tickets.clone(),
        events.clone(),
        DuplicatePolicy::default(),
    );
    (workflow, listings, tickets, events)
}

#[derive(Default, Clone)]
pub(super) struct MemoryListings {
    records: Arc<Mutex<HashMap<ListingId, PropertyListing>>>,
}

impl ListingStore for MemoryListings {
    fn insert(&self, listing: PropertyListing) -> Result<PropertyListing, RepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if guard.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn fetch(&self, id: ListingId) -> Result<Option<PropertyListing>, RepositoryError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update(&self, listing: PropertyListing) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        if !guard.contains_key(&listing.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(listing.id, listing);
        Ok(())
    }

    fn in_city(
        &self,
        city: &str,
        exclude: ListingId,
    ) -> Result<Vec<PropertyListing>, RepositoryError> {
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
pub(super) struct MemoryTickets {
    records: Arc<Mutex<HashMap<TicketId, DuplicateReviewTicket>>>,
}

impl TicketStore for MemoryTickets {
    fn insert(
        &self,
        ticket: DuplicateReviewTicket,
    ) -> Result<DuplicateReviewTicket, RepositoryError> {
        let mut guard = self.records.lock().expect("ticket mutex poisoned");
        if guard.contains_key(&ticket.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    fn fetch(&self, id: TicketId) -> Result<Option<DuplicateReviewTicket>, RepositoryError> {
        let guard = self.records.lock().expect("ticket mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn update_if_pending(&self, ticket: DuplicateReviewTicket) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("ticket mutex poisoned");
        let stored = guard.get(&ticket.id).ok_or(RepositoryError::NotFound)?;
        if stored.status != TicketStatus::Pending {
            return Err(RepositoryError::Stale);
        }
        guard.insert(ticket.id, ticket);
        Ok(())
    }

    fn pending(&self) -> Result<Vec<DuplicateReviewTicket>, RepositoryError> {
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
