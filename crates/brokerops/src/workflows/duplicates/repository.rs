use super::domain::{DuplicateReviewTicket, ListingId, PropertyListing, TicketId};

/// Error enumeration for listing and ticket storage failures.
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

/// Storage abstraction over the listing table, narrow enough for the
/// duplicate workflow; listing CRUD proper lives with the listing subsystem.
pub trait ListingStore: Send + Sync {
    fn insert(&self, listing: PropertyListing) -> Result<PropertyListing, RepositoryError>;
    fn fetch(&self, id: ListingId) -> Result<Option<PropertyListing>, RepositoryError>;
    fn update(&self, listing: PropertyListing) -> Result<(), RepositoryError>;
    /// Every other listing in the given city, regardless of status.
    fn in_city(&self, city: &str, exclude: ListingId)
        -> Result<Vec<PropertyListing>, RepositoryError>;
}

/// Storage abstraction over the duplicate review queue.
pub trait TicketStore: Send + Sync {
    fn insert(&self, ticket: DuplicateReviewTicket)
        -> Result<DuplicateReviewTicket, RepositoryError>;
    fn fetch(&self, id: TicketId) -> Result<Option<DuplicateReviewTicket>, RepositoryError>;
    /// Conditional write: succeeds only while the stored ticket is still
    /// pending, so a ticket is resolved exactly once under concurrency.
    fn update_if_pending(&self, ticket: DuplicateReviewTicket) -> Result<(), RepositoryError>;
    fn pending(&self) -> Result<Vec<DuplicateReviewTicket>, RepositoryError>;
}
