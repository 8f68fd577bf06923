//! Duplicate listing detection and human review.
//!
//! Every listing create/update is scored against the other listings in its
//! city; a high-scoring pair hides the newer listing and queues a review
//! ticket, so only one listing of a cluster is ever customer-visible.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod similarity;

#[cfg(test)]
mod tests;

pub use domain::{
    DuplicateOutcome, DuplicateReviewTicket, GeoPoint, ListingId, ListingStatus, NewListing,
    PropertyListing, ReviewDecision, TicketId, TicketStatus,
};
pub use repository::{ListingStore, RepositoryError, TicketStore};
pub use router::duplicate_router;
pub use service::{DuplicatePolicy, DuplicateWorkflow, DuplicateWorkflowError};
pub use similarity::similarity_score;
