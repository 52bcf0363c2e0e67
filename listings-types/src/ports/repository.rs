//! Repository port traits.
//!
//! Adapters (Postgres, SQLite, in-memory) implement both stores.

use chrono::{DateTime, Utc};

use crate::domain::{
    CorrelationRef, Listing, ListingId, PaymentRequest, PaymentStatus, Resolution,
};
use crate::dto::CreateListingRequest;
use crate::error::RepoError;

/// Listing persistence.
#[async_trait::async_trait]
pub trait ListingStore: Send + Sync + 'static {
    /// Creates a new unverified, unfeatured listing.
    async fn create_listing(&self, req: CreateListingRequest) -> Result<Listing, RepoError>;

    /// Gets a listing by ID.
    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError>;

    /// Marks a listing featured. Idempotent; fails with
    /// `DomainError::ListingNotFound` when the id does not resolve.
    async fn set_featured(&self, id: ListingId) -> Result<(), RepoError>;

    /// Flips the `verified` flag and returns the updated listing.
    async fn toggle_verified(&self, id: ListingId) -> Result<Listing, RepoError>;
}

/// Durable mapping from correlation reference to payment request.
///
/// `transition` is the only way a request leaves PENDING and MUST be a
/// conditional update so concurrent callers cannot both succeed.
#[async_trait::async_trait]
pub trait CorrelationStore: Send + Sync + 'static {
    /// Inserts a new request. Fails with `RepoError::Conflict` if the
    /// correlation reference already exists.
    async fn create_payment_request(&self, req: &PaymentRequest) -> Result<(), RepoError>;

    async fn find_by_ref(
        &self,
        correlation_ref: &CorrelationRef,
    ) -> Result<Option<PaymentRequest>, RepoError>;

    async fn find_by_checkout_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentRequest>, RepoError>;

    /// Stores the provider's checkout id once a charge is accepted.
    async fn record_checkout(
        &self,
        correlation_ref: &CorrelationRef,
        checkout_request_id: &str,
    ) -> Result<(), RepoError>;

    /// Compare-and-swap on status. Returns `true` only for the caller that
    /// moved the request from `from` to `to`.
    async fn transition(
        &self,
        correlation_ref: &CorrelationRef,
        from: PaymentStatus,
        to: PaymentStatus,
        resolution: Resolution,
    ) -> Result<bool, RepoError>;

    /// PENDING requests created before `cutoff`, oldest first.
    async fn list_pending_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PaymentRequest>, RepoError>;

    /// Payment history for one listing, newest first.
    async fn list_for_listing(&self, listing_id: ListingId)
    -> Result<Vec<PaymentRequest>, RepoError>;
}
