use super::domain::{FilterValue, Listing, ListingId};
use crate::access::{UserId, WriteScope};
use crate::store::RepositoryError;

/// Storage abstraction for listings and their attribute values.
pub trait ListingRepository: Send + Sync {
    /// Persists the listing and its filter values as one unit: either both land or neither does.
    fn insert_listing(
        &self,
        listing: Listing,
        filter_values: Vec<FilterValue>,
    ) -> Result<Listing, RepositoryError>;
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError>;
    /// Every listing of the user, newest first.
    fn listings_by_owner(&self, user_id: &UserId) -> Result<Vec<Listing>, RepositoryError>;
    /// Returns `NotFound` when the row is missing or `scope` does not cover its owner.
    fn update_listing(&self, listing: Listing, scope: &WriteScope) -> Result<(), RepositoryError>;
    /// Removes the row and its filter values under the same ownership rule as updates.
    fn delete_listing(&self, id: &ListingId, scope: &WriteScope) -> Result<(), RepositoryError>;
    fn filter_values(&self, id: &ListingId) -> Result<Vec<FilterValue>, RepositoryError>;
}
