//! Listing creation, status lifecycle, publication pricing and image storage.

pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod repository;
pub mod router;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use domain::{
    ContactDetails, ContactPhone, FilterValue, FilterValueInput, ImageSlots, Listing, ListingId,
    ListingStatus, NewListingInput, IMAGE_SLOTS, MAX_TAGS,
};
pub use error::{ListingAction, ListingError, ListingValidationError};
pub use lifecycle::TransitionError;
pub use pricing::{parse_price, resolve_price, PaymentQuote, PublicationSchedule};
pub use repository::ListingRepository;
pub use router::listing_router;
pub use service::ListingService;
pub use storage::{ImageStore, ImageUpload, StorageError};
