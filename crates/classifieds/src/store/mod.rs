//! Persistence seams shared by the catalog, listing and account services.

mod memory;

pub use memory::{InMemoryImageStore, InMemoryStore};

use crate::accounts::SettingsRepository;
use crate::catalog::CatalogRepository;
use crate::error::ErrorKind;
use crate::listings::ListingRepository;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("referenced record does not exist: {0}")]
    MissingReference(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::Conflict | RepositoryError::MissingReference(_) => ErrorKind::Conflict,
            RepositoryError::NotFound => ErrorKind::NotFound,
            RepositoryError::Unavailable(_) => ErrorKind::Internal,
        }
    }
}

/// Everything the listing flow reads or writes, implemented by a single backing store.
pub trait MarketplaceStore: ListingRepository + CatalogRepository + SettingsRepository {}

impl<T> MarketplaceStore for T where T: ListingRepository + CatalogRepository + SettingsRepository {}
