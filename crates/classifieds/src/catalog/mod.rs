//! Category tree, publication period catalog and attribute filters.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod tree;

#[cfg(test)]
mod tests;

pub use domain::{
    Category, CategoryId, CategoryPeriodPrice, CategoryStatus, Filter, FilterId, FilterKind,
    FilterOption, FilterOptionId, FilterWithOptions, PeriodId, PublicationFee, PublicationOption,
    PublicationPeriod, Visibility,
};
pub use repository::CatalogRepository;
pub use router::catalog_router;
pub use service::{
    filters_for_category, publication_options, CatalogError, CatalogService,
    CatalogValidationError, CategoryDraft, CategoryNode, PeriodPriceDraft,
};
pub use tree::CategoryTree;
