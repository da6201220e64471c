//! Listing lifecycle, category catalog and publication pricing for a classifieds marketplace.
//!
//! The crate exposes framework-agnostic services (`CatalogService`, `ListingService`,
//! `SettingsService`, `AssistService`) together with axum routers that surface them over HTTP.
//! Persistence, object storage and language-model calls sit behind traits so the services can be
//! exercised against the bundled in-memory store.

pub mod access;
pub mod accounts;
pub mod assist;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod listings;
pub mod store;
pub mod telemetry;
