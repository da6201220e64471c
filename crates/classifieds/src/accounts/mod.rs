//! Per-user contact settings used to prefill listing forms.

pub mod router;
pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::UserId;
use crate::store::RepositoryError;

pub use router::settings_router;
pub use service::{SettingsError, SettingsService};

/// Stored settings row, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: UserId,
    pub contact_email: Option<String>,
    pub chat_name: Option<String>,
    pub phone: Option<String>,
    pub region_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub city: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Settings form as submitted. Blank text fields clear the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsInput {
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub chat_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub region_id: Option<Uuid>,
    #[serde(default)]
    pub district_id: Option<Uuid>,
    #[serde(default)]
    pub city: String,
}

pub trait SettingsRepository: Send + Sync {
    fn settings(&self, user_id: &UserId) -> Result<Option<UserSettings>, RepositoryError>;
    /// Inserts or replaces the row keyed by `user_id`.
    fn upsert_settings(&self, settings: UserSettings) -> Result<(), RepositoryError>;
}
