use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterOptionId(pub Uuid);

impl CategoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl PeriodId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FilterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FilterOptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for PeriodId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for FilterId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for FilterOptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a category. Replaces the independent active flag and deletion timestamp so a
/// category can never be both hidden and deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CategoryStatus {
    Active,
    Hidden,
    Deleted { deleted_at: DateTime<Utc> },
}

impl CategoryStatus {
    pub fn is_visible(self) -> bool {
        matches!(self, CategoryStatus::Active)
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, CategoryStatus::Deleted { .. })
    }

    pub fn deleted_at(self) -> Option<DateTime<Utc>> {
        match self {
            CategoryStatus::Deleted { deleted_at } => Some(deleted_at),
            _ => None,
        }
    }
}

/// Visibility an admin may toggle on a live category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Active,
    Hidden,
}

impl From<Visibility> for CategoryStatus {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Active => CategoryStatus::Active,
            Visibility::Hidden => CategoryStatus::Hidden,
        }
    }
}

/// Flat fee charged for publishing in a category, on top of the chosen period's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PublicationFee {
    #[default]
    Free,
    Basic,
    Standard,
    Premium,
}

impl PublicationFee {
    pub const ALLOWED_CENTS: [u32; 4] = [0, 500, 1000, 1500];

    pub fn cents(self) -> u32 {
        match self {
            PublicationFee::Free => 0,
            PublicationFee::Basic => 500,
            PublicationFee::Standard => 1000,
            PublicationFee::Premium => 1500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("publication fee must be one of 0, 500, 1000 or 1500 cents (found {0})")]
pub struct InvalidPublicationFee(pub i64);

impl TryFrom<i64> for PublicationFee {
    type Error = InvalidPublicationFee;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PublicationFee::Free),
            500 => Ok(PublicationFee::Basic),
            1000 => Ok(PublicationFee::Standard),
            1500 => Ok(PublicationFee::Premium),
            other => Err(InvalidPublicationFee(other)),
        }
    }
}

impl From<PublicationFee> for i64 {
    fn from(value: PublicationFee) -> Self {
        i64::from(value.cents())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon_name: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub status: CategoryStatus,
    /// Listings in free categories may omit their price.
    pub is_free: bool,
    pub publication_fee: PublicationFee,
    pub default_period_id: Option<PeriodId>,
}

/// Entry of the global period catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationPeriod {
    pub id: PeriodId,
    pub label: String,
    pub days_count: u32,
}

/// A period enabled for a category together with its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPeriodPrice {
    pub category_id: CategoryId,
    pub period_id: PeriodId,
    pub price_cents: u32,
}

/// Purchasable period as presented to a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationOption {
    pub period_id: PeriodId,
    pub label: String,
    pub days_count: u32,
    pub price_cents: u32,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Select,
    Number,
    Text,
}

impl FilterKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "select" => Some(FilterKind::Select),
            "number" => Some(FilterKind::Number),
            "text" => Some(FilterKind::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: FilterId,
    pub name: String,
    pub kind: FilterKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: FilterOptionId,
    pub filter_id: FilterId,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterWithOptions {
    pub id: FilterId,
    pub name: String,
    pub kind: FilterKind,
    pub options: Vec<FilterOption>,
}
