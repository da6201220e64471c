use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::UserId;
use crate::catalog::{CategoryId, FilterId, FilterOptionId, PeriodId};

pub const IMAGE_SLOTS: usize = 6;
pub const MAX_TAGS: usize = 100;

/// Identifier wrapper for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub Uuid);

impl ListingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    PendingPayment,
    Active,
    Archived,
    Expired,
    Rejected,
}

impl ListingStatus {
    pub fn label(self) -> &'static str {
        match self {
            ListingStatus::PendingPayment => "pending_payment",
            ListingStatus::Active => "active",
            ListingStatus::Archived => "archived",
            ListingStatus::Expired => "expired",
            ListingStatus::Rejected => "rejected",
        }
    }

    /// Archived and expired listings can be brought back with a new period.
    pub fn is_renewable(self) -> bool {
        matches!(self, ListingStatus::Archived | ListingStatus::Expired)
    }
}

/// Contact number reduced to exactly nine digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactPhone(String);

impl ContactPhone {
    /// Drops every non-digit character; the remainder must be nine digits long.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        (digits.len() == 9).then_some(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fixed array of image URLs; an empty string marks an unused slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSlots([String; IMAGE_SLOTS]);

impl ImageSlots {
    /// Keeps the first six URLs and pads the remainder with empty slots.
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut slots = Self::default();
        for (slot, url) in urls.into_iter().take(IMAGE_SLOTS).enumerate() {
            slots.0[slot] = url.trim().to_string();
        }
        slots
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0
            .get(slot)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn set(&mut self, slot: usize, url: String) {
        if let Some(entry) = self.0.get_mut(slot) {
            *entry = url;
        }
    }

    pub fn occupied(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Listing row as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    /// Asking price in złoty with at most two decimal places.
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub publication_period_id: Option<PeriodId>,
    pub location: Option<String>,
    pub region_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub contact_phone: ContactPhone,
    pub contact_email: Option<String>,
    pub images: ImageSlots,
    pub tags: Vec<String>,
    pub status: ListingStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub archived_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Attribute value captured for one of the category's filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValue {
    pub listing_id: ListingId,
    pub filter_id: FilterId,
    pub value: Option<String>,
    pub option_id: Option<FilterOptionId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterValueInput {
    pub filter_id: FilterId,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub option_id: Option<FilterOptionId>,
}

/// Seller-submitted form for a new listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewListingInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw price as typed; spaces are ignored and a comma may be the decimal separator.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub region_id: Option<Uuid>,
    #[serde(default)]
    pub district_id: Option<Uuid>,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub filter_values: Vec<FilterValueInput>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub publication_period_id: Option<PeriodId>,
}

/// Contact data revealed on request from the public listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
