use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::error::ListingValidationError;
use crate::catalog::{Category, CategoryPeriodPrice, PublicationPeriod};

/// Days an archived listing is retained after it stops being published.
pub const ARCHIVE_GRACE_DAYS: i64 = 90;

/// Publication window derived from the chosen period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublicationSchedule {
    pub expires_at: DateTime<Utc>,
    pub archived_until: DateTime<Utc>,
}

impl PublicationSchedule {
    pub fn starting_at(now: DateTime<Utc>, period: &PublicationPeriod) -> Self {
        let expires_at = now + Duration::days(i64::from(period.days_count));
        let archived_until = expires_at + Duration::days(ARCHIVE_GRACE_DAYS);
        Self {
            expires_at,
            archived_until,
        }
    }
}

/// Amount due before a pending listing goes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentQuote {
    pub publication_fee_cents: u32,
    pub period_price_cents: u32,
    pub total_cents: u32,
}

impl PaymentQuote {
    /// The category fee and the period price are independent and simply added.
    pub fn new(category: &Category, period_price: &CategoryPeriodPrice) -> Self {
        let publication_fee_cents = category.publication_fee.cents();
        let period_price_cents = period_price.price_cents;
        Self {
            publication_fee_cents,
            period_price_cents,
            total_cents: publication_fee_cents.saturating_add(period_price_cents),
        }
    }
}

/// Parses the price typed by the seller. Blank input means "no price".
pub fn parse_price(raw: Option<&str>) -> Result<Option<Decimal>, ListingValidationError> {
    let cleaned: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replacen(',', ".", 1);
    if cleaned.is_empty() {
        return Ok(None);
    }

    let value = Decimal::from_str(&cleaned).map_err(|_| ListingValidationError::InvalidPrice)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ListingValidationError::InvalidPrice);
    }
    Ok(Some(value.round_dp_with_strategy(
        2,
        RoundingStrategy::MidpointAwayFromZero,
    )))
}

/// Applies the free/paid rule of the target category to a parsed price.
pub fn resolve_price(
    price: Option<Decimal>,
    category_is_free: bool,
) -> Result<Option<Decimal>, ListingValidationError> {
    match price {
        None if category_is_free => Ok(Some(Decimal::ZERO)),
        Some(value) if !category_is_free && value.is_zero() => {
            Err(ListingValidationError::PriceRequired)
        }
        None => Err(ListingValidationError::PriceRequired),
        Some(value) => Ok(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CategoryId, CategoryStatus, PeriodId, PublicationFee};
    use chrono::TimeZone;

    fn period(days_count: u32) -> PublicationPeriod {
        PublicationPeriod {
            id: PeriodId::new(),
            label: format!("{days_count} dni"),
            days_count,
        }
    }

    #[test]
    fn schedule_adds_period_then_grace_window() {
        let now = Utc.with_ymd_and_hms(2025, 3, 30, 0, 30, 0).unwrap();
        let schedule = PublicationSchedule::starting_at(now, &period(30));
        assert_eq!(
            schedule.expires_at,
            Utc.with_ymd_and_hms(2025, 4, 29, 0, 30, 0).unwrap()
        );
        assert_eq!(
            schedule.archived_until,
            schedule.expires_at + Duration::days(90)
        );
    }

    #[test]
    fn parse_price_normalizes_separators() {
        assert_eq!(parse_price(Some(" 1 200,50 ")).unwrap(), Some(Decimal::new(120050, 2)));
        assert_eq!(parse_price(Some("19.999")).unwrap(), Some(Decimal::new(2000, 2)));
        assert_eq!(parse_price(Some("0.125")).unwrap(), Some(Decimal::new(13, 2)));
        assert_eq!(parse_price(Some("   ")).unwrap(), None);
        assert_eq!(parse_price(None).unwrap(), None);
    }

    #[test]
    fn parse_price_rejects_garbage_and_negatives() {
        assert_eq!(
            parse_price(Some("abc")),
            Err(ListingValidationError::InvalidPrice)
        );
        assert_eq!(
            parse_price(Some("-5")),
            Err(ListingValidationError::InvalidPrice)
        );
    }

    #[test]
    fn paid_categories_require_positive_price() {
        assert_eq!(
            resolve_price(None, false),
            Err(ListingValidationError::PriceRequired)
        );
        assert_eq!(
            resolve_price(Some(Decimal::ZERO), false),
            Err(ListingValidationError::PriceRequired)
        );
        assert_eq!(
            resolve_price(Some(Decimal::new(1200, 0)), false),
            Ok(Some(Decimal::new(1200, 0)))
        );
    }

    #[test]
    fn free_categories_default_to_zero() {
        assert_eq!(resolve_price(None, true), Ok(Some(Decimal::ZERO)));
        assert_eq!(
            resolve_price(Some(Decimal::ZERO), true),
            Ok(Some(Decimal::ZERO))
        );
    }

    #[test]
    fn quote_adds_fee_and_period_price() {
        let category = Category {
            id: CategoryId::new(),
            name: "Elektronika".to_string(),
            icon_name: None,
            parent_id: None,
            status: CategoryStatus::Active,
            is_free: false,
            publication_fee: PublicationFee::Standard,
            default_period_id: None,
        };
        let price = CategoryPeriodPrice {
            category_id: category.id,
            period_id: PeriodId::new(),
            price_cents: 500,
        };
        let quote = PaymentQuote::new(&category, &price);
        assert_eq!(quote.publication_fee_cents, 1000);
        assert_eq!(quote.period_price_cents, 500);
        assert_eq!(quote.total_cents, 1500);
    }
}
