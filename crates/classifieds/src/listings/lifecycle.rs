//! Status transitions. Each function validates the current state and mutates the record only
//! when the transition is allowed.

use chrono::{DateTime, Utc};

use super::domain::{Listing, ListingStatus};
use super::pricing::PublicationSchedule;
use crate::catalog::PublicationPeriod;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Tylko aktywne ogłoszenia można zakończyć.")]
    NotActive,
    #[error("Tylko archiwalne lub wygasłe ogłoszenia można odświeżyć.")]
    NotRenewable,
    #[error("To ogłoszenie nie oczekuje na płatność.")]
    NotAwaitingPayment,
}

/// Payment confirmed: the listing goes live regardless of its previous state.
pub fn activate(listing: &mut Listing) {
    listing.status = ListingStatus::Active;
}

pub fn archive(listing: &mut Listing, now: DateTime<Utc>) -> Result<(), TransitionError> {
    if listing.status != ListingStatus::Active {
        return Err(TransitionError::NotActive);
    }
    listing.status = ListingStatus::Archived;
    listing.expires_at = Some(now);
    Ok(())
}

pub fn ensure_renewable(listing: &Listing) -> Result<(), TransitionError> {
    if listing.status.is_renewable() {
        Ok(())
    } else {
        Err(TransitionError::NotRenewable)
    }
}

pub fn renew(
    listing: &mut Listing,
    period: &PublicationPeriod,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    ensure_renewable(listing)?;
    let schedule = PublicationSchedule::starting_at(now, period);
    listing.status = ListingStatus::Active;
    listing.publication_period_id = Some(period.id);
    listing.expires_at = Some(schedule.expires_at);
    listing.archived_until = Some(schedule.archived_until);
    Ok(())
}

pub fn ensure_awaiting_payment(listing: &Listing) -> Result<(), TransitionError> {
    if listing.status == ListingStatus::PendingPayment {
        Ok(())
    } else {
        Err(TransitionError::NotAwaitingPayment)
    }
}
