use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::domain::{
    ContactDetails, ContactPhone, FilterValue, FilterValueInput, ImageSlots, Listing, ListingId,
    ListingStatus, NewListingInput, IMAGE_SLOTS, MAX_TAGS,
};
use super::error::{ListingAction, ListingError, ListingValidationError};
use super::lifecycle;
use super::pricing::{parse_price, resolve_price, PaymentQuote, PublicationSchedule};
use super::storage::{
    content_type_for, slot_object_path, storage_path_from_public_url, ImageStore, ImageUpload,
};
use crate::access::{Capability, Principal, ServiceCredential, WriteScope};
use crate::catalog::{
    publication_options, Category, CategoryId, CategoryPeriodPrice, CategoryTree, FilterKind,
    PeriodId, PublicationOption, PublicationPeriod,
};
use crate::clock::Clock;
use crate::store::MarketplaceStore;

/// How the caller relates to the listing it is acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Owner,
    Moderator,
}

/// Service composing catalog lookups, pricing rules and listing persistence.
pub struct ListingService<R, S> {
    store: Arc<R>,
    images: Arc<S>,
    clock: Arc<dyn Clock>,
    service_credential: Option<ServiceCredential>,
}

impl<R, S> ListingService<R, S>
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    pub fn new(store: Arc<R>, images: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            images,
            clock,
            service_credential: None,
        }
    }

    /// Enables moderators to write to listings owned by other users.
    pub fn with_service_credential(mut self, credential: ServiceCredential) -> Self {
        self.service_credential = Some(credential);
        self
    }

    /// Validates the form and stores a new listing awaiting payment.
    pub fn create(
        &self,
        principal: Option<&Principal>,
        input: NewListingInput,
    ) -> Result<Listing, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ListingValidationError::TitleRequired.into());
        }
        let contact_phone = ContactPhone::parse(&input.contact_phone)
            .ok_or(ListingValidationError::InvalidPhone)?;
        let price = parse_price(input.price.as_deref())?;

        let category = input
            .category_id
            .map(|id| self.listable_category(&id))
            .transpose()?;
        let price = resolve_price(price, category.as_ref().is_some_and(|c| c.is_free))?;

        let period_id = input
            .publication_period_id
            .ok_or(ListingValidationError::PeriodRequired)?;
        let (period, _) = self.purchasable_period(category.as_ref(), &period_id)?;

        let contact_email = self
            .store
            .settings(&principal.user_id)?
            .and_then(|settings| settings.contact_email);

        let now = self.clock.now();
        let schedule = PublicationSchedule::starting_at(now, &period);
        let listing_id = ListingId::new();
        let filter_values =
            self.filter_values(listing_id, category.as_ref(), input.filter_values)?;

        let listing = Listing {
            id: listing_id,
            user_id: principal.user_id,
            title,
            description: non_blank(input.description),
            price,
            category_id: category.as_ref().map(|c| c.id),
            publication_period_id: Some(period.id),
            location: non_blank(input.location),
            region_id: input.region_id,
            district_id: input.district_id,
            contact_phone,
            contact_email,
            images: ImageSlots::from_urls(input.images),
            tags: normalize_tags(input.tags),
            status: ListingStatus::PendingPayment,
            expires_at: Some(schedule.expires_at),
            archived_until: Some(schedule.archived_until),
            created_at: now,
        };

        let stored = self.store.insert_listing(listing, filter_values)?;
        info!(
            listing_id = %stored.id,
            user_id = %stored.user_id,
            period_id = %period.id,
            "listing created, awaiting payment"
        );
        Ok(stored)
    }

    /// The caller's own listings in every status, newest first.
    pub fn owner_listings(
        &self,
        principal: Option<&Principal>,
    ) -> Result<Vec<Listing>, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        Ok(self.store.listings_by_owner(&principal.user_id)?)
    }

    /// Marks the caller's listing as paid and live.
    pub fn activate(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
    ) -> Result<Listing, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let mut listing = self.owned_listing(principal, &listing_id)?;

        lifecycle::activate(&mut listing);
        self.store
            .update_listing(listing.clone(), &WriteScope::Owner(principal.user_id))?;
        info!(listing_id = %listing_id, "listing activated");
        Ok(listing)
    }

    /// Ends publication of an active listing immediately.
    pub fn archive(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
    ) -> Result<Listing, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let mut listing = self.existing_listing(&listing_id)?;
        let access = self.authorize(principal, &listing, ListingAction::Archive)?;
        let scope = self.write_scope(principal, access, ListingAction::Archive)?;

        lifecycle::archive(&mut listing, self.clock.now())?;
        self.store.update_listing(listing.clone(), &scope)?;
        info!(listing_id = %listing_id, user_id = %principal.user_id, ?access, "listing archived");
        Ok(listing)
    }

    /// Republishes an archived or expired listing for a newly chosen period.
    pub fn renew(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
        period_id: Option<PeriodId>,
    ) -> Result<Listing, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let mut listing = self.existing_listing(&listing_id)?;
        let access = self.authorize(principal, &listing, ListingAction::Renew)?;
        lifecycle::ensure_renewable(&listing)?;

        let category_id = listing
            .category_id
            .ok_or(ListingValidationError::MissingCategory)?;
        let period_id = period_id.ok_or(ListingValidationError::PeriodRequired)?;
        let period = self.enabled_period(&category_id, &period_id)?.0;
        let scope = self.write_scope(principal, access, ListingAction::Renew)?;

        lifecycle::renew(&mut listing, &period, self.clock.now())?;
        self.store.update_listing(listing.clone(), &scope)?;
        info!(
            listing_id = %listing_id,
            period_id = %period.id,
            ?access,
            "listing renewed"
        );
        Ok(listing)
    }

    /// Removes the listing together with every stored image it references.
    pub fn delete(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
    ) -> Result<(), ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let listing = self.existing_listing(&listing_id)?;
        let access = self.authorize(principal, &listing, ListingAction::Delete)?;
        let scope = self.write_scope(principal, access, ListingAction::Delete)?;

        let paths: Vec<String> = listing
            .images
            .occupied()
            .filter_map(|url| storage_path_from_public_url(url, self.images.bucket()))
            .collect();
        if !paths.is_empty() {
            if let Err(err) = self.images.remove(&paths) {
                warn!(listing_id = %listing_id, error = %err, "failed to remove listing images");
            }
        }

        self.store.delete_listing(&listing_id, &scope)?;
        info!(listing_id = %listing_id, ?access, "listing deleted");
        Ok(())
    }

    /// Replaces the image slots of the caller's listing.
    pub fn update_images(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
        urls: Vec<String>,
    ) -> Result<ImageSlots, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let mut listing = self.owned_listing(principal, &listing_id)?;

        listing.images = ImageSlots::from_urls(urls);
        let images = listing.images.clone();
        self.store
            .update_listing(listing, &WriteScope::Owner(principal.user_id))?;
        Ok(images)
    }

    /// Stores the submitted files slot by slot and returns their public URLs. The listing row is
    /// not modified; callers follow up with [`Self::update_images`].
    pub fn upload_images(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
        uploads: Vec<ImageUpload>,
    ) -> Result<ImageSlots, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        self.owned_listing(principal, &listing_id)?;

        if uploads.iter().any(|upload| upload.slot >= IMAGE_SLOTS) {
            return Err(ListingValidationError::InvalidImageSlot.into());
        }

        let mut uploads = uploads;
        uploads.sort_by_key(|upload| upload.slot);

        let mut slots = ImageSlots::default();
        for upload in uploads {
            if upload.bytes.is_empty() {
                continue;
            }
            let path =
                slot_object_path(principal.user_id, listing_id, upload.slot, &upload.file_name);
            let content_type = content_type_for(&path);
            self.images
                .upload(&path, upload.bytes, &content_type)
                .map_err(|source| ListingError::Upload {
                    slot: upload.slot + 1,
                    source,
                })?;
            slots.set(upload.slot, self.images.public_url(&path));
        }
        Ok(slots)
    }

    /// Amount the owner has to pay before the listing goes live.
    pub fn payment_quote(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
    ) -> Result<PaymentQuote, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let listing = self.owned_listing(principal, &listing_id)?;
        lifecycle::ensure_awaiting_payment(&listing)?;

        let category_id = listing
            .category_id
            .ok_or(ListingValidationError::MissingCategory)?;
        let category = self
            .store
            .category(&category_id)?
            .ok_or(ListingValidationError::CategoryUnavailable)?;
        let period_id = listing
            .publication_period_id
            .ok_or(ListingValidationError::PeriodRequired)?;
        let (_, price) = self.enabled_period(&category_id, &period_id)?;

        Ok(PaymentQuote::new(&category, &price))
    }

    /// Periods the listing can be renewed for, with their prices.
    pub fn renewal_options(
        &self,
        principal: Option<&Principal>,
        listing_id: ListingId,
    ) -> Result<Vec<PublicationOption>, ListingError> {
        let principal = principal.ok_or(ListingError::Unauthenticated)?;
        let listing = self.existing_listing(&listing_id)?;
        self.authorize(principal, &listing, ListingAction::Renew)?;
        lifecycle::ensure_renewable(&listing)?;

        let category_id = listing
            .category_id
            .ok_or(ListingValidationError::MissingCategory)?;
        let category = self
            .store
            .category(&category_id)?
            .ok_or(ListingValidationError::CategoryUnavailable)?;
        Ok(publication_options(self.store.as_ref(), &category)?)
    }

    /// Contact data for the public listing page.
    pub fn reveal_contact(&self, listing_id: ListingId) -> Result<ContactDetails, ListingError> {
        let listing = self
            .store
            .fetch_listing(&listing_id)?
            .ok_or(ListingError::PublicNotFound)?;

        let phone = Some(listing.contact_phone.as_str().to_string()).filter(|p| !p.is_empty());
        let email = listing.contact_email.and_then(non_blank);
        if phone.is_none() && email.is_none() {
            return Err(ListingError::NoContact);
        }
        Ok(ContactDetails { phone, email })
    }

    fn existing_listing(&self, listing_id: &ListingId) -> Result<Listing, ListingError> {
        self.store
            .fetch_listing(listing_id)?
            .ok_or(ListingError::NotFound)
    }

    /// Owner-only operations report other users' listings as missing.
    fn owned_listing(
        &self,
        principal: &Principal,
        listing_id: &ListingId,
    ) -> Result<Listing, ListingError> {
        let listing = self.existing_listing(listing_id)?;
        if listing.user_id == principal.user_id {
            Ok(listing)
        } else {
            Err(ListingError::NotFound)
        }
    }

    fn authorize(
        &self,
        principal: &Principal,
        listing: &Listing,
        action: ListingAction,
    ) -> Result<Access, ListingError> {
        if listing.user_id == principal.user_id {
            Ok(Access::Owner)
        } else if principal.can(Capability::ModerateListings) {
            Ok(Access::Moderator)
        } else {
            Err(ListingError::Forbidden(action))
        }
    }

    fn write_scope(
        &self,
        principal: &Principal,
        access: Access,
        action: ListingAction,
    ) -> Result<WriteScope, ListingError> {
        match access {
            Access::Owner => Ok(WriteScope::Owner(principal.user_id)),
            Access::Moderator => self
                .service_credential
                .clone()
                .map(WriteScope::Service)
                .ok_or(ListingError::ElevatedAccessUnavailable(action)),
        }
    }

    /// Category that may host a new listing: visible and without live subcategories.
    fn listable_category(&self, category_id: &CategoryId) -> Result<Category, ListingError> {
        let category = self
            .store
            .category(category_id)?
            .filter(|category| category.status.is_visible())
            .ok_or(ListingValidationError::CategoryUnavailable)?;

        let tree = CategoryTree::new(self.store.categories()?);
        if !tree.is_leaf(category_id) {
            return Err(ListingValidationError::CategoryNotLeaf.into());
        }
        Ok(category)
    }

    fn purchasable_period(
        &self,
        category: Option<&Category>,
        period_id: &PeriodId,
    ) -> Result<(PublicationPeriod, Option<CategoryPeriodPrice>), ListingError> {
        match category {
            Some(category) => {
                let (period, price) = self.enabled_period(&category.id, period_id)?;
                Ok((period, Some(price)))
            }
            None => {
                let period = self
                    .store
                    .period(period_id)?
                    .ok_or(ListingValidationError::PeriodUnavailable)?;
                Ok((period, None))
            }
        }
    }

    fn enabled_period(
        &self,
        category_id: &CategoryId,
        period_id: &PeriodId,
    ) -> Result<(PublicationPeriod, CategoryPeriodPrice), ListingError> {
        let price = self
            .store
            .period_price(category_id, period_id)?
            .ok_or(ListingValidationError::PeriodNotInCategory)?;
        let period = self
            .store
            .period(period_id)?
            .ok_or(ListingValidationError::PeriodUnavailable)?;
        Ok((period, price))
    }

    fn filter_values(
        &self,
        listing_id: ListingId,
        category: Option<&Category>,
        inputs: Vec<FilterValueInput>,
    ) -> Result<Vec<FilterValue>, ListingError> {
        let assigned = match category {
            Some(category) => self.store.category_filter_ids(&category.id)?,
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for input in inputs {
            let value = input.value.and_then(non_blank);
            let option_id = input.option_id;
            if value.is_none() && option_id.is_none() {
                continue;
            }

            if !assigned.contains(&input.filter_id) {
                return Err(ListingValidationError::UnknownFilter.into());
            }
            let filter = self
                .store
                .filter(&input.filter_id)?
                .ok_or(ListingValidationError::UnknownFilter)?;

            if let Some(option_id) = option_id {
                let belongs = self
                    .store
                    .filter_option(&option_id)?
                    .is_some_and(|option| option.filter_id == filter.id);
                if !belongs {
                    return Err(ListingValidationError::InvalidFilterOption.into());
                }
            }
            if filter.kind == FilterKind::Number {
                if let Some(raw) = value.as_deref() {
                    Decimal::from_str(&raw.replace(',', "."))
                        .map_err(|_| ListingValidationError::InvalidNumberFilter)?;
                }
            }

            rows.push(FilterValue {
                listing_id,
                filter_id: filter.id,
                value,
                option_id,
            });
        }
        Ok(rows)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .filter_map(non_blank)
        .take(MAX_TAGS)
        .collect()
}
