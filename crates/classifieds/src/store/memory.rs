use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use mime::Mime;

use super::RepositoryError;
use crate::access::{UserId, WriteScope};
use crate::accounts::{SettingsRepository, UserSettings};
use crate::catalog::{
    CatalogRepository, Category, CategoryId, CategoryPeriodPrice, Filter, FilterId, FilterOption,
    FilterOptionId, PeriodId, PublicationPeriod,
};
use crate::listings::{
    FilterValue, ImageStore, Listing, ListingId, ListingRepository, StorageError,
};

#[derive(Debug, Default)]
struct StoreState {
    categories: BTreeMap<CategoryId, Category>,
    periods: BTreeMap<PeriodId, PublicationPeriod>,
    prices: BTreeMap<(CategoryId, PeriodId), CategoryPeriodPrice>,
    filters: BTreeMap<FilterId, Filter>,
    options: BTreeMap<FilterOptionId, FilterOption>,
    assignments: BTreeSet<(CategoryId, FilterId)>,
    listings: HashMap<ListingId, Listing>,
    filter_values: HashMap<ListingId, Vec<FilterValue>>,
    settings: HashMap<UserId, UserSettings>,
}

impl StoreState {
    fn ensure_periods(&self, prices: &[CategoryPeriodPrice]) -> Result<(), RepositoryError> {
        match prices
            .iter()
            .find(|price| !self.periods.contains_key(&price.period_id))
        {
            Some(price) => Err(RepositoryError::MissingReference(format!(
                "publication period {}",
                price.period_id
            ))),
            None => Ok(()),
        }
    }

    fn replace_prices(&mut self, category_id: CategoryId, prices: Vec<CategoryPeriodPrice>) {
        self.prices.retain(|(owner, _), _| *owner != category_id);
        for price in prices {
            self.prices.insert(
                (category_id, price.period_id),
                CategoryPeriodPrice {
                    category_id,
                    ..price
                },
            );
        }
    }

    fn owned_listing(
        &self,
        id: &ListingId,
        scope: &WriteScope,
    ) -> Result<&Listing, RepositoryError> {
        self.listings
            .get(id)
            .filter(|listing| scope.permits(listing.user_id))
            .ok_or(RepositoryError::NotFound)
    }
}

/// Process-local store backing every repository trait. Multi-row writes validate all references
/// before touching state, so a failed call leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl CatalogRepository for InMemoryStore {
    fn category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state()?.categories.get(id).cloned())
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.state()?.categories.values().cloned().collect())
    }

    fn insert_category(
        &self,
        category: Category,
        prices: Vec<CategoryPeriodPrice>,
    ) -> Result<Category, RepositoryError> {
        let mut state = self.state()?;
        if state.categories.contains_key(&category.id) {
            return Err(RepositoryError::Conflict);
        }
        if let Some(parent_id) = category.parent_id {
            if !state.categories.contains_key(&parent_id) {
                return Err(RepositoryError::MissingReference(format!(
                    "parent category {parent_id}"
                )));
            }
        }
        state.ensure_periods(&prices)?;

        state.replace_prices(category.id, prices);
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn update_category(
        &self,
        category: Category,
        prices: Option<Vec<CategoryPeriodPrice>>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if !state.categories.contains_key(&category.id) {
            return Err(RepositoryError::NotFound);
        }
        if let Some(prices) = &prices {
            state.ensure_periods(prices)?;
        }

        if let Some(prices) = prices {
            state.replace_prices(category.id, prices);
        }
        state.categories.insert(category.id, category);
        Ok(())
    }

    fn period(&self, id: &PeriodId) -> Result<Option<PublicationPeriod>, RepositoryError> {
        Ok(self.state()?.periods.get(id).cloned())
    }

    fn periods(&self) -> Result<Vec<PublicationPeriod>, RepositoryError> {
        let mut periods: Vec<_> = self.state()?.periods.values().cloned().collect();
        periods.sort_by(|a, b| a.days_count.cmp(&b.days_count).then(a.label.cmp(&b.label)));
        Ok(periods)
    }

    fn insert_period(&self, period: PublicationPeriod) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.periods.contains_key(&period.id) {
            return Err(RepositoryError::Conflict);
        }
        state.periods.insert(period.id, period);
        Ok(())
    }

    fn period_price(
        &self,
        category_id: &CategoryId,
        period_id: &PeriodId,
    ) -> Result<Option<CategoryPeriodPrice>, RepositoryError> {
        Ok(self
            .state()?
            .prices
            .get(&(*category_id, *period_id))
            .cloned())
    }

    fn period_prices(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<CategoryPeriodPrice>, RepositoryError> {
        Ok(self
            .state()?
            .prices
            .values()
            .filter(|price| price.category_id == *category_id)
            .cloned()
            .collect())
    }

    fn filter(&self, id: &FilterId) -> Result<Option<Filter>, RepositoryError> {
        Ok(self.state()?.filters.get(id).cloned())
    }

    fn insert_filter(&self, filter: Filter) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if state.filters.contains_key(&filter.id) {
            return Err(RepositoryError::Conflict);
        }
        state.filters.insert(filter.id, filter);
        Ok(())
    }

    fn filter_option(&self, id: &FilterOptionId) -> Result<Option<FilterOption>, RepositoryError> {
        Ok(self.state()?.options.get(id).cloned())
    }

    fn filter_options(&self, filter_id: &FilterId) -> Result<Vec<FilterOption>, RepositoryError> {
        let mut options: Vec<_> = self
            .state()?
            .options
            .values()
            .filter(|option| option.filter_id == *filter_id)
            .cloned()
            .collect();
        options.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(options)
    }

    fn insert_filter_option(&self, option: FilterOption) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if !state.filters.contains_key(&option.filter_id) {
            return Err(RepositoryError::MissingReference(format!(
                "filter {}",
                option.filter_id.0
            )));
        }
        if state.options.contains_key(&option.id) {
            return Err(RepositoryError::Conflict);
        }
        state.options.insert(option.id, option);
        Ok(())
    }

    fn assign_filter(
        &self,
        category_id: &CategoryId,
        filter_id: &FilterId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        if !state.categories.contains_key(category_id) {
            return Err(RepositoryError::MissingReference(format!(
                "category {category_id}"
            )));
        }
        if !state.filters.contains_key(filter_id) {
            return Err(RepositoryError::MissingReference(format!(
                "filter {}",
                filter_id.0
            )));
        }
        state.assignments.insert((*category_id, *filter_id));
        Ok(())
    }

    fn unassign_filter(
        &self,
        category_id: &CategoryId,
        filter_id: &FilterId,
    ) -> Result<(), RepositoryError> {
        self.state()?
            .assignments
            .remove(&(*category_id, *filter_id));
        Ok(())
    }

    fn category_filter_ids(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<FilterId>, RepositoryError> {
        Ok(self
            .state()?
            .assignments
            .iter()
            .filter(|(owner, _)| owner == category_id)
            .map(|(_, filter_id)| *filter_id)
            .collect())
    }
}

impl ListingRepository for InMemoryStore {
    fn insert_listing(
        &self,
        listing: Listing,
        filter_values: Vec<FilterValue>,
    ) -> Result<Listing, RepositoryError> {
        let mut state = self.state()?;
        if state.listings.contains_key(&listing.id) {
            return Err(RepositoryError::Conflict);
        }
        if let Some(category_id) = listing.category_id {
            if !state.categories.contains_key(&category_id) {
                return Err(RepositoryError::MissingReference(format!(
                    "category {category_id}"
                )));
            }
        }
        if let Some(period_id) = listing.publication_period_id {
            if !state.periods.contains_key(&period_id) {
                return Err(RepositoryError::MissingReference(format!(
                    "publication period {period_id}"
                )));
            }
        }
        if let Some(value) = filter_values
            .iter()
            .find(|value| !state.filters.contains_key(&value.filter_id))
        {
            return Err(RepositoryError::MissingReference(format!(
                "filter {}",
                value.filter_id.0
            )));
        }

        let values = filter_values
            .into_iter()
            .map(|value| FilterValue {
                listing_id: listing.id,
                ..value
            })
            .collect();
        state.filter_values.insert(listing.id, values);
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        Ok(self.state()?.listings.get(id).cloned())
    }

    fn listings_by_owner(&self, user_id: &UserId) -> Result<Vec<Listing>, RepositoryError> {
        let mut listings: Vec<_> = self
            .state()?
            .listings
            .values()
            .filter(|listing| listing.user_id == *user_id)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(listings)
    }

    fn update_listing(&self, listing: Listing, scope: &WriteScope) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        let owner = state.owned_listing(&listing.id, scope)?.user_id;
        state.listings.insert(
            listing.id,
            Listing {
                user_id: owner,
                ..listing
            },
        );
        Ok(())
    }

    fn delete_listing(&self, id: &ListingId, scope: &WriteScope) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.owned_listing(id, scope)?;
        state.listings.remove(id);
        state.filter_values.remove(id);
        Ok(())
    }

    fn filter_values(&self, id: &ListingId) -> Result<Vec<FilterValue>, RepositoryError> {
        Ok(self
            .state()?
            .filter_values
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

impl SettingsRepository for InMemoryStore {
    fn settings(&self, user_id: &UserId) -> Result<Option<UserSettings>, RepositoryError> {
        Ok(self.state()?.settings.get(user_id).cloned())
    }

    fn upsert_settings(&self, settings: UserSettings) -> Result<(), RepositoryError> {
        self.state()?.settings.insert(settings.user_id, settings);
        Ok(())
    }
}

/// Image store keeping objects in memory and serving them under `{base}/{bucket}/{path}`.
#[derive(Debug)]
pub struct InMemoryImageStore {
    public_base_url: String,
    bucket: String,
    objects: Mutex<BTreeMap<String, (Mime, Vec<u8>)>>,
}

impl InMemoryImageStore {
    pub fn new(public_base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    /// Paths of every stored object, sorted.
    pub fn object_paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn content_type(&self, path: &str) -> Option<Mime> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(path).map(|(mime, _)| mime.clone()))
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeMap<String, (Mime, Vec<u8>)>>, StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Unavailable("image store mutex poisoned".to_string()))
    }
}

impl ImageStore for InMemoryImageStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &Mime) -> Result<(), StorageError> {
        if path.trim().is_empty() {
            return Err(StorageError::Rejected("pusta ścieżka pliku".to_string()));
        }
        self.objects()?
            .insert(path.to_string(), (content_type.clone(), bytes));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, path)
    }

    fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        let mut objects = self.objects()?;
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}
