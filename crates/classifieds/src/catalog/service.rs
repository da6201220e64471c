use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Category, CategoryId, CategoryPeriodPrice, CategoryStatus, Filter, FilterId, FilterKind,
    FilterOption, FilterOptionId, FilterWithOptions, PeriodId, PublicationFee, PublicationOption,
    Visibility,
};
use super::repository::CatalogRepository;
use super::tree::CategoryTree;
use crate::access::{Capability, Principal};
use crate::clock::Clock;
use crate::error::ErrorKind;
use crate::store::RepositoryError;

/// Admin form for creating or editing a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub icon_name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub publication_fee_cents: i64,
    #[serde(default)]
    pub default_period_id: Option<PeriodId>,
    #[serde(default)]
    pub periods: Vec<PeriodPriceDraft>,
}

/// A period the admin enabled for the category, priced in cents.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodPriceDraft {
    pub period_id: PeriodId,
    pub price_cents: i64,
}

/// Visible category with its visible descendants.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub icon_name: Option<String>,
    pub is_free: bool,
    pub publication_fee: PublicationFee,
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogValidationError {
    #[error("Nazwa jest wymagana.")]
    NameRequired,
    #[error("Nieprawidłowy koszt publikacji.")]
    InvalidFee,
    #[error("Cena za okres nie może być ujemna.")]
    NegativePeriodPrice,
    #[error("Cena za okres jest zbyt wysoka.")]
    PeriodPriceOutOfRange,
    #[error("Wybierz co najmniej jeden okres publikacji.")]
    NoPeriods,
    #[error("Okres domyślny musi być jednym z wybranych okresów.")]
    DefaultNotEnabled,
    #[error("Wybrany okres publikacji nie jest dostępny.")]
    UnknownPeriod,
    #[error("Wybrana kategoria nadrzędna nie istnieje.")]
    InvalidParent,
    #[error("Kategoria nadrzędna nie może być tą samą kategorią ani jej podkategorią.")]
    ParentCycle,
    #[error("Nazwa i typ są wymagane.")]
    FilterFieldsRequired,
    #[error("Nieprawidłowy typ.")]
    InvalidFilterKind,
    #[error("Filtr i wartość są wymagane.")]
    OptionFieldsRequired,
}

/// Error raised by the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Musisz być zalogowany.")]
    Unauthenticated,
    #[error("Brak uprawnień.")]
    Forbidden,
    #[error("Kategoria nie istnieje.")]
    CategoryNotFound,
    #[error("Filtr nie istnieje.")]
    FilterNotFound,
    #[error("Nie można usunąć kategorii z podkategoriami. Usuń lub przenieś najpierw podkategorie.")]
    HasChildren,
    #[error("Kategoria została usunięta. Przywróć ją przed zmianą widoczności.")]
    CategoryDeleted,
    #[error(transparent)]
    Validation(#[from] CatalogValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Unauthenticated => ErrorKind::Unauthenticated,
            CatalogError::Forbidden => ErrorKind::Forbidden,
            CatalogError::CategoryNotFound | CatalogError::FilterNotFound => ErrorKind::NotFound,
            CatalogError::HasChildren | CatalogError::CategoryDeleted => ErrorKind::Conflict,
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::Repository(err) => err.kind(),
        }
    }
}

struct ValidatedDraft {
    name: String,
    icon_name: Option<String>,
    parent_id: Option<CategoryId>,
    fee: PublicationFee,
    default_period_id: Option<PeriodId>,
    prices: BTreeMap<PeriodId, u32>,
}

/// Admin CRUD over categories and filters plus the public catalog reads.
pub struct CatalogService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> CatalogService<R>
where
    R: CatalogRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn add_category(
        &self,
        principal: Option<&Principal>,
        draft: CategoryDraft,
    ) -> Result<Category, CatalogError> {
        let admin = require_admin(principal)?;
        let validated = self.validate_draft(draft, None)?;
        let category = Category {
            id: CategoryId::new(),
            name: validated.name,
            icon_name: validated.icon_name,
            parent_id: validated.parent_id,
            status: CategoryStatus::Active,
            is_free: false,
            publication_fee: validated.fee,
            default_period_id: validated.default_period_id,
        };
        let prices = price_rows(category.id, &validated.prices);

        let stored = self.repository.insert_category(category, prices)?;
        info!(category_id = %stored.id, user_id = %admin.user_id, "category added");
        Ok(stored)
    }

    pub fn update_category(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Category, CatalogError> {
        let admin = require_admin(principal)?;
        let mut category = self.existing_category(&category_id)?;
        let validated = self.validate_draft(draft, Some(category_id))?;

        category.name = validated.name;
        category.icon_name = validated.icon_name;
        category.parent_id = validated.parent_id;
        category.publication_fee = validated.fee;
        category.default_period_id = validated.default_period_id;
        let prices = price_rows(category_id, &validated.prices);

        self.repository
            .update_category(category.clone(), Some(prices))?;
        info!(category_id = %category_id, user_id = %admin.user_id, "category updated");
        Ok(category)
    }

    pub fn set_category_free(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
        is_free: bool,
    ) -> Result<(), CatalogError> {
        require_admin(principal)?;
        let mut category = self.existing_category(&category_id)?;
        category.is_free = is_free;
        self.repository.update_category(category, None)?;
        info!(category_id = %category_id, is_free, "category pricing flag changed");
        Ok(())
    }

    pub fn set_category_visibility(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
        visibility: Visibility,
    ) -> Result<(), CatalogError> {
        require_admin(principal)?;
        let mut category = self.existing_category(&category_id)?;
        if category.status.is_deleted() {
            return Err(CatalogError::CategoryDeleted);
        }
        category.status = visibility.into();
        self.repository.update_category(category, None)?;
        info!(category_id = %category_id, ?visibility, "category visibility changed");
        Ok(())
    }

    /// Marks the category deleted. Listings referencing it are left untouched.
    pub fn soft_delete_category(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
    ) -> Result<(), CatalogError> {
        require_admin(principal)?;
        let mut category = self.existing_category(&category_id)?;
        if category.status.is_deleted() {
            return Ok(());
        }

        let tree = CategoryTree::new(self.repository.categories()?);
        if !tree.is_leaf(&category_id) {
            return Err(CatalogError::HasChildren);
        }

        category.status = CategoryStatus::Deleted {
            deleted_at: self.clock.now(),
        };
        self.repository.update_category(category, None)?;
        info!(category_id = %category_id, "category soft-deleted");
        Ok(())
    }

    pub fn restore_category(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
    ) -> Result<(), CatalogError> {
        require_admin(principal)?;
        let mut category = self.existing_category(&category_id)?;
        if !category.status.is_deleted() {
            return Ok(());
        }
        category.status = CategoryStatus::Active;
        self.repository.update_category(category, None)?;
        info!(category_id = %category_id, "category restored");
        Ok(())
    }

    pub fn create_filter(
        &self,
        principal: Option<&Principal>,
        name: &str,
        kind: &str,
    ) -> Result<Filter, CatalogError> {
        require_admin(principal)?;
        let name = name.trim();
        if name.is_empty() || kind.trim().is_empty() {
            return Err(CatalogValidationError::FilterFieldsRequired.into());
        }
        let kind = FilterKind::parse(kind).ok_or(CatalogValidationError::InvalidFilterKind)?;

        let filter = Filter {
            id: FilterId::new(),
            name: name.to_string(),
            kind,
        };
        self.repository.insert_filter(filter.clone())?;
        Ok(filter)
    }

    pub fn add_filter_option(
        &self,
        principal: Option<&Principal>,
        filter_id: FilterId,
        value: &str,
    ) -> Result<FilterOption, CatalogError> {
        require_admin(principal)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(CatalogValidationError::OptionFieldsRequired.into());
        }
        self.repository
            .filter(&filter_id)?
            .ok_or(CatalogError::FilterNotFound)?;

        let option = FilterOption {
            id: FilterOptionId::new(),
            filter_id,
            value: value.to_string(),
        };
        self.repository.insert_filter_option(option.clone())?;
        Ok(option)
    }

    pub fn assign_filter(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
        filter_id: FilterId,
    ) -> Result<(), CatalogError> {
        require_admin(principal)?;
        self.existing_category(&category_id)?;
        self.repository
            .filter(&filter_id)?
            .ok_or(CatalogError::FilterNotFound)?;
        self.repository.assign_filter(&category_id, &filter_id)?;
        Ok(())
    }

    pub fn unassign_filter(
        &self,
        principal: Option<&Principal>,
        category_id: CategoryId,
        filter_id: FilterId,
    ) -> Result<(), CatalogError> {
        require_admin(principal)?;
        self.repository.unassign_filter(&category_id, &filter_id)?;
        Ok(())
    }

    /// Filters attached to the category with their options; unknown categories have none.
    pub fn filters_for_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<FilterWithOptions>, CatalogError> {
        Ok(filters_for_category(self.repository.as_ref(), &category_id)?)
    }

    pub fn publication_options(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<PublicationOption>, CatalogError> {
        let category = self.existing_category(&category_id)?;
        Ok(publication_options(self.repository.as_ref(), &category)?)
    }

    pub fn category_tree(&self) -> Result<Vec<CategoryNode>, CatalogError> {
        let tree = CategoryTree::visible(self.repository.categories()?);
        Ok(build_nodes(&tree, None))
    }

    fn existing_category(&self, id: &CategoryId) -> Result<Category, CatalogError> {
        self.repository
            .category(id)?
            .ok_or(CatalogError::CategoryNotFound)
    }

    fn validate_draft(
        &self,
        draft: CategoryDraft,
        editing: Option<CategoryId>,
    ) -> Result<ValidatedDraft, CatalogError> {
        let fee = PublicationFee::try_from(draft.publication_fee_cents)
            .map_err(|_| CatalogValidationError::InvalidFee)?;

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogValidationError::NameRequired.into());
        }

        let mut prices = BTreeMap::new();
        for entry in draft.periods {
            if entry.price_cents < 0 {
                return Err(CatalogValidationError::NegativePeriodPrice.into());
            }
            let cents = u32::try_from(entry.price_cents)
                .map_err(|_| CatalogValidationError::PeriodPriceOutOfRange)?;
            if self.repository.period(&entry.period_id)?.is_none() {
                return Err(CatalogValidationError::UnknownPeriod.into());
            }
            prices.insert(entry.period_id, cents);
        }
        if prices.is_empty() {
            return Err(CatalogValidationError::NoPeriods.into());
        }

        if let Some(default) = draft.default_period_id {
            if !prices.contains_key(&default) {
                return Err(CatalogValidationError::DefaultNotEnabled.into());
            }
        }

        if let Some(parent_id) = draft.parent_id {
            let tree = CategoryTree::new(self.repository.categories()?);
            let parent_usable = tree
                .get(&parent_id)
                .is_some_and(|parent| !parent.status.is_deleted());
            if !parent_usable {
                return Err(CatalogValidationError::InvalidParent.into());
            }
            if let Some(editing) = editing {
                if tree.is_within(&parent_id, &editing) {
                    return Err(CatalogValidationError::ParentCycle.into());
                }
            }
        }

        let icon_name = draft
            .icon_name
            .map(|icon| icon.trim().to_string())
            .filter(|icon| !icon.is_empty());

        Ok(ValidatedDraft {
            name,
            icon_name,
            parent_id: draft.parent_id,
            fee,
            default_period_id: draft.default_period_id,
            prices,
        })
    }
}

fn require_admin(principal: Option<&Principal>) -> Result<&Principal, CatalogError> {
    let principal = principal.ok_or(CatalogError::Unauthenticated)?;
    if principal.can(Capability::ManageCatalog) {
        Ok(principal)
    } else {
        Err(CatalogError::Forbidden)
    }
}

fn price_rows(category_id: CategoryId, prices: &BTreeMap<PeriodId, u32>) -> Vec<CategoryPeriodPrice> {
    prices
        .iter()
        .map(|(period_id, price_cents)| CategoryPeriodPrice {
            category_id,
            period_id: *period_id,
            price_cents: *price_cents,
        })
        .collect()
}

fn build_nodes(tree: &CategoryTree, parent: Option<CategoryId>) -> Vec<CategoryNode> {
    tree.children_of(parent)
        .map(|category| CategoryNode {
            id: category.id,
            name: category.name.clone(),
            icon_name: category.icon_name.clone(),
            is_free: category.is_free,
            publication_fee: category.publication_fee,
            children: build_nodes(tree, Some(category.id)),
        })
        .collect()
}

/// Enabled periods of a category with their prices, shortest first.
pub fn publication_options<R>(
    repository: &R,
    category: &Category,
) -> Result<Vec<PublicationOption>, RepositoryError>
where
    R: CatalogRepository + ?Sized,
{
    let mut options = Vec::new();
    for price in repository.period_prices(&category.id)? {
        if let Some(period) = repository.period(&price.period_id)? {
            options.push(PublicationOption {
                period_id: period.id,
                label: period.label,
                days_count: period.days_count,
                price_cents: price.price_cents,
                is_default: category.default_period_id == Some(price.period_id),
            });
        }
    }
    options.sort_by(|a, b| {
        a.days_count
            .cmp(&b.days_count)
            .then_with(|| a.label.cmp(&b.label))
    });
    Ok(options)
}

pub fn filters_for_category<R>(
    repository: &R,
    category_id: &CategoryId,
) -> Result<Vec<FilterWithOptions>, RepositoryError>
where
    R: CatalogRepository + ?Sized,
{
    let mut filters = Vec::new();
    for filter_id in repository.category_filter_ids(category_id)? {
        if let Some(filter) = repository.filter(&filter_id)? {
            let options = repository.filter_options(&filter_id)?;
            filters.push(FilterWithOptions {
                id: filter.id,
                name: filter.name,
                kind: filter.kind,
                options,
            });
        }
    }
    Ok(filters)
}
