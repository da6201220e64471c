use super::domain::{
    Category, CategoryId, CategoryPeriodPrice, Filter, FilterId, FilterOption, FilterOptionId,
    PeriodId, PublicationPeriod,
};
use crate::store::RepositoryError;

/// Storage abstraction for categories, the period catalog and attribute filters.
pub trait CatalogRepository: Send + Sync {
    fn category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError>;
    fn categories(&self) -> Result<Vec<Category>, RepositoryError>;
    /// Inserts the category and its enabled periods as one unit.
    fn insert_category(
        &self,
        category: Category,
        prices: Vec<CategoryPeriodPrice>,
    ) -> Result<Category, RepositoryError>;
    /// Updates the row; when `prices` is given the enabled-period table is replaced as one unit.
    fn update_category(
        &self,
        category: Category,
        prices: Option<Vec<CategoryPeriodPrice>>,
    ) -> Result<(), RepositoryError>;

    fn period(&self, id: &PeriodId) -> Result<Option<PublicationPeriod>, RepositoryError>;
    fn periods(&self) -> Result<Vec<PublicationPeriod>, RepositoryError>;
    fn insert_period(&self, period: PublicationPeriod) -> Result<(), RepositoryError>;
    fn period_price(
        &self,
        category_id: &CategoryId,
        period_id: &PeriodId,
    ) -> Result<Option<CategoryPeriodPrice>, RepositoryError>;
    fn period_prices(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<CategoryPeriodPrice>, RepositoryError>;

    fn filter(&self, id: &FilterId) -> Result<Option<Filter>, RepositoryError>;
    fn insert_filter(&self, filter: Filter) -> Result<(), RepositoryError>;
    fn filter_option(&self, id: &FilterOptionId) -> Result<Option<FilterOption>, RepositoryError>;
    fn filter_options(&self, filter_id: &FilterId) -> Result<Vec<FilterOption>, RepositoryError>;
    fn insert_filter_option(&self, option: FilterOption) -> Result<(), RepositoryError>;
    fn assign_filter(
        &self,
        category_id: &CategoryId,
        filter_id: &FilterId,
    ) -> Result<(), RepositoryError>;
    fn unassign_filter(
        &self,
        category_id: &CategoryId,
        filter_id: &FilterId,
    ) -> Result<(), RepositoryError>;
    fn category_filter_ids(&self, category_id: &CategoryId)
        -> Result<Vec<FilterId>, RepositoryError>;
}
