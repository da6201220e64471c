use classifieds::access::{IdentityResolver, Principal, Role, ServiceCredential, UserId};
use classifieds::accounts::SettingsService;
use classifieds::assist::{AssistService, CompletionClient, OpenAiClient};
use classifieds::catalog::{
    CatalogError, CatalogRepository, CatalogService, Category, CategoryDraft, PeriodId,
    PeriodPriceDraft, PublicationPeriod,
};
use classifieds::clock::Clock;
use classifieds::config::AppConfig;
use classifieds::error::AppError;
use classifieds::listings::ListingService;
use classifieds::store::{InMemoryImageStore, InMemoryStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every service wired against one in-memory store.
pub(crate) struct Marketplace {
    pub(crate) store: Arc<InMemoryStore>,
    pub(crate) identity: Arc<IdentityResolver>,
    pub(crate) catalog: Arc<CatalogService<InMemoryStore>>,
    pub(crate) listings: Arc<ListingService<InMemoryStore, InMemoryImageStore>>,
    pub(crate) settings: Arc<SettingsService<InMemoryStore>>,
    pub(crate) assist: Arc<AssistService<InMemoryStore>>,
}

impl Marketplace {
    pub(crate) fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let images = Arc::new(InMemoryImageStore::new(
            config.storage.public_base_url.clone(),
            config.storage.bucket.clone(),
        ));

        let mut listings = ListingService::new(store.clone(), images, clock.clone());
        if let Some(secret) = &config.access.service_credential {
            listings = listings.with_service_credential(ServiceCredential::new(secret.clone()));
        }

        let client = OpenAiClient::from_config(&config.assist)
            .map(|client| Arc::new(client) as Arc<dyn CompletionClient>);

        Self {
            identity: Arc::new(IdentityResolver::new(&config.access.admin_emails)),
            catalog: Arc::new(CatalogService::new(store.clone(), clock.clone())),
            listings: Arc::new(listings),
            settings: Arc::new(SettingsService::new(store.clone(), clock)),
            assist: Arc::new(AssistService::new(store.clone(), client)),
            store,
        }
    }
}

/// The standard publication periods offered by the marketplace.
pub(crate) struct PeriodCatalog {
    pub(crate) week: PublicationPeriod,
    pub(crate) fortnight: PublicationPeriod,
    pub(crate) month: PublicationPeriod,
}

pub(crate) fn seed_periods(store: &InMemoryStore) -> Result<PeriodCatalog, AppError> {
    let period = |label: &str, days_count: u32| PublicationPeriod {
        id: PeriodId::new(),
        label: label.to_string(),
        days_count,
    };
    let periods = PeriodCatalog {
        week: period("7 dni", 7),
        fortnight: period("14 dni", 14),
        month: period("30 dni", 30),
    };
    for entry in [&periods.week, &periods.fortnight, &periods.month] {
        store
            .insert_period(entry.clone())
            .map_err(CatalogError::from)?;
    }
    Ok(periods)
}

/// Sample tree used by development servers and the CLI demo.
pub(crate) struct SampleCatalog {
    pub(crate) periods: PeriodCatalog,
    pub(crate) electronics: Category,
    pub(crate) laptops: Category,
    pub(crate) giveaway: Category,
}

pub(crate) fn seed_sample_catalog(
    store: &InMemoryStore,
    catalog: &CatalogService<InMemoryStore>,
) -> Result<SampleCatalog, AppError> {
    let periods = seed_periods(store)?;
    let operator = Principal::member(UserId(Uuid::nil())).with_role(Role::Admin);
    let priced = |entries: &[(&PublicationPeriod, i64)]| {
        entries
            .iter()
            .map(|(period, price_cents)| PeriodPriceDraft {
                period_id: period.id,
                price_cents: *price_cents,
            })
            .collect::<Vec<_>>()
    };

    let electronics = catalog.add_category(
        Some(&operator),
        CategoryDraft {
            name: "Elektronika".to_string(),
            icon_name: Some("laptop".to_string()),
            default_period_id: Some(periods.month.id),
            periods: priced(&[(&periods.week, 0), (&periods.month, 0)]),
            ..CategoryDraft::default()
        },
    )?;
    let laptops = catalog.add_category(
        Some(&operator),
        CategoryDraft {
            name: "Laptopy".to_string(),
            parent_id: Some(electronics.id),
            publication_fee_cents: 1000,
            default_period_id: Some(periods.month.id),
            periods: priced(&[
                (&periods.week, 500),
                (&periods.fortnight, 900),
                (&periods.month, 1500),
            ]),
            ..CategoryDraft::default()
        },
    )?;
    let giveaway = catalog.add_category(
        Some(&operator),
        CategoryDraft {
            name: "Oddam za darmo".to_string(),
            icon_name: Some("gift".to_string()),
            default_period_id: Some(periods.fortnight.id),
            periods: priced(&[(&periods.fortnight, 0)]),
            ..CategoryDraft::default()
        },
    )?;
    catalog.set_category_free(Some(&operator), giveaway.id, true)?;

    let brand = catalog.create_filter(Some(&operator), "Marka", "select")?;
    for value in ["Dell", "Lenovo", "Apple"] {
        catalog.add_filter_option(Some(&operator), brand.id, value)?;
    }
    let ram = catalog.create_filter(Some(&operator), "RAM (GB)", "number")?;
    catalog.assign_filter(Some(&operator), laptops.id, brand.id)?;
    catalog.assign_filter(Some(&operator), laptops.id, ram.id)?;

    Ok(SampleCatalog {
        periods,
        electronics,
        laptops,
        giveaway,
    })
}
