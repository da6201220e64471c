use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use mime::Mime;
use serde_json::Value;

use crate::access::{Principal, Role, ServiceCredential, UserId};
use crate::catalog::{
    CatalogRepository, Category, CategoryId, CategoryPeriodPrice, CategoryStatus, Filter,
    FilterId, FilterKind, FilterOption, FilterOptionId, PeriodId, PublicationFee,
    PublicationPeriod,
};
use crate::clock::FixedClock;
use crate::listings::{
    FilterValueInput, ImageStore, ListingService, NewListingInput, StorageError,
};
use crate::store::{InMemoryImageStore, InMemoryStore};

pub(super) const STORAGE_BASE: &str = "http://localhost:3000/storage/v1/object/public";
pub(super) const BUCKET: &str = "listing-images";

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn owner() -> Principal {
    Principal::member(UserId::new()).with_email("sprzedawca@example.com")
}

pub(super) fn moderator() -> Principal {
    Principal::member(UserId::new())
        .with_email("admin@example.com")
        .with_role(Role::Admin)
}

pub(super) struct Catalog {
    pub(super) electronics: Category,
    pub(super) laptop: Category,
    pub(super) giveaway: Category,
    pub(super) week: PublicationPeriod,
    pub(super) fortnight: PublicationPeriod,
    pub(super) month: PublicationPeriod,
    pub(super) brand: Filter,
    pub(super) dell: FilterOption,
    pub(super) ram: Filter,
    pub(super) colour: Filter,
}

fn category(name: &str, parent_id: Option<CategoryId>) -> Category {
    Category {
        id: CategoryId::new(),
        name: name.to_string(),
        icon_name: None,
        parent_id,
        status: CategoryStatus::Active,
        is_free: false,
        publication_fee: PublicationFee::default(),
        default_period_id: None,
    }
}

fn period(label: &str, days_count: u32) -> PublicationPeriod {
    PublicationPeriod {
        id: PeriodId::new(),
        label: label.to_string(),
        days_count,
    }
}

fn price(category: &Category, period: &PublicationPeriod, price_cents: u32) -> CategoryPeriodPrice {
    CategoryPeriodPrice {
        category_id: category.id,
        period_id: period.id,
        price_cents,
    }
}

/// Elektronika > Laptop (paid, 10 zł fee, 7 and 30 days) plus a free root category.
pub(super) fn seed_catalog(store: &InMemoryStore) -> Catalog {
    let week = period("7 dni", 7);
    let fortnight = period("14 dni", 14);
    let month = period("30 dni", 30);
    for entry in [&week, &fortnight, &month] {
        store.insert_period(entry.clone()).expect("insert period");
    }

    let electronics = category("Elektronika", None);
    store
        .insert_category(electronics.clone(), vec![price(&electronics, &week, 0)])
        .expect("insert electronics");

    let mut laptop = category("Laptop", Some(electronics.id));
    laptop.publication_fee = PublicationFee::try_from(1000_i64).expect("fee");
    laptop.default_period_id = Some(month.id);
    let laptop_prices = vec![price(&laptop, &week, 500), price(&laptop, &month, 1500)];
    store
        .insert_category(laptop.clone(), laptop_prices)
        .expect("insert laptop");

    let mut giveaway = category("Oddam za darmo", None);
    giveaway.is_free = true;
    store
        .insert_category(giveaway.clone(), vec![price(&giveaway, &week, 0)])
        .expect("insert giveaway");

    let brand = Filter {
        id: FilterId::new(),
        name: "Marka".to_string(),
        kind: FilterKind::Select,
    };
    let ram = Filter {
        id: FilterId::new(),
        name: "RAM (GB)".to_string(),
        kind: FilterKind::Number,
    };
    let colour = Filter {
        id: FilterId::new(),
        name: "Kolor".to_string(),
        kind: FilterKind::Text,
    };
    for filter in [&brand, &ram, &colour] {
        store.insert_filter(filter.clone()).expect("insert filter");
    }
    let dell = FilterOption {
        id: FilterOptionId::new(),
        filter_id: brand.id,
        value: "Dell".to_string(),
    };
    store
        .insert_filter_option(dell.clone())
        .expect("insert option");
    store
        .assign_filter(&laptop.id, &brand.id)
        .expect("assign brand");
    store.assign_filter(&laptop.id, &ram.id).expect("assign ram");

    Catalog {
        electronics,
        laptop,
        giveaway,
        week,
        fortnight,
        month,
        brand,
        dell,
        ram,
        colour,
    }
}

pub(super) struct Marketplace<S = InMemoryImageStore> {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) images: Arc<S>,
    pub(super) service: Arc<ListingService<InMemoryStore, S>>,
    pub(super) catalog: Catalog,
}

pub(super) fn marketplace() -> Marketplace {
    marketplace_with(
        Arc::new(InMemoryImageStore::new(STORAGE_BASE, BUCKET)),
        Some(ServiceCredential::new("service-role-secret")),
    )
}

pub(super) fn marketplace_with<S>(
    images: Arc<S>,
    credential: Option<ServiceCredential>,
) -> Marketplace<S>
where
    S: ImageStore + 'static,
{
    let store = Arc::new(InMemoryStore::default());
    let catalog = seed_catalog(&store);
    let mut service = ListingService::new(store.clone(), images.clone(), Arc::new(FixedClock(now())));
    if let Some(credential) = credential {
        service = service.with_service_credential(credential);
    }
    Marketplace {
        store,
        images,
        service: Arc::new(service),
        catalog,
    }
}

pub(super) fn laptop_input(catalog: &Catalog) -> NewListingInput {
    NewListingInput {
        title: "Laptop Dell Latitude".to_string(),
        description: "Stan bardzo dobry".to_string(),
        price: Some("1 250,5".to_string()),
        location: "Kraków".to_string(),
        contact_phone: "600 100 200".to_string(),
        images: vec![format!("{STORAGE_BASE}/{BUCKET}/u/l/0.jpg")],
        category_id: Some(catalog.laptop.id),
        filter_values: vec![
            FilterValueInput {
                filter_id: catalog.brand.id,
                value: None,
                option_id: Some(catalog.dell.id),
            },
            FilterValueInput {
                filter_id: catalog.ram.id,
                value: Some("16".to_string()),
                option_id: None,
            },
        ],
        tags: vec!["laptop".to_string(), "  ".to_string(), " dell ".to_string()],
        publication_period_id: Some(catalog.month.id),
        ..NewListingInput::default()
    }
}

/// Storage that refuses every operation.
#[derive(Default)]
pub(super) struct FailingImageStore {
    removals: Mutex<Vec<Vec<String>>>,
}

impl FailingImageStore {
    pub(super) fn removal_attempts(&self) -> Vec<Vec<String>> {
        self.removals.lock().expect("removal mutex poisoned").clone()
    }
}

impl ImageStore for FailingImageStore {
    fn bucket(&self) -> &str {
        BUCKET
    }

    fn upload(&self, _path: &str, _bytes: Vec<u8>, _content_type: &Mime) -> Result<(), StorageError> {
        Err(StorageError::Rejected("Payload too large".to_string()))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{STORAGE_BASE}/{BUCKET}/{path}")
    }

    fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        self.removals
            .lock()
            .expect("removal mutex poisoned")
            .push(paths.to_vec());
        Err(StorageError::Unavailable("bucket offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
