use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::access::{Principal, Role, UserId};
use crate::catalog::{
    CatalogRepository, CatalogService, CategoryDraft, PeriodId, PeriodPriceDraft,
    PublicationPeriod,
};
use crate::clock::FixedClock;
use crate::store::InMemoryStore;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 12, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin() -> Principal {
    Principal::member(UserId::new())
        .with_email("admin@example.com")
        .with_role(Role::Admin)
}

pub(super) fn member() -> Principal {
    Principal::member(UserId::new()).with_email("jan@example.com")
}

pub(super) struct Periods {
    pub(super) week: PublicationPeriod,
    pub(super) fortnight: PublicationPeriod,
    pub(super) month: PublicationPeriod,
}

pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) service: Arc<CatalogService<InMemoryStore>>,
    pub(super) periods: Periods,
}

fn period(label: &str, days_count: u32) -> PublicationPeriod {
    PublicationPeriod {
        id: PeriodId::new(),
        label: label.to_string(),
        days_count,
    }
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::default());
    let periods = Periods {
        week: period("7 dni", 7),
        fortnight: period("14 dni", 14),
        month: period("30 dni", 30),
    };
    for entry in [&periods.week, &periods.fortnight, &periods.month] {
        store.insert_period(entry.clone()).expect("insert period");
    }
    let service = Arc::new(CatalogService::new(
        store.clone(),
        Arc::new(FixedClock(now())),
    ));
    Fixture {
        store,
        service,
        periods,
    }
}

pub(super) fn draft(name: &str, prices: &[(&PublicationPeriod, i64)]) -> CategoryDraft {
    CategoryDraft {
        name: name.to_string(),
        periods: prices
            .iter()
            .map(|(period, price_cents)| PeriodPriceDraft {
                period_id: period.id,
                price_cents: *price_cents,
            })
            .collect(),
        ..CategoryDraft::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
