use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::access::{IdentityResolver, Principal, USER_EMAIL_HEADER, USER_ID_HEADER};
use crate::listings::listing_router;

fn router(market: &Marketplace) -> axum::Router {
    listing_router(
        market.service.clone(),
        Arc::new(IdentityResolver::new(["admin@example.com"])),
    )
}

fn request(method: Method, uri: &str, principal: Option<&Principal>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(principal) = principal {
        builder = builder.header(USER_ID_HEADER, principal.user_id.to_string());
        if let Some(email) = principal.email.as_deref() {
            builder = builder.header(USER_EMAIL_HEADER, email);
        }
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

fn listing_body(market: &Marketplace) -> Value {
    let catalog = &market.catalog;
    json!({
        "title": "Laptop Lenovo",
        "price": "2 100",
        "contact_phone": "600100200",
        "category_id": catalog.laptop.id,
        "publication_period_id": catalog.week.id,
        "filter_values": [{ "filter_id": catalog.ram.id, "value": "8" }],
    })
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() {
    let market = marketplace();
    let response = router(&market)
        .oneshot(request(
            Method::POST,
            "/api/v1/listings",
            None,
            Some(listing_body(&market)),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_flows_from_payment_to_archive() {
    let market = marketplace();
    let seller = owner();

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            "/api/v1/listings",
            Some(&seller),
            Some(listing_body(&market)),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json_body(response).await;
    assert_eq!(created["status"], "pending_payment");
    let id = created["id"].as_str().expect("listing id").to_string();

    let response = router(&market)
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/listings/{id}/payment"),
            Some(&seller),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let quote = read_json_body(response).await;
    assert_eq!(quote["total_cents"], 1500);

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/listings/{id}/activate"),
            Some(&seller),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/listings/{id}/archive"),
            Some(&owner()),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Brak uprawnień do zakończenia tego ogłoszenia.");
    assert_eq!(payload["kind"], "forbidden");

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/listings/{id}/archive"),
            Some(&seller),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], "archived");

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/listings/{id}/renew"),
            Some(&seller),
            Some(json!({ "period_id": market.catalog.month.id })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], "active");

    let response = router(&market)
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/listings/{id}/contact"),
            None,
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["phone"], "600100200");
}

#[tokio::test]
async fn zero_price_is_unprocessable() {
    let market = marketplace();
    let mut body = listing_body(&market);
    body["price"] = json!("0");

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            "/api/v1/listings",
            Some(&owner()),
            Some(body),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "W tej kategorii cena musi być większa od zera.");
}

#[tokio::test]
async fn upload_decodes_base64_payloads() {
    let market = marketplace();
    let seller = owner();
    let listing = market
        .service
        .create(Some(&seller), laptop_input(&market.catalog))
        .expect("listing created");
    let uri = format!("/api/v1/listings/{}/images/upload", listing.id);

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            &uri,
            Some(&seller),
            Some(json!({
                "files": [{ "slot": 0, "file_name": "front.png", "data": STANDARD.encode(b"png-bytes") }],
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let first = payload["images"][0].as_str().expect("slot url");
    assert!(first.ends_with(&format!("{}/{}/0.png", seller.user_id, listing.id)));
    assert_eq!(payload["images"][1], "");

    let response = router(&market)
        .oneshot(request(
            Method::POST,
            &uri,
            Some(&seller),
            Some(json!({
                "files": [{ "slot": 1, "file_name": "x.jpg", "data": "%%%" }],
            })),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_listing_contact_is_not_found() {
    let market = marketplace();
    let response = router(&market)
        .oneshot(request(
            Method::GET,
            &format!("/api/v1/listings/{}/contact", uuid::Uuid::new_v4()),
            None,
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(response).await["error"], "Nie znaleziono ogłoszenia.");
}
