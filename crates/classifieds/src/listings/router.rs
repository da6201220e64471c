use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::domain::{ListingId, NewListingInput};
use super::error::ListingError;
use super::service::ListingService;
use super::storage::{ImageStore, ImageUpload};
use crate::access::IdentityResolver;
use crate::catalog::PeriodId;
use crate::error::{error_response, ErrorKind};
use crate::store::MarketplaceStore;

pub struct ListingRoutes<R, S> {
    service: Arc<ListingService<R, S>>,
    identity: Arc<IdentityResolver>,
}

impl<R, S> Clone for ListingRoutes<R, S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RenewRequest {
    #[serde(default)]
    period_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesRequest {
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadRequest {
    #[serde(default)]
    files: Vec<UploadedFile>,
}

/// One file of an upload request; `data` carries the base64-encoded bytes.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadedFile {
    slot: usize,
    file_name: String,
    data: String,
}

/// Router exposing the listing lifecycle, image management and public contact reveal.
pub fn listing_router<R, S>(
    service: Arc<ListingService<R, S>>,
    identity: Arc<IdentityResolver>,
) -> Router
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    Router::new()
        .route("/api/v1/listings", post(create_handler::<R, S>))
        .route("/api/v1/me/listings", get(owner_listings_handler::<R, S>))
        .route(
            "/api/v1/listings/:listing_id",
            delete(delete_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/activate",
            post(activate_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/archive",
            post(archive_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/renew",
            post(renew_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/images",
            put(images_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/images/upload",
            post(upload_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/contact",
            get(contact_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/payment",
            get(payment_handler::<R, S>),
        )
        .route(
            "/api/v1/listings/:listing_id/renewal-options",
            get(renewal_options_handler::<R, S>),
        )
        .with_state(ListingRoutes { service, identity })
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ListingError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn create_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Json(input): Json<NewListingInput>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::CREATED,
        routes.service.create(principal.as_ref(), input),
    )
}

pub(crate) async fn owner_listings_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes.service.owner_listings(principal.as_ref()),
    )
}

pub(crate) async fn activate_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes
            .service
            .activate(principal.as_ref(), ListingId(listing_id)),
    )
}

pub(crate) async fn archive_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes
            .service
            .archive(principal.as_ref(), ListingId(listing_id)),
    )
}

pub(crate) async fn renew_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<RenewRequest>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes.service.renew(
            principal.as_ref(),
            ListingId(listing_id),
            request.period_id.map(PeriodId),
        ),
    )
}

pub(crate) async fn delete_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes
            .service
            .delete(principal.as_ref(), ListingId(listing_id))
            .map(|()| json!({ "success": true })),
    )
}

pub(crate) async fn images_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<ImagesRequest>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes.service.update_images(
            principal.as_ref(),
            ListingId(listing_id),
            request.images,
        ),
    )
}

pub(crate) async fn upload_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
    Json(request): Json<UploadRequest>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);

    let mut uploads = Vec::with_capacity(request.files.len());
    for file in request.files {
        match STANDARD.decode(file.data.trim()) {
            Ok(bytes) => uploads.push(ImageUpload {
                slot: file.slot,
                file_name: file.file_name,
                bytes,
            }),
            Err(_) => {
                return error_response(
                    ErrorKind::Validation,
                    format!("Nieprawidłowe dane zdjęcia {}.", file.slot + 1),
                )
            }
        }
    }

    respond(
        StatusCode::OK,
        routes
            .service
            .upload_images(principal.as_ref(), ListingId(listing_id), uploads)
            .map(|slots| json!({ "images": slots })),
    )
}

pub(crate) async fn contact_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    respond(
        StatusCode::OK,
        routes.service.reveal_contact(ListingId(listing_id)),
    )
}

pub(crate) async fn payment_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes
            .service
            .payment_quote(principal.as_ref(), ListingId(listing_id)),
    )
}

pub(crate) async fn renewal_options_handler<R, S>(
    State(routes): State<ListingRoutes<R, S>>,
    headers: HeaderMap,
    Path(listing_id): Path<Uuid>,
) -> Response
where
    R: MarketplaceStore + 'static,
    S: ImageStore + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes
            .service
            .renewal_options(principal.as_ref(), ListingId(listing_id)),
    )
}
