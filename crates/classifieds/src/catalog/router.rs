use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::domain::{CategoryId, FilterId, Visibility};
use super::repository::CatalogRepository;
use super::service::{CatalogError, CatalogService, CategoryDraft};
use crate::access::IdentityResolver;
use crate::error::error_response;

pub struct CatalogRoutes<R> {
    service: Arc<CatalogService<R>>,
    identity: Arc<IdentityResolver>,
}

impl<R> Clone for CatalogRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FreeFlagRequest {
    is_free: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VisibilityRequest {
    visibility: Visibility,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilterOptionRequest {
    #[serde(default)]
    value: String,
}

/// Router exposing public catalog reads and admin catalog management.
pub fn catalog_router<R>(
    service: Arc<CatalogService<R>>,
    identity: Arc<IdentityResolver>,
) -> Router
where
    R: CatalogRepository + 'static,
{
    Router::new()
        .route("/api/v1/categories", get(tree_handler::<R>))
        .route(
            "/api/v1/categories/:category_id/periods",
            get(periods_handler::<R>),
        )
        .route(
            "/api/v1/categories/:category_id/filters",
            get(filters_handler::<R>),
        )
        .route("/api/v1/admin/categories", post(add_category_handler::<R>))
        .route(
            "/api/v1/admin/categories/:category_id",
            put(update_category_handler::<R>).delete(delete_category_handler::<R>),
        )
        .route(
            "/api/v1/admin/categories/:category_id/restore",
            post(restore_category_handler::<R>),
        )
        .route(
            "/api/v1/admin/categories/:category_id/free",
            put(free_flag_handler::<R>),
        )
        .route(
            "/api/v1/admin/categories/:category_id/visibility",
            put(visibility_handler::<R>),
        )
        .route(
            "/api/v1/admin/categories/:category_id/filters/:filter_id",
            put(assign_filter_handler::<R>).delete(unassign_filter_handler::<R>),
        )
        .route("/api/v1/admin/filters", post(create_filter_handler::<R>))
        .route(
            "/api/v1/admin/filters/:filter_id/options",
            post(add_option_handler::<R>),
        )
        .with_state(CatalogRoutes { service, identity })
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, CatalogError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

fn acknowledge(result: Result<(), CatalogError>) -> Response {
    respond(StatusCode::OK, result.map(|()| json!({ "success": true })))
}

pub(crate) async fn tree_handler<R>(State(routes): State<CatalogRoutes<R>>) -> Response
where
    R: CatalogRepository + 'static,
{
    respond(StatusCode::OK, routes.service.category_tree())
}

pub(crate) async fn periods_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    Path(category_id): Path<Uuid>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    respond(
        StatusCode::OK,
        routes.service.publication_options(CategoryId(category_id)),
    )
}

pub(crate) async fn filters_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    Path(category_id): Path<Uuid>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    respond(
        StatusCode::OK,
        routes.service.filters_for_category(CategoryId(category_id)),
    )
}

pub(crate) async fn add_category_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Json(draft): Json<CategoryDraft>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::CREATED,
        routes.service.add_category(principal.as_ref(), draft),
    )
}

pub(crate) async fn update_category_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path(category_id): Path<Uuid>,
    Json(draft): Json<CategoryDraft>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::OK,
        routes
            .service
            .update_category(principal.as_ref(), CategoryId(category_id), draft),
    )
}

pub(crate) async fn delete_category_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path(category_id): Path<Uuid>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    acknowledge(
        routes
            .service
            .soft_delete_category(principal.as_ref(), CategoryId(category_id)),
    )
}

pub(crate) async fn restore_category_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path(category_id): Path<Uuid>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    acknowledge(
        routes
            .service
            .restore_category(principal.as_ref(), CategoryId(category_id)),
    )
}

pub(crate) async fn free_flag_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path(category_id): Path<Uuid>,
    Json(request): Json<FreeFlagRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    acknowledge(routes.service.set_category_free(
        principal.as_ref(),
        CategoryId(category_id),
        request.is_free,
    ))
}

pub(crate) async fn visibility_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path(category_id): Path<Uuid>,
    Json(request): Json<VisibilityRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    acknowledge(routes.service.set_category_visibility(
        principal.as_ref(),
        CategoryId(category_id),
        request.visibility,
    ))
}

pub(crate) async fn assign_filter_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path((category_id, filter_id)): Path<(Uuid, Uuid)>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    acknowledge(routes.service.assign_filter(
        principal.as_ref(),
        CategoryId(category_id),
        FilterId(filter_id),
    ))
}

pub(crate) async fn unassign_filter_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path((category_id, filter_id)): Path<(Uuid, Uuid)>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    acknowledge(routes.service.unassign_filter(
        principal.as_ref(),
        CategoryId(category_id),
        FilterId(filter_id),
    ))
}

pub(crate) async fn create_filter_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Json(request): Json<FilterRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::CREATED,
        routes
            .service
            .create_filter(principal.as_ref(), &request.name, &request.kind),
    )
}

pub(crate) async fn add_option_handler<R>(
    State(routes): State<CatalogRoutes<R>>,
    headers: HeaderMap,
    Path(filter_id): Path<Uuid>,
    Json(request): Json<FilterOptionRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    respond(
        StatusCode::CREATED,
        routes
            .service
            .add_filter_option(principal.as_ref(), FilterId(filter_id), &request.value),
    )
}
