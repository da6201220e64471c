use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::service::{AssistError, AssistService, ImageInput};
use crate::catalog::CatalogRepository;
use crate::error::error_response;

pub struct AssistRoutes<R> {
    service: Arc<AssistService<R>>,
}

impl<R> Clone for AssistRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryRequest {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescriptiveTagsRequest {
    #[serde(default, rename = "imageUrl")]
    image_url: String,
}

pub fn assist_router<R>(service: Arc<AssistService<R>>) -> Router
where
    R: CatalogRepository + 'static,
{
    Router::new()
        .route("/api/v1/assist/category", post(category_handler::<R>))
        .route("/api/v1/assist/tags", post(keyword_tags_handler::<R>))
        .route(
            "/api/v1/assist/descriptive-tags",
            post(descriptive_tags_handler::<R>),
        )
        .with_state(AssistRoutes { service })
}

fn respond<T: Serialize>(result: Result<T, AssistError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn category_handler<R>(
    State(routes): State<AssistRoutes<R>>,
    Json(request): Json<CategoryRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    respond(routes.service.suggest_category(&request.title).await)
}

pub(crate) async fn keyword_tags_handler<R>(
    State(routes): State<AssistRoutes<R>>,
    Json(image): Json<ImageInput>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    respond(
        routes
            .service
            .keyword_tags(image)
            .await
            .map(|tags| json!({ "tags": tags })),
    )
}

pub(crate) async fn descriptive_tags_handler<R>(
    State(routes): State<AssistRoutes<R>>,
    Json(request): Json<DescriptiveTagsRequest>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    respond(
        routes
            .service
            .descriptive_tags(&request.image_url)
            .await
            .map(|tags| json!({ "tags": tags })),
    )
}
