use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::put;
use axum::{Json, Router};

use super::service::SettingsService;
use super::{SettingsInput, SettingsRepository};
use crate::access::IdentityResolver;
use crate::error::error_response;

pub struct SettingsRoutes<R> {
    service: Arc<SettingsService<R>>,
    identity: Arc<IdentityResolver>,
}

impl<R> Clone for SettingsRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

pub fn settings_router<R>(
    service: Arc<SettingsService<R>>,
    identity: Arc<IdentityResolver>,
) -> Router
where
    R: SettingsRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/settings",
            put(update_handler::<R>).get(read_handler::<R>),
        )
        .with_state(SettingsRoutes { service, identity })
}

pub(crate) async fn read_handler<R>(
    State(routes): State<SettingsRoutes<R>>,
    headers: HeaderMap,
) -> Response
where
    R: SettingsRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    match routes.service.settings(principal.as_ref()) {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn update_handler<R>(
    State(routes): State<SettingsRoutes<R>>,
    headers: HeaderMap,
    Json(input): Json<SettingsInput>,
) -> Response
where
    R: SettingsRepository + 'static,
{
    let principal = routes.identity.from_headers(&headers);
    match routes.service.update_settings(principal.as_ref(), input) {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}
