use crate::accounts::SettingsError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::listings::ListingError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Coarse classification shared by every domain error so callers can branch without parsing
/// the (user-facing, Polish) message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    Validation,
    NotFound,
    Conflict,
    Dependency,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Dependency => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders a domain failure as `{ "error": <message>, "kind": <kind> }`.
pub fn error_response(kind: ErrorKind, message: String) -> Response {
    let body = Json(json!({ "error": message, "kind": kind }));
    (kind.status(), body).into_response()
}

/// Failures surfaced by the service shell (bootstrap, CLI and demo flows).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("listing error: {0}")]
    Listing(#[from] ListingError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Catalog(err) => err.kind(),
            AppError::Listing(err) => err.kind(),
            AppError::Settings(err) => err.kind(),
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_response(self.kind(), self.to_string())
    }
}
