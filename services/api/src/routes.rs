use crate::infra::{AppState, Marketplace};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use classifieds::accounts::settings_router;
use classifieds::assist::assist_router;
use classifieds::catalog::catalog_router;
use classifieds::listings::listing_router;
use serde_json::json;

/// Every marketplace router plus the operational endpoints. Expects `AppState` as an extension.
pub(crate) fn with_marketplace_routes(marketplace: &Marketplace) -> Router {
    let identity = marketplace.identity.clone();
    catalog_router(marketplace.catalog.clone(), identity.clone())
        .merge(listing_router(marketplace.listings.clone(), identity.clone()))
        .merge(settings_router(marketplace.settings.clone(), identity))
        .merge(assist_router(marketplace.assist.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::seed_sample_catalog;
    use crate::infra::tests::{clock, test_config};
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(ready: bool) -> (Router, Marketplace) {
        let marketplace = Marketplace::from_config(&test_config(), clock());
        let recorder = PrometheusBuilder::new().build_recorder();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(recorder.handle()),
        };
        state.readiness.store(ready, Ordering::Release);
        let router = with_marketplace_routes(&marketplace).layer(Extension(state));
        (router, marketplace)
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (router, _) = app(true);
        let response = router.oneshot(get_request("/health")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (router, _) = app(false);
        let response = router
            .clone()
            .oneshot(get_request("/ready"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["status"], "initializing");

        let (router, _) = app(true);
        let response = router.oneshot(get_request("/ready")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_are_rendered_as_text() {
        let (router, _) = app(true);
        let response = router.oneshot(get_request("/metrics")).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn catalog_tree_is_served_from_merged_router() {
        let (router, marketplace) = app(true);
        seed_sample_catalog(&marketplace.store, &marketplace.catalog).expect("catalog seeds");

        let response = router
            .oneshot(get_request("/api/v1/categories"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json(response).await;
        assert_eq!(payload.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn listing_routes_require_identity() {
        let (router, _) = app(true);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/listings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Rower"}"#))
            .expect("request builds");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await["kind"], "unauthenticated");
    }
}
