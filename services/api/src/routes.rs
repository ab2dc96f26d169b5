use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use dealer_reviews::accounts::{AccountService, UserStore};
use dealer_reviews::dealers::DealerApi;
use dealer_reviews::reviews::{dealership_router, ReviewService};
use dealer_reviews::sentiment::SentimentAnalyzer;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_dealership_routes<D, S, U>(
    reviews: Arc<ReviewService<D, S>>,
    accounts: Arc<AccountService<U>>,
) -> axum::Router
where
    D: DealerApi + 'static,
    S: SentimentAnalyzer + 'static,
    U: UserStore + 'static,
{
    dealership_router(reviews, accounts)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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
