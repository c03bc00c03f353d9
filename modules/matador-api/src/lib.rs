use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use matador_report::{ReportGenerator, ReportStore};

pub mod rest;

pub struct AppState {
    pub generator: ReportGenerator,
    pub store: Arc<dyn ReportStore>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Reports
        .route("/api/reports", post(rest::api_create_report))
        .route("/api/reports/{id}", get(rest::api_report_detail))
        .route("/api/users/{user_id}/reports", get(rest::api_user_reports))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method, path, status and latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
