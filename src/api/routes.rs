use axum::{middleware, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    create_global_rating, delete_global_rating, get_global_rating, get_mod_version, health,
    list_global_ratings, list_mod_versions, patch_global_rating, patch_mod_version, AppState,
};
use super::middleware::logging_middleware;
use super::openapi::ApiDoc;
use crate::metrics;

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health))
        // Mod version endpoints
        .route("/data/modVersion", get(list_mod_versions))
        .route(
            "/data/modVersion/:id",
            get(get_mod_version).patch(patch_mod_version),
        )
        // Global rating endpoints (reads plus explicit mutation rejections)
        .route(
            "/data/globalRating",
            get(list_global_ratings).post(create_global_rating),
        )
        .route(
            "/data/globalRating/:id",
            get(get_global_rating)
                .patch(patch_global_rating)
                .delete(delete_global_rating),
        )
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware (order matters: compression -> logging -> metrics -> cors -> trace)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
