pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{cache::TtlCache, ingest::IngestService, query::QueryService};

/// Shared handler state. Ingest and query sides are built over the same
/// pool and the same cache instance so write-through entries are visible
/// to reads.
#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub query: QueryService,
}

impl AppState {
    pub fn new(pool: SqlitePool, cache: TtlCache) -> Self {
        Self {
            ingest: IngestService::new(pool.clone(), cache.clone()),
            query: QueryService::new(pool, cache),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/readings", post(handlers::create_reading))
        .route(
            "/readings/latest/{sensor_id}",
            get(handlers::get_latest_reading),
        )
        .route(
            "/readings/history/{sensor_id}",
            get(handlers::get_reading_history),
        )
        .route("/stats/{sensor_id}", get(handlers::get_statistics))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
