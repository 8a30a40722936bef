pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::store::DynStore;
use handlers::ApiDoc;

/// Dependencies injected into every handler at construction time.
#[derive(Clone)]
pub struct ApiContext {
    pub store: DynStore,
    /// Reported by the health endpoint.
    pub project_id: String,
}

pub fn router(ctx: ApiContext) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/", get(handlers::health))
        .route("/api/sensor", post(handlers::submit_reading))
        .route("/api/sensor/latest", get(handlers::get_latest))
        .route("/api/sensor/history", get(handlers::get_history))
        .route("/api/debug", get(handlers::debug_store))
        .with_state(ctx)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}
