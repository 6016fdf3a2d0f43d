use axum::Router;
use shared_types::{
    AcquisitionMethod, AppConfig, AppError, AppErrorKind, CaseRequest, CaseResponse, CaseStatus,
    EvidenceType, ItemRequest, ItemResponse, ItemStatus, StorageLocation,
};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health;
use crate::rest;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Cases
        rest::case::list_cases,
        rest::case::create_case,
        rest::case::get_case,
        rest::case::update_case,
        rest::case::delete_case,
        // Items
        rest::item::list_items,
        rest::item::create_item,
        rest::item::get_item,
        rest::item::update_item,
        rest::item::delete_item,
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        CaseStatus, CaseRequest, CaseResponse,
        EvidenceType, ItemStatus, StorageLocation, AcquisitionMethod,
        ItemRequest, ItemResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "cases", description = "Investigation cases and their evidence"),
        (name = "items", description = "Evidence items, with optional picture upload"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Evidence API",
        description = "Digital forensics case and evidence registry",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Normalize the public media prefix to `/segment[/segment...]`.
/// Returns `None` when nothing would be left to mount.
fn media_mount(media_url: &str) -> Option<String> {
    let trimmed = media_url.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains("://") {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// Build the application router: resources at the root (and under `/api`
/// when enabled), `/health`, API docs at `/docs`, and locally stored
/// pictures under the media prefix.
pub fn app_router(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .merge(rest::resource_router())
        .route("/health", axum::routing::get(health::health_check));

    if config.server.api_alias {
        router = router.nest("/api", rest::resource_router());
    }

    let media_root = state.pictures.local_root().map(|p| p.to_path_buf());

    let mut router = router
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if let (Some(root), Some(mount)) = (media_root, media_mount(&config.storage.media_url)) {
        router = router.nest_service(&mount, ServeDir::new(root));
    }

    router
}
