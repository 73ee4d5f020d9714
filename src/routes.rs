use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// All API routes bound to `state`. Middleware is layered on by the binary so
/// tests can drive the bare router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Link services
        .route(
            "/api/link-preview",
            get(handlers::link_preview::get_link_preview),
        )
        .route(
            "/api/check-embedding",
            get(handlers::embedding::check_embedding),
        )
        // Clipboard items
        .route(
            "/api/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route("/api/items/tags", get(handlers::items::list_tags))
        .route(
            "/api/items/:id",
            get(handlers::items::get_item)
                .patch(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route(
            "/api/items/:id/favorite",
            post(handlers::items::toggle_favorite),
        )
        .with_state(state)
}
