use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Item mutations. Each handler takes the `AdminUser` extractor: 401 without a
/// valid token, 403 when the caller's role is not `admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /items
        .route("/items", post(handlers::create_item))
        // PUT /items/{id}   partial update, 404 if missing
        // DELETE /items/{id} cascades to the item's comments, 404 if missing
        .route(
            "/items/{id}",
            put(handlers::update_item).delete(handlers::delete_item),
        )
}
