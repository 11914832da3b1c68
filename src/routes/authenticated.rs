use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid bearer token. Every handler here takes
/// the `AuthUser` extractor, which answers 401 on a missing, invalid or expired
/// token, or on a token whose user no longer exists.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /auth/me
        // The user resolved from the token.
        .route("/auth/me", get(handlers::get_me))
        // POST /comments
        // The comment is attributed to the caller; the item must exist.
        .route("/comments", post(handlers::create_comment))
}
