use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a bearer token: the registration/login gateway
/// and the read-only item and comment listings.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates a `user`-role account and returns a session token.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Email/password exchange. Unknown email and wrong password look identical.
        .route("/auth/login", post(handlers::login))
        // GET /items?category=games|heroes
        .route("/items", get(handlers::list_items))
        // GET /comments?item_id=...&category=...
        // Newest first.
        .route("/comments", get(handlers::list_comments))
}
