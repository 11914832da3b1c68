use axum::{
    Router,
    body::Body,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Request},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod routes;

use routes::{admin, authenticated, public};

pub use auth::TokenService;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use password::CredentialHasher;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::get_me,
        handlers::list_items, handlers::create_item, handlers::update_item,
        handlers::delete_item, handlers::list_comments, handlers::create_comment
    ),
    components(
        schemas(
            models::User, models::Role, models::Category, models::Item, models::Comment,
            models::RegisterRequest, models::LoginRequest, models::TokenResponse,
            models::CreateItemRequest, models::ItemPatch, models::CreateCommentRequest,
            models::MessageResponse,
        )
    ),
    tags(
        (name = "super-gamer", description = "Games & Heroes content API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container holding every process-wide dependency.
/// Built once at startup and cloned cheaply into each request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer for users, items and comments.
    pub repo: RepositoryState,
    /// Signs and verifies bearer tokens with the configured secret.
    pub tokens: TokenService,
    /// Password hashing with the configured bcrypt cost.
    pub hasher: CredentialHasher,
    pub config: AppConfig,
}

impl AppState {
    /// Derives the token service and hasher from `config`.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let tokens = TokenService::new(
            &config.jwt_secret,
            chrono::Duration::minutes(config.token_ttl_minutes),
        );
        let hasher = CredentialHasher::new(config.bcrypt_cost);

        Self {
            repo,
            tokens,
            hasher,
            config,
        }
    }
}

// `AuthUser` and `AdminUser` pull these two out of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

/// cors_layer
///
/// `*` in the configured origins allows any origin; otherwise only the listed
/// ones. Entries that are not valid header values are skipped with a warning.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// create_router
///
/// The full HTTP surface: `/api` plus the Swagger UI, wrapped in request-id,
/// tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api = Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes());

    let observability = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id));

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(observability)
        .layer(cors)
}

// One span per request; the id was set by `SetRequestIdLayer` just before.
fn request_span(request: &Request<Body>) -> Span {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %id,
    )
}
