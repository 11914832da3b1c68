use super_gamer::{
    AppState,
    bootstrap,
    config::{AppConfig, Env},
    create_router, repository,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes Configuration, Logging, the Store, the bootstrap admin and the
/// HTTP Server, in that order. Any failure before serving is fatal.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "super_gamer=debug,tower_http=info".into());

    // 3. Pretty logs locally, JSON for log aggregators in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Store Initialization (Postgres pool + migrations, or in-memory)
    let repo = repository::connect(&config)
        .await
        .expect("FATAL: Failed to initialize the store. Check DATABASE_URL.");

    // 5. Unified State Assembly
    let app_state = AppState::new(repo, config);

    // 6. Bootstrap admin account (idempotent)
    bootstrap::ensure_admin(
        &app_state.repo,
        &app_state.hasher,
        &app_state.config.admin_password,
    )
    .await
    .expect("FATAL: Failed to ensure the bootstrap admin account.");

    // 7. Router and Server Startup
    let bind_addr = app_state.config.bind_addr.clone();
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: Failed to bind {bind_addr}: {e}"));

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("FATAL: HTTP server error");
}

/// Resolves on Ctrl-C so in-flight requests can finish before exit.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
