use std::env;

/// Fixed email of the bootstrap administrator account.
pub const ADMIN_EMAIL: &str = "admin@supergamer.com";

/// Display name given to the bootstrap administrator account.
pub const ADMIN_NAME: &str = "Administrador";

/// Special `DATABASE_URL` value that selects the in-memory repository.
pub const MEMORY_DATABASE_URL: &str = "memory";

const LOCAL_JWT_SECRET: &str = "super-secret-key-change-in-production";

/// Upper bound for `TOKEN_TTL_MINUTES`: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// never mutated afterwards; handlers reach it through the shared `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string, or `memory` for the in-memory store.
    pub db_url: String,
    // Overrides the database named in `db_url` when set.
    pub db_name: Option<String>,
    // Runtime environment marker. Selects log format and secret strictness.
    pub env: Env,
    // HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Lifetime of issued bearer tokens, in minutes.
    pub token_ttl_minutes: i64,
    // Origins allowed by the CORS layer. `*` allows any origin.
    pub cors_origins: Vec<String>,
    // bcrypt work factor.
    pub bcrypt_cost: u32,
    // Password assigned to the bootstrap admin when it is first created.
    pub admin_password: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context: pretty logs and a fallback secret locally,
/// JSON logs and mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup.
    fn default() -> Self {
        Self {
            db_url: MEMORY_DATABASE_URL.to_string(),
            db_name: None,
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            token_ttl_minutes: 60 * 24 * 7,
            cors_origins: vec!["*".to_string()],
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_password: "admin".to_string(),
            bind_addr: "0.0.0.0:8001".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and implements the
    /// **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if `DATABASE_URL` is missing, if `JWT_SECRET_KEY` is missing in
    /// production, if a numeric variable cannot be parsed, or if
    /// `TOKEN_TTL_MINUTES` is outside `1..=MAX_TOKEN_TTL_MINUTES`.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("JWT_SECRET_KEY")
                .expect("FATAL: JWT_SECRET_KEY must be set in production."),
            Env::Local => {
                env::var("JWT_SECRET_KEY").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string())
            }
        };

        let defaults = Self::default();

        let token_ttl_minutes = parse_var("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes);
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            panic!(
                "FATAL: TOKEN_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}, got {token_ttl_minutes}"
            );
        }

        Self {
            db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL must be set"),
            db_name: env::var("DB_NAME").ok().filter(|name| !name.is_empty()),
            env,
            jwt_secret,
            token_ttl_minutes,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.cors_origins),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    /// True when the CORS layer should accept any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("FATAL: {key} has an invalid value: {raw}")),
        Err(_) => default,
    }
}

/// Splits a comma separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}
