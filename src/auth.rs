use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Role, User},
    repository::RepositoryState,
};

/// Claims
///
/// Payload carried inside every bearer token issued by this server.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): id of the user the token was issued to.
    pub sub: Uuid,
    /// Expiration Time (exp): seconds since the epoch after which the token is refused.
    pub exp: usize,
    /// Issued At (iat)
    pub iat: usize,
}

/// Why a token was refused. Only used for diagnostics; both map to 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Could not validate token")]
    Invalid,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Unauthenticated(err.to_string())
    }
}

/// TokenService
///
/// Issues and verifies HS256-signed, time-limited bearer tokens. Built once at
/// startup from the configured secret and shared read-only through `AppState`.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is refused the second it passes `exp`.
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
        }
    }

    /// Issue a token for `subject` that expires after `ttl`. A negative `ttl`
    /// yields an already-expired token.
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(format!("token lifetime out of range: {ttl}")))?
            .timestamp()
            .max(0) as usize;

        let claims = Claims {
            sub: subject,
            iat: now.timestamp() as usize,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    /// Issue a token with the configured session lifetime.
    pub fn issue_session(&self, subject: Uuid) -> AppResult<String> {
        self.issue(subject, self.default_ttl)
    }

    /// Verify signature and expiry, returning the subject id.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}

/// bearer_token
///
/// Pulls the credential out of an `Authorization: Bearer <token>` header.
/// The scheme name is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthenticated("No authentication token provided".into()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthenticated("Malformed authorization header".into()))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::Unauthenticated("Malformed authorization header".into()));
    }

    Ok(token)
}

/// AuthUser
///
/// The resolved identity of an authenticated request: the full user loaded from
/// the store. Declaring it as a handler argument makes the route protected.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    /// Role guard for item mutations. Non-admins are refused with 403.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.0.role == Role::Admin {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.0.id, "admin-only action refused");
            Err(AppError::Forbidden(
                "Only administrators can manage items".into(),
            ))
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Token Extraction from the `Authorization` header.
/// 2. Token Verification (signature and expiry).
/// 3. Store Lookup, so tokens of users that no longer exist are refused.
///
/// Rejection: `AppError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let tokens = TokenService::from_ref(state);

        let token = bearer_token(&parts.headers)?;

        let user_id = tokens.verify(token).inspect_err(|reason| {
            tracing::debug!(%reason, "bearer token refused");
        })?;

        let user = repo
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User not found".into()))?;

        Ok(AuthUser(user.into()))
    }
}

/// AdminUser
///
/// Explicit role guard for item mutations: resolves the caller like `AuthUser`,
/// then refuses non-admins with `AppError::Forbidden` (403). Runs before the
/// request body is read.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        auth.require_admin()?;
        Ok(AdminUser(auth.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> TokenService {
        TokenService::new("unit-test-secret", Duration::minutes(5))
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let subject = Uuid::new_v4();
        let token = service().issue_session(subject).unwrap();
        assert_eq!(service().verify(&token), Ok(subject));
    }

    #[test]
    fn past_expiry_is_reported_as_expired() {
        let token = service().issue(Uuid::new_v4(), Duration::seconds(-30)).unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn out_of_range_lifetime_is_an_error_not_a_panic() {
        let result = service().issue(Uuid::new_v4(), Duration::MAX);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let other = TokenService::new("another-secret", Duration::minutes(5));
        let token = other.issue_session(Uuid::new_v4()).unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::Invalid));
        assert_eq!(service().verify("not.a.jwt"), Err(TokenError::Invalid));
    }

    #[test]
    fn bearer_token_requires_the_bearer_scheme() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn require_admin_checks_role() {
        let mut user = User {
            id: Uuid::new_v4(),
            email: "u@site.io".into(),
            name: "U".into(),
            role: Role::User,
            created_at: Utc::now(),
        };
        assert!(matches!(
            AuthUser(user.clone()).require_admin(),
            Err(AppError::Forbidden(_))
        ));
        user.role = Role::Admin;
        assert!(AuthUser(user).require_admin().is_ok());
    }
}
