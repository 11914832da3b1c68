use crate::{
    config::{ADMIN_EMAIL, ADMIN_NAME},
    error::{AppError, AppResult},
    models::{Role, UserRecord},
    password::CredentialHasher,
    repository::RepositoryState,
};

/// ensure_admin
///
/// Startup side effect: creates the administrator account keyed on
/// `ADMIN_EMAIL` unless it already exists. Safe to run on every boot and from
/// several instances at once; losing the insert race counts as "exists".
/// Returns true when a new account was created.
pub async fn ensure_admin(
    repo: &RepositoryState,
    hasher: &CredentialHasher,
    password: &str,
) -> AppResult<bool> {
    if repo.find_user_by_email(ADMIN_EMAIL).await?.is_some() {
        tracing::debug!("Bootstrap admin already present.");
        return Ok(false);
    }

    let admin = UserRecord::new(
        ADMIN_EMAIL.to_string(),
        ADMIN_NAME.to_string(),
        Role::Admin,
        hasher.hash(password)?,
    );

    match repo.insert_user(admin).await {
        Ok(_) => {
            tracing::info!(email = ADMIN_EMAIL, "Bootstrap admin account created.");
            Ok(true)
        }
        Err(AppError::Validation(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
