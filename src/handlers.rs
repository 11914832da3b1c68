use crate::{
    AppState,
    auth::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    models::{
        Category, Comment, CreateCommentRequest, CreateItemRequest, Item, ItemPatch,
        LoginRequest, MessageResponse, RegisterRequest, Role, TokenResponse, User, UserRecord,
        is_valid_email, normalize_email,
    },
};
use axum::{Json, extract::State};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// ItemFilter
///
/// Query parameters for `GET /api/items`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    /// Section to list: `games` or `heroes`.
    pub category: Category,
}

/// CommentFilter
///
/// Query parameters for `GET /api/comments`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentFilter {
    pub item_id: Uuid,
    pub category: Category,
}

// Login failures share one message so callers cannot probe which emails exist.
const BAD_CREDENTIALS: &str = "Incorrect email or password";

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a `user`-role account and returns a session token.
/// Duplicate emails are refused with 400.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = TokenResponse),
        (status = 400, description = "Invalid or already registered email")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<TokenResponse>> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("Email is already registered".into()));
    }

    let password_hash = state.hasher.hash(&payload.password)?;
    let record = UserRecord::new(email, payload.name, Role::User, password_hash);
    let user: User = state.repo.insert_user(record).await?.into();

    let token = state.tokens.issue_session(user.id)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(TokenResponse::bearer(token, user)))
}

/// login
///
/// [Public Route] Exchanges email and password for a session token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = TokenResponse),
        (status = 401, description = "Incorrect email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let record = state
        .repo
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or_else(|| AppError::Unauthenticated(BAD_CREDENTIALS.into()))?;

    if !state.hasher.verify(&payload.password, &record.password_hash) {
        tracing::debug!(user_id = %record.id, "login refused: password mismatch");
        return Err(AppError::Unauthenticated(BAD_CREDENTIALS.into()));
    }

    let token = state.tokens.issue_session(record.id)?;
    Ok(Json(TokenResponse::bearer(token, record.into())))
}

/// get_me
///
/// [Authenticated Route] The user resolved from the bearer token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing, invalid or expired token")
    )
)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

// --- Item Handlers ---

/// list_items
///
/// [Public Route] All items of one category.
#[utoipa::path(
    get,
    path = "/api/items",
    params(ItemFilter),
    responses((status = 200, description = "Items in the category", body = [Item]))
)]
pub async fn list_items(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ItemFilter>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.repo.find_items_by_category(filter.category).await?;
    Ok(Json(items))
}

/// create_item
///
/// [Admin Route] Adds a game or hero.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = CreateItemRequest,
    responses(
        (status = 200, description = "Created", body = Item),
        (status = 403, description = "Caller is not an administrator")
    )
)]
pub async fn create_item(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateItemRequest>,
) -> AppResult<Json<Item>> {
    let item = state.repo.insert_item(Item::from(payload)).await?;
    tracing::info!(admin_id = %admin.id, item_id = %item.id, category = item.category.as_str(), "item created");
    Ok(Json(item))
}

/// update_item
///
/// [Admin Route] Partial update: only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = ItemPatch,
    responses(
        (status = 200, description = "Updated", body = Item),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_item(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(patch): AppJson<ItemPatch>,
) -> AppResult<Json<Item>> {
    let item = if patch.is_empty() {
        state.repo.find_item(id).await?
    } else {
        state.repo.update_item(id, patch).await?
    };

    let item = item.ok_or_else(|| AppError::NotFound("Item not found".into()))?;
    tracing::info!(admin_id = %admin.id, item_id = %item.id, "item updated");
    Ok(Json(item))
}

/// delete_item
///
/// [Admin Route] Removes an item and, in cascade, every comment that references it.
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Caller is not an administrator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_item(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !state.repo.delete_item(id).await? {
        return Err(AppError::NotFound("Item not found".into()));
    }

    let removed = state.repo.delete_comments_by_item(id).await?;
    tracing::info!(admin_id = %admin.id, item_id = %id, comments_removed = removed, "item deleted");

    Ok(Json(MessageResponse {
        message: "Item deleted successfully".into(),
    }))
}

// --- Comment Handlers ---

/// list_comments
///
/// [Public Route] Comments on one item, newest first.
#[utoipa::path(
    get,
    path = "/api/comments",
    params(CommentFilter),
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<CommentFilter>,
) -> AppResult<Json<Vec<Comment>>> {
    let comments = state
        .repo
        .find_comments(filter.item_id, filter.category)
        .await?;
    Ok(Json(comments))
}

/// create_comment
///
/// [Authenticated Route] Posts a comment attributed to the caller. The item
/// must exist; the category is stored as sent.
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment Added", body = Comment),
        (status = 404, description = "Item not found")
    )
)]
pub async fn create_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> AppResult<Json<Comment>> {
    if state.repo.find_item(payload.item_id).await?.is_none() {
        return Err(AppError::NotFound("Item not found".into()));
    }

    let comment = state
        .repo
        .insert_comment(Comment::new(&user, payload))
        .await?;
    Ok(Json(comment))
}
