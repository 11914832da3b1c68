use crate::{
    config::{AppConfig, MEMORY_DATABASE_URL},
    error::{AppError, AppResult},
    models::{Category, Comment, Item, ItemPatch, UserRecord},
};
use async_trait::async_trait;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use std::{collections::HashMap, str::FromStr, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract for the three collections (users, items, comments).
/// Every method is a single store call: there are no transactions and the last
/// writer wins. Store failures surface as `AppError::Database`.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;
    // Fails with `Validation` if the email is already taken.
    async fn insert_user(&self, user: UserRecord) -> AppResult<UserRecord>;

    // --- Items ---
    async fn find_item(&self, id: Uuid) -> AppResult<Option<Item>>;
    async fn find_items_by_category(&self, category: Category) -> AppResult<Vec<Item>>;
    async fn insert_item(&self, item: Item) -> AppResult<Item>;
    // Applies only the provided fields. `None` when the item does not exist.
    async fn update_item(&self, id: Uuid, patch: ItemPatch) -> AppResult<Option<Item>>;
    // Returns true if a document was removed.
    async fn delete_item(&self, id: Uuid) -> AppResult<bool>;

    // --- Comments ---
    // Newest first.
    async fn find_comments(&self, item_id: Uuid, category: Category) -> AppResult<Vec<Comment>>;
    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment>;
    // Delete-many keyed on the parent item. Returns the number removed.
    async fn delete_comments_by_item(&self, item_id: Uuid) -> AppResult<u64>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// connect
///
/// Builds the repository named by the configuration: the in-memory store when
/// `DATABASE_URL=memory`, otherwise a Postgres pool with migrations applied.
pub async fn connect(config: &AppConfig) -> AppResult<RepositoryState> {
    if config.db_url == MEMORY_DATABASE_URL {
        tracing::warn!("Using the in-memory store; data is lost on shutdown.");
        return Ok(Arc::new(InMemoryRepository::new()));
    }

    let mut options = PgConnectOptions::from_str(&config.db_url)?;
    if let Some(db_name) = &config.db_name {
        options = options.database(db_name);
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Internal(format!("failed to apply migrations: {e}")))?;

    tracing::info!("Connected to Postgres and applied migrations.");
    Ok(Arc::new(PostgresRepository::new(pool)))
}

const USER_COLUMNS: &str = "id, email, name, role, password_hash, created_at";
const ITEM_COLUMNS: &str = "id, title, description, image_url, official_link, category, created_at";
const COMMENT_COLUMNS: &str = "id, user_id, user_name, item_id, category, text, created_at";

fn duplicate_email() -> AppError {
    AppError::Validation("Email is already registered".into())
}

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Queries are checked
/// at runtime, so no database is needed to compile the crate.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// insert_user
    ///
    /// The unique index on `email` is the last line of defence against two
    /// concurrent registrations; its violation maps to a validation error.
    async fn insert_user(&self, user: UserRecord) -> AppResult<UserRecord> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, name, role, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
                Err(duplicate_email())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_items_by_category(&self, category: Category) -> AppResult<Vec<Item>> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE category = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_item(&self, item: Item) -> AppResult<Item> {
        sqlx::query(
            "INSERT INTO items (id, title, description, image_url, official_link, category, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(&item.official_link)
        .bind(item.category.as_str())
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// update_item
    ///
    /// `COALESCE` keeps the stored value for every patch field that is `None`.
    async fn update_item(&self, id: Uuid, patch: ItemPatch) -> AppResult<Option<Item>> {
        let query = format!(
            "UPDATE items \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 image_url = COALESCE($4, image_url), \
                 official_link = COALESCE($5, official_link) \
             WHERE id = $1 \
             RETURNING {ITEM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.image_url)
            .bind(patch.official_link)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_comments(&self, item_id: Uuid, category: Category) -> AppResult<Vec<Comment>> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE item_id = $1 AND category = $2 \
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Comment>(&query)
            .bind(item_id)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, user_id, user_name, item_id, category, text, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(comment.id)
        .bind(comment.user_id)
        .bind(&comment.user_name)
        .bind(comment.item_id)
        .bind(comment.category.as_str())
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comments_by_item(&self, item_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE item_id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, UserRecord>,
    items: HashMap<Uuid, Item>,
    comments: Vec<Comment>,
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Used by the test suites and
/// for database-less local runs. Each method takes the lock once, so every call
/// is atomic just like a single document-store operation.
#[derive(Default)]
pub struct InMemoryRepository {
    collections: RwLock<Collections>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        Ok(self.collections.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: UserRecord) -> AppResult<UserRecord> {
        let mut collections = self.collections.write().await;
        if collections.users.values().any(|u| u.email == user.email) {
            return Err(duplicate_email());
        }
        collections.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_item(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.collections.read().await.items.get(&id).cloned())
    }

    async fn find_items_by_category(&self, category: Category) -> AppResult<Vec<Item>> {
        let collections = self.collections.read().await;
        let mut items: Vec<Item> = collections
            .items
            .values()
            .filter(|item| item.category == category)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn insert_item(&self, item: Item) -> AppResult<Item> {
        self.collections
            .write()
            .await
            .items
            .insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: Uuid, patch: ItemPatch) -> AppResult<Option<Item>> {
        let mut collections = self.collections.write().await;
        Ok(collections.items.get_mut(&id).map(|item| {
            patch.apply(item);
            item.clone()
        }))
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.collections.write().await.items.remove(&id).is_some())
    }

    async fn find_comments(&self, item_id: Uuid, category: Category) -> AppResult<Vec<Comment>> {
        let collections = self.collections.read().await;
        let mut comments: Vec<Comment> = collections
            .comments
            .iter()
            .filter(|c| c.item_id == item_id && c.category == category)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, comment: Comment) -> AppResult<Comment> {
        self.collections.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comments_by_item(&self, item_id: Uuid) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let before = collections.comments.len();
        collections.comments.retain(|c| c.item_id != item_id);
        Ok((before - collections.comments.len()) as u64)
    }
}
