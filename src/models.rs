use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enumerations ---

/// Role
///
/// Flat two-value role used for access control. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Category
///
/// The two content sections of the site. Items and comments are always scoped to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Category {
    #[default]
    Games,
    Heroes,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Games => "games",
            Category::Heroes => "heroes",
        }
    }
}

/// Raised when a stored text column does not name a known enum variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownVariant { kind: "role", value }),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "games" => Ok(Category::Games),
            "heroes" => Ok(Category::Heroes),
            _ => Err(UnknownVariant { kind: "category", value }),
        }
    }
}

// --- Core Documents (Mapped to Storage) ---

/// UserRecord
///
/// The stored user document, including the password hash. Never serialized
/// into a response; convert to `User` first.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Builds a fresh record with a new id and the current timestamp.
    pub fn new(email: String, name: String, role: Role, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            role,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// User
///
/// The public view of an account, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            role: record.role,
            created_at: record.created_at,
        }
    }
}

/// Item
///
/// A game or hero entry. Only administrators create, edit or delete these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub official_link: String,
    #[sqlx(try_from = "String")]
    pub category: Category,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<CreateItemRequest> for Item {
    fn from(req: CreateItemRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: req.title,
            description: req.description,
            image_url: req.image_url,
            official_link: req.official_link,
            category: req.category,
            created_at: Utc::now(),
        }
    }
}

/// Comment
///
/// A user comment on an item. `user_name` is a snapshot of the author's name at
/// creation time and is not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub item_id: Uuid,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Attributes a new comment to `author`.
    pub fn new(author: &User, req: CreateCommentRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: author.id,
            user_name: author.name.clone(),
            item_id: req.item_id,
            category: req.category,
            text: req.text,
            created_at: Utc::now(),
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// CreateItemRequest
///
/// Input payload for `POST /api/items`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateItemRequest {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub official_link: String,
    pub category: Category,
}

/// ItemPatch
///
/// Partial update payload for `PUT /api/items/{id}`. Absent or null fields are
/// left untouched. The category of an item cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_link: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.official_link.is_none()
    }

    /// Applies every provided field to `item`, one by one.
    pub fn apply(&self, item: &mut Item) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(image_url) = &self.image_url {
            item.image_url = image_url.clone();
        }
        if let Some(official_link) = &self.official_link {
            item.official_link = official_link.clone();
        }
    }
}

/// CreateCommentRequest
///
/// Input payload for `POST /api/comments`. The author is taken from the token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub item_id: Uuid,
    pub category: Category,
    pub text: String,
}

// --- Response Payloads (Output Schemas) ---

/// TokenResponse
///
/// Returned by register and login: the bearer token plus the public user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

impl TokenResponse {
    pub fn bearer(access_token: String, user: User) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

// --- Input checks ---

/// Shape check for an email address: one `@`, a non-empty local part and a
/// dotted domain, no whitespace. Deliverability is not checked.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    }
}

/// Canonical form used for storage and lookup: surrounding whitespace removed
/// and the domain lowercased. The local part keeps its case.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_ascii_lowercase()),
        None => email.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        Item::from(CreateItemRequest {
            title: "Halo".into(),
            description: "Sci-fi shooter".into(),
            image_url: "https://img.test/halo.png".into(),
            official_link: "https://halo.test".into(),
            category: Category::Games,
        })
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut item = sample_item();
        let original = item.clone();
        let patch = ItemPatch {
            title: Some("Halo Infinite".into()),
            ..Default::default()
        };

        patch.apply(&mut item);

        assert_eq!(item.title, "Halo Infinite");
        assert_eq!(item.description, original.description);
        assert_eq!(item.image_url, original.image_url);
        assert_eq!(item.official_link, original.official_link);
        assert_eq!(item.id, original.id);
    }

    #[test]
    fn null_fields_deserialize_as_absent() {
        let patch: ItemPatch =
            serde_json::from_str(r#"{"title": null, "description": "new"}"#).unwrap();
        assert!(patch.title.is_none());
        assert_eq!(patch.description.as_deref(), Some("new"));
        assert!(!patch.is_empty());
        assert!(ItemPatch::default().is_empty());
    }

    #[test]
    fn user_view_drops_password_hash() {
        let record = UserRecord::new("a@b.io".into(), "Ana".into(), Role::User, "$2b$hash".into());
        let json = serde_json::to_value(User::from(record)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn enums_round_trip_through_stored_text() {
        assert_eq!(Role::try_from("admin".to_string()).unwrap(), Role::Admin);
        assert_eq!(Category::try_from("heroes".to_string()).unwrap(), Category::Heroes);
        assert!(Category::try_from("movies".to_string()).is_err());
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("player@supergamer.com"));
        assert!(!is_valid_email("player"));
        assert!(!is_valid_email("@supergamer.com"));
        assert!(!is_valid_email("player@localhost"));
        assert!(!is_valid_email("pla yer@supergamer.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn normalize_email_lowercases_only_the_domain() {
        assert_eq!(normalize_email(" Player@SuperGamer.COM "), "Player@supergamer.com");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }
}
