mod memory;

pub use memory::MemoryUserStore;

use crate::{
    models::User,
    utils::{config::DatabaseConfig, ApiError, ApiResult},
};
use async_trait::async_trait;
use postgrest::Postgrest;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Shape of the store's native user key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFormat {
    /// RFC 4122 UUID
    Uuid,
    /// 24 hex characters, as produced by document databases
    ObjectId,
    /// Any non-empty string
    Text,
}

impl KeyFormat {
    /// Whether `raw` is a well-formed key for this format
    pub fn accepts(self, raw: &str) -> bool {
        match self {
            Self::Uuid => Uuid::parse_str(raw).is_ok(),
            Self::ObjectId => raw.len() == 24 && raw.bytes().all(|b| b.is_ascii_hexdigit()),
            Self::Text => !raw.is_empty(),
        }
    }
}

impl FromStr for KeyFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" => Ok(Self::Uuid),
            "object_id" | "objectid" => Ok(Self::ObjectId),
            "text" => Ok(Self::Text),
            other => Err(anyhow::anyhow!("Unknown key format: {other}")),
        }
    }
}

/// A single equality clause against a user field.
///
/// `Email` stands for every column the store keeps addresses in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserField {
    Username(String),
    Email(String),
    Id(String),
}

impl UserField {
    fn value(&self) -> &str {
        match self {
            Self::Username(v) | Self::Email(v) | Self::Id(v) => v,
        }
    }

    fn columns<'a>(&self, email_columns: &'a [String]) -> Vec<&'a str> {
        match self {
            Self::Username(_) => vec!["username"],
            Self::Email(_) => email_columns.iter().map(String::as_str).collect(),
            Self::Id(_) => vec!["id"],
        }
    }

    fn matches(&self, user: &User) -> bool {
        match self {
            Self::Username(v) => &user.username == v,
            Self::Email(v) => user.emails().any(|email| email == v),
            Self::Id(v) => &user.id == v,
        }
    }
}

/// Disjunction of field clauses: a user matches if any clause matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilter {
    any_of: Vec<UserField>,
}

impl UserFilter {
    /// Match `identifier` against username or e-mail, and against the key
    /// when it is well-formed for `key_format`.
    pub fn identifier(identifier: &str, key_format: KeyFormat) -> Self {
        let mut any_of = vec![
            UserField::Username(identifier.to_string()),
            UserField::Email(identifier.to_string()),
        ];
        if key_format.accepts(identifier) {
            any_of.push(UserField::Id(identifier.to_string()));
        }
        Self { any_of }
    }

    /// Match the store key only
    pub fn id(id: &str) -> Self {
        Self {
            any_of: vec![UserField::Id(id.to_string())],
        }
    }

    pub fn clauses(&self) -> &[UserField] {
        &self.any_of
    }

    pub fn matches(&self, user: &User) -> bool {
        self.any_of.iter().any(|field| field.matches(user))
    }

    /// Render as the body of a PostgREST `or=(...)` filter, expanding e-mail
    /// clauses over `email_columns`
    pub fn to_postgrest(&self, email_columns: &[String]) -> String {
        self.any_of
            .iter()
            .flat_map(|field| {
                let value = quote(field.value());
                field
                    .columns(email_columns)
                    .into_iter()
                    .map(move |column| format!("{column}.eq.{value}"))
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

// PostgREST reserves `,`, `.`, `:` and parentheses inside logical filters; a
// double-quoted value with backslash escapes is taken literally.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Read-only access to user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// First record matching `filter`, or `None`
    async fn find_one(&self, filter: &UserFilter) -> ApiResult<Option<User>>;

    /// Shape of this store's native key
    fn key_format(&self) -> KeyFormat;
}

/// User store backed by a PostgREST document endpoint
#[derive(Clone)]
pub struct Database {
    client: Postgrest,
    collection: String,
    email_columns: Vec<String>,
    key_format: KeyFormat,
}

impl Database {
    /// Create a new store client
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut client = Postgrest::new(format!("{}/rest/v1", config.url));
        if let Some(key) = &config.api_key {
            client = client
                .insert_header("apikey", key)
                .insert_header("Authorization", format!("Bearer {key}"));
        }

        Self {
            client,
            collection: config.collection.clone(),
            email_columns: config.email_columns.clone(),
            key_format: config.key_format,
        }
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_one(&self, filter: &UserFilter) -> ApiResult<Option<User>> {
        let response = self
            .client
            .from(&self.collection)
            .select("*")
            .or(filter.to_postgrest(&self.email_columns))
            .execute()
            .await
            .map_err(|e| {
                tracing::error!("User store request failed: {}", e);
                ApiError::store_unavailable("User store unavailable")
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("User store answered with status {}", status);
            return Err(ApiError::store_unavailable("User store unavailable"));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read user store response: {}", e);
            ApiError::store_unavailable("User store unavailable")
        })?;

        let users: Vec<User> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unexpected user store payload: {}", e);
            ApiError::store_unavailable("User store returned an unreadable record")
        })?;

        Ok(users.into_iter().next())
    }

    fn key_format(&self) -> KeyFormat {
        self.key_format
    }
}
