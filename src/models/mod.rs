use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User record as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-native key in its string form
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Document-style stores keep the address under this name instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(alias = "password_hashed")]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// E-mail addresses held under either field name
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        [&self.email, &self.email_address]
            .into_iter()
            .filter_map(non_empty)
    }
}

/// User information returned to clients, never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email.or(user.email_address),
            created_at: user.created_at,
        }
    }
}

/// Login request body. The identifier may arrive under any of four names.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginRequest {
    /// First non-empty of `username`, `email_address`, `email`, `identifier`
    pub fn user_identifier(&self) -> Option<&str> {
        [
            &self.username,
            &self.email_address,
            &self.email,
            &self.identifier,
        ]
        .into_iter()
        .find_map(non_empty)
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub jwt: String,
}

/// Token fields accepted in a request body or query string
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub jwt: Option<String>,
}

pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_precedence() {
        let request: LoginRequest = serde_json::from_value(json!({
            "identifier": "u1",
            "email": "alice@example.com",
            "username": "alice",
            "password": "pw"
        }))
        .unwrap();
        assert_eq!(request.user_identifier(), Some("alice"));

        let request: LoginRequest = serde_json::from_value(json!({
            "username": "",
            "email_address": "alice@example.com",
            "identifier": "u1"
        }))
        .unwrap();
        assert_eq!(request.user_identifier(), Some("alice@example.com"));
        assert_eq!(request.password(), None);
    }

    #[test]
    fn test_user_accepts_document_field_names() {
        let user: User = serde_json::from_value(json!({
            "_id": "507f1f77bcf86cd799439011",
            "username": "alice",
            "email_address": "alice@example.com",
            "password_hashed": "$2b$04$abc"
        }))
        .unwrap();

        assert_eq!(user.id, "507f1f77bcf86cd799439011");
        assert_eq!(user.email_address.as_deref(), Some("alice@example.com"));
        assert_eq!(user.password_hash, "$2b$04$abc");

        let profile = UserProfile::from(user);
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_record_may_carry_both_email_fields() {
        let user: User = serde_json::from_value(json!({
            "id": "u1",
            "username": "alice",
            "email": "alice@example.com",
            "email_address": "a.liddell@example.com",
            "password_hash": "hash"
        }))
        .unwrap();

        let emails: Vec<&str> = user.emails().collect();
        assert_eq!(emails, ["alice@example.com", "a.liddell@example.com"]);
    }

    #[test]
    fn test_profile_never_contains_password_hash() {
        let user = User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: None,
            email_address: None,
            password_hash: "$argon2id$v=19$secret".to_string(),
            created_at: None,
        };
        let json = serde_json::to_string(&UserProfile::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }
}
