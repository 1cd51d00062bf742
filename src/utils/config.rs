use crate::db::KeyFormat;
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// User store configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec!["*".to_string()],
            body_limit_bytes: 16 * 1024,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub collection: String,
    /// Columns holding e-mail addresses, all matched on login
    pub email_columns: Vec<String>,
    pub key_format: KeyFormat,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            api_key: None,
            collection: "users".to_string(),
            email_columns: vec!["email".to_string()],
            key_format: KeyFormat::Uuid,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared signing secret. `None` makes every token operation fail.
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub expiration_hours: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            expiration_hours: 24,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("collection", &self.collection)
            .field("email_columns", &self.email_columns)
            .field("key_format", &self.key_format)
            .finish()
    }
}

// Keeps the secret out of startup logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values are treated as unset.
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required"))?;
        url::Url::parse(&database_url)
            .map_err(|e| anyhow::anyhow!("Invalid DATABASE_URL: {e}"))?;

        let email_columns: Vec<String> = var("DATABASE_EMAIL_COLUMNS")
            .unwrap_or_else(|| "email".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        // Column names are spliced into store filters unquoted.
        if let Some(bad) = email_columns
            .iter()
            .find(|column| !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            anyhow::bail!("Invalid DATABASE_EMAIL_COLUMNS entry: {bad}");
        }
        if email_columns.is_empty() {
            anyhow::bail!("DATABASE_EMAIL_COLUMNS must name at least one column");
        }

        let config = Self {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: var("PORT")
                    .unwrap_or_else(|| "3001".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid PORT value"))?,
                cors_origins: var("CORS_ORIGINS")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                body_limit_bytes: var("BODY_LIMIT_BYTES")
                    .unwrap_or_else(|| "16384".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid BODY_LIMIT_BYTES value"))?,
            },
            database: DatabaseConfig {
                url: database_url.trim_end_matches('/').to_string(),
                api_key: var("DATABASE_API_KEY"),
                collection: var("DATABASE_COLLECTION").unwrap_or_else(|| "users".to_string()),
                email_columns,
                key_format: var("DATABASE_KEY_FORMAT")
                    .map(|value| value.parse())
                    .transpose()?
                    .unwrap_or(KeyFormat::Uuid),
            },
            jwt: JwtConfig {
                secret: var("JWT_SECRET"),
                expiration_hours: var("JWT_EXPIRATION_HOURS")
                    .unwrap_or_else(|| "24".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid JWT_EXPIRATION_HOURS value"))?,
            },
        };

        if config.jwt.expiration_hours == 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be at least 1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_set() {
        let config = load(&[("DATABASE_URL", "http://store.local/")]).unwrap();

        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.cors_origins, vec!["*"]);
        assert_eq!(config.database.url, "http://store.local");
        assert_eq!(config.database.collection, "users");
        assert_eq!(config.database.email_columns, vec!["email"]);
        assert_eq!(config.database.key_format, KeyFormat::Uuid);
        assert!(config.jwt.secret.is_none());
        assert_eq!(config.jwt.expiration_hours, 24);
    }

    #[test]
    fn test_database_url_is_required_and_validated() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DATABASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_empty_secret_counts_as_unset() {
        let config = load(&[("DATABASE_URL", "http://store.local"), ("JWT_SECRET", "")]).unwrap();
        assert!(config.jwt.secret.is_none());
    }

    #[test]
    fn test_explicit_values_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "http://store.local"),
            ("DATABASE_KEY_FORMAT", "object_id"),
            ("DATABASE_COLLECTION", "accounts"),
            ("DATABASE_EMAIL_COLUMNS", "email_address, email"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRATION_HOURS", "2"),
            ("PORT", "8080"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.database.key_format, KeyFormat::ObjectId);
        assert_eq!(config.database.collection, "accounts");
        assert_eq!(config.database.email_columns, vec!["email_address", "email"]);
        assert_eq!(config.jwt.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.jwt.expiration_hours, 2);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(load(&[("DATABASE_URL", "http://store.local"), ("PORT", "http")]).is_err());
        assert!(load(&[
            ("DATABASE_URL", "http://store.local"),
            ("JWT_EXPIRATION_HOURS", "0")
        ])
        .is_err());
        assert!(load(&[
            ("DATABASE_URL", "http://store.local"),
            ("DATABASE_KEY_FORMAT", "integer")
        ])
        .is_err());
        assert!(load(&[
            ("DATABASE_URL", "http://store.local"),
            ("DATABASE_EMAIL_COLUMNS", "email.eq.x),id")
        ])
        .is_err());
        assert!(load(&[
            ("DATABASE_URL", "http://store.local"),
            ("DATABASE_EMAIL_COLUMNS", " , ")
        ])
        .is_err());
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let jwt = JwtConfig {
            secret: Some("top-secret".to_string()),
            expiration_hours: 1,
        };
        let rendered = format!("{jwt:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
