//! HS256 token signing and verification.

use crate::utils::{config::JwtConfig, ApiError, ApiResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

// A century; keeps expiry arithmetic inside chrono's range.
const MAX_EXPIRATION_HOURS: i64 = 24 * 366 * 100;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the authenticated user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies tokens with the configured shared secret
pub struct TokenCodec {
    keys: Option<SigningKeys>,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let keys = config
            .secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(|secret| SigningKeys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            });

        Self {
            keys,
            ttl: Duration::hours(
                i64::try_from(config.expiration_hours)
                    .unwrap_or(MAX_EXPIRATION_HOURS)
                    .min(MAX_EXPIRATION_HOURS),
            ),
        }
    }

    pub fn has_secret(&self) -> bool {
        self.keys.is_some()
    }

    fn keys(&self) -> ApiResult<&SigningKeys> {
        self.keys
            .as_ref()
            .ok_or_else(|| ApiError::internal("Token secret not set"))
    }

    /// Claims for `user_id`, issued now and expiring after the configured lifetime
    pub fn claims_for(&self, user_id: &str) -> Claims {
        let now = Utc::now();
        Claims {
            user_id: Some(user_id.to_string()),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        }
    }

    pub fn sign(&self, claims: &Claims) -> ApiResult<String> {
        let keys = self.keys()?;
        encode(&Header::new(Algorithm::HS256), claims, &keys.encoding).map_err(|e| {
            tracing::error!("Token signing failed: {}", e);
            ApiError::internal("Failed to sign token")
        })
    }

    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let keys = self.keys()?;
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                ApiError::forbidden("Invalid token")
            })
    }
}
