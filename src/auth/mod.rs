pub mod password;
pub mod token;

pub use token::{Claims, TokenCodec};

use crate::{
    db::{UserFilter, UserStore},
    models::{non_empty, TokenParams, User},
    utils::{config::JwtConfig, ApiError, ApiResult},
};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, info};

/// Authentication service
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, jwt: &JwtConfig) -> Self {
        Self {
            store,
            tokens: TokenCodec::new(jwt),
        }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Find the first user whose username, e-mail or key equals `identifier`
    pub async fn find_user(&self, identifier: &str) -> ApiResult<User> {
        let filter = UserFilter::identifier(identifier, self.store.key_format());
        self.find_by(&filter, identifier).await
    }

    async fn find_by(&self, filter: &UserFilter, shown_as: &str) -> ApiResult<User> {
        let user = self
            .store
            .find_one(filter)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("User {shown_as} not found")))?;

        debug!("User {} found in the store", user.id);
        Ok(user)
    }

    /// Check `plaintext` against the user's stored hash, handing the user back on a match.
    /// Hash verification runs on the blocking pool.
    pub async fn check_password(&self, plaintext: &str, user: User) -> ApiResult<User> {
        let plaintext = plaintext.to_string();
        let hash = user.password_hash.clone();
        let matched = task::spawn_blocking(move || password::verify_password(&plaintext, &hash))
            .await
            .map_err(|e| {
                error!("Password check task failed: {}", e);
                ApiError::internal("Password check failed")
            })??;

        if !matched {
            return Err(ApiError::forbidden("Incorrect password"));
        }

        debug!("Password correct for user {}", user.id);
        Ok(user)
    }

    /// Sign a token carrying only the user's identifier
    pub fn issue_token(&self, user: &User) -> ApiResult<String> {
        let token = self.tokens.sign(&self.tokens.claims_for(&user.id))?;
        info!("Token issued for user {}", user.id);
        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        self.tokens.verify(token)
    }

    /// Verify `token` and load the user it names
    pub async fn resolve_user_from_token(&self, token: &str) -> ApiResult<User> {
        let claims = self.verify_token(token)?;

        let user_id = claims
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request("No user ID in token"))?;

        if !self.store.key_format().accepts(&user_id) {
            return Err(ApiError::bad_request("Invalid user ID"));
        }

        let user = self.find_by(&UserFilter::id(&user_id), &user_id).await?;
        debug!("User {} retrieved using token", user.id);
        Ok(user)
    }

    /// Authenticate `identifier`/`password` and issue a token.
    ///
    /// The stages run strictly in order and stop at the first failure: the
    /// password is only checked once the user exists, and a token is only
    /// signed once the password has been verified.
    pub async fn login(&self, identifier: &str, password: &str) -> ApiResult<String> {
        let user = self.find_user(identifier).await?;
        let user = self.check_password(password, user).await?;
        self.issue_token(&user)
    }
}

/// Pick the request token.
///
/// Order: body `token`, body `jwt`, query `jwt`, query `token`, then the
/// `Authorization: Bearer` header. Empty values are skipped.
pub fn select_token(
    body: Option<&TokenParams>,
    query: &TokenParams,
    headers: &HeaderMap,
) -> ApiResult<String> {
    let from_body = body.and_then(|b| non_empty(&b.token).or_else(|| non_empty(&b.jwt)));
    let from_query = non_empty(&query.jwt).or_else(|| non_empty(&query.token));

    from_body
        .or(from_query)
        .map(str::to_string)
        .or_else(|| extract_bearer_token(headers))
        .ok_or_else(|| ApiError::bad_request("Missing token"))
}

/// Extract the bearer token from the `Authorization` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_credentials)
        .map(str::to_string)
}

// The scheme name is case-insensitive (RFC 9110 section 11.1).
fn bearer_credentials(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

/// Header-only token lookup, with distinct failures for a missing header and
/// a header without a token part
pub fn token_from_authorization(headers: &HeaderMap) -> ApiResult<String> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::bad_request("Authorization header not set"))?
        .to_str()
        .map_err(|_| ApiError::bad_request("Token not found in authorization header"))?;

    bearer_credentials(header)
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Token not found in authorization header"))
}
