use crate::{
    auth::{select_token, token_from_authorization, Claims},
    models::{LoginRequest, LoginResponse, TokenParams, UserProfile},
    utils::{ApiError, ApiResult},
    AppState,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

/// Handle user login
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<LoginResponse>> {
    let request: LoginRequest = parse_json_body(&body)?.unwrap_or_default();

    let identifier = request
        .user_identifier()
        .ok_or_else(|| ApiError::bad_request("Missing username or e-mail address"))?;
    let password = request
        .password()
        .ok_or_else(|| ApiError::bad_request("Missing password"))?;

    let jwt = state.auth_service.login(identifier, password).await?;

    Ok(Json(LoginResponse { jwt }))
}

/// Verify a token and return its decoded claims
pub async fn verify_token(
    State(state): State<AppState>,
    query: Result<Query<TokenParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Claims>> {
    let token = request_token(query, &headers, &body)?;
    let claims = state.auth_service.verify_token(&token)?;

    Ok(Json(claims))
}

/// Resolve a token to the user it was issued for
pub async fn user_from_token(
    State(state): State<AppState>,
    query: Result<Query<TokenParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UserProfile>> {
    let token = request_token(query, &headers, &body)?;
    let user = state.auth_service.resolve_user_from_token(&token).await?;

    Ok(Json(user.into()))
}

/// Same as `user_from_token`, but only reads the `Authorization` header
pub async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UserProfile>> {
    let token = token_from_authorization(&headers)?;
    let user = state.auth_service.resolve_user_from_token(&token).await?;

    Ok(Json(user.into()))
}

fn request_token(
    query: Result<Query<TokenParams>, QueryRejection>,
    headers: &HeaderMap,
    body: &Bytes,
) -> ApiResult<String> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(format!("Invalid query: {e}")))?;
    let body: Option<TokenParams> = parse_json_body(body)?;

    select_token(body.as_ref(), &query, headers)
}

/// An empty body parses as `None`; anything else must be JSON
fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
}
