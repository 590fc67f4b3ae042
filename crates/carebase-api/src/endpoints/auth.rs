//! Registration, login, refresh-token rotation and logout.
//!
//! - `POST /api/auth/register`
//! - `POST /api/auth/login`
//! - `POST /api/auth/refresh`: reads the `refresh_token` cookie
//! - `POST /api/auth/logout`

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use carebase_contracts::{
    auth::{LoginRequest, TokenKind, TokenPair},
    error::CarebaseError,
    user::{User, UserCreate, UserResponse},
};
use carebase_core::gate::decode;

use crate::context::ApiContext;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::middleware::auth::bearer_token;

pub const REFRESH_COOKIE: &str = "refresh_token";
const BAD_CREDENTIALS: &str = "Incorrect email or password";
const EMAIL_TAKEN: &str = "Email already registered";

/// `POST /api/auth/register`: create a non-admin account.
pub async fn register(
    State(ctx): State<ApiContext>,
    JsonBody(body): JsonBody,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    ctx.gate.validate(&body, &ctx.schemas.register)?;
    let input: UserCreate = decode(body)?;

    let users = ctx.users();
    if users.find_by("email", input.email.as_str())?.is_some() {
        return Err(ApiError::BadRequest(EMAIL_TAKEN.into()));
    }

    let hashed_password = hash_password(&ctx, input.password).await?;
    let now = Utc::now();
    let user = User {
        id: carebase_contracts::new_record_id(),
        email: input.email,
        full_name: input.full_name,
        is_active: input.is_active,
        is_admin: false,
        avatar_url: input.avatar_url,
        hashed_password,
        created_at: now,
        updated_at: now,
    };
    // The lookup above can go stale while hashing; this insert re-checks.
    let created = users.create_unique(&user, "email").map_err(email_taken)?;
    info!(user_id = %created.id, "user registered");

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `POST /api/auth/login`: exchange credentials for a token pair.
pub async fn login(
    State(ctx): State<ApiContext>,
    JsonBody(body): JsonBody,
) -> Result<Response, ApiError> {
    ctx.gate.validate(&body, &ctx.schemas.login)?;
    let input: LoginRequest = decode(body)?;

    let Some(user) = ctx.users().find_by("email", input.email.as_str())? else {
        verify_password(&ctx, input.password, ctx.decoy_hash.to_string()).await?;
        warn!("login for unknown email");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    };
    if !verify_password(&ctx, input.password, user.hashed_password.clone()).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }
    if !user.is_active {
        return Err(ApiError::InactiveUser);
    }

    let pair = ctx.tokens.issue_pair(&user.id)?;
    info!(user_id = %user.id, remember_me = input.remember_me, "user logged in");

    if input.remember_me {
        Ok(with_refresh_cookie(&ctx, pair))
    } else {
        Ok(Json(pair).into_response())
    }
}

/// `POST /api/auth/refresh`: rotate the refresh token from the cookie.
pub async fn refresh(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token missing".into()))?;

    let user_id = ctx
        .tokens
        .resolve(&token, TokenKind::Refresh)
        .map_err(invalid_refresh)?;
    let user = ctx
        .users()
        .get(&user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".into()))?;
    if !user.is_active {
        return Err(ApiError::InactiveUser);
    }

    let pair = ctx.tokens.rotate(&token).map_err(invalid_refresh)?;
    info!(user_id = %user.id, "refresh token rotated");
    Ok(with_refresh_cookie(&ctx, pair))
}

/// `POST /api/auth/logout`: clear the cookie and forget presented tokens.
pub async fn logout(State(ctx): State<ApiContext>, headers: HeaderMap) -> Result<Response, ApiError> {
    let mut revoked = 0;
    if let Some(token) = cookie_value(&headers, REFRESH_COOKIE) {
        revoked += usize::from(ctx.tokens.revoke(&token)?);
    }
    if let Some(token) = bearer_token(&headers) {
        revoked += usize::from(ctx.tokens.revoke(&token)?);
    }
    info!(revoked, "logout");

    let mut response = Json(json!({ "detail": "Successfully logged out" })).into_response();
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_static("refresh_token=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0"),
    );
    Ok(response)
}

/// Map a uniqueness conflict on `email` to the registration error.
pub(crate) fn email_taken(err: CarebaseError) -> ApiError {
    match err {
        CarebaseError::Conflict { .. } => ApiError::BadRequest(EMAIL_TAKEN.into()),
        other => other.into(),
    }
}

fn invalid_refresh(err: CarebaseError) -> ApiError {
    match err {
        CarebaseError::Authentication { .. } => ApiError::Unauthorized("Invalid refresh token".into()),
        other => other.into(),
    }
}

fn with_refresh_cookie(ctx: &ApiContext, pair: TokenPair) -> Response {
    let max_age = ctx.tokens.refresh_ttl().num_seconds();
    let cookie = format!(
        "{REFRESH_COOKIE}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age}",
        pair.refresh_token
    );
    let mut response = Json(pair).into_response();
    // Tokens are URL-safe base64, always a valid header value.
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Value of cookie `name` from any `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Hash on the blocking pool.
pub(crate) async fn hash_password(ctx: &ApiContext, password: String) -> Result<String, ApiError> {
    let hasher = ctx.hasher;
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("password hash task failed: {e}")))
}

async fn verify_password(ctx: &ApiContext, password: String, stored: String) -> Result<bool, ApiError> {
    let hasher = ctx.hasher;
    tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("password verify task failed: {e}")))
}
