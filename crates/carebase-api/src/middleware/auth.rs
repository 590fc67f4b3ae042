//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the token
//! registry, loads the account and injects `Principal` and `CurrentUser`
//! into request extensions for downstream handlers.

use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use carebase_contracts::{
    auth::{Principal, TokenKind},
    user::User,
};

use crate::context::ApiContext;
use crate::error::ApiError;

/// The authenticated, active account behind the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Require a valid access token belonging to an active user.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

    let user_id = ctx.tokens.resolve(&token, TokenKind::Access)?;
    let user = ctx
        .users()
        .get(&user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".into()))?;
    if !user.is_active {
        return Err(ApiError::InactiveUser);
    }

    req.extensions_mut().insert(Principal::from_user(&user));
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// The token from an `Authorization: Bearer` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
