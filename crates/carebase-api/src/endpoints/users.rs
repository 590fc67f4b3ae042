//! Account endpoints.
//!
//! Self service:
//! - `GET/PUT /api/users/me`
//! - `POST /api/users/me/avatar` (multipart `file`)
//!
//! Administration (`users:admin`):
//! - `GET /api/users`
//! - `GET/PUT/DELETE /api/users/:id`

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use tracing::info;

use carebase_contracts::{
    auth::Principal,
    user::{UserResponse, UserUpdate},
};

use super::auth::{email_taken, hash_password};
use super::Page;
use crate::context::ApiContext;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::middleware::auth::CurrentUser;
use crate::upload::{read_file_field, store_upload, AVATAR_DEFAULT_EXT};

const USER_NOT_FOUND: &str = "User not found";

/// `GET /api/users/me`
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    ctx.gate.authorize(&principal, "read", "self")?;
    Ok(Json(user.into()))
}

/// `PUT /api/users/me`: `is_admin` in the body is ignored.
pub async fn update_me(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> Result<Json<UserResponse>, ApiError> {
    let mut update: UserUpdate = ctx
        .gate
        .admit(&principal, "update", "self", body, &ctx.schemas.user_update)?;
    update.is_admin = None;

    let user = apply_update(&ctx, &principal.user_id, update).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user))
}

/// `POST /api/users/me/avatar`
pub async fn upload_avatar(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    mut multipart: Multipart,
) -> Result<Json<UserResponse>, ApiError> {
    ctx.gate.authorize(&principal, "upload", "self")?;

    let file = read_file_field(&mut multipart, ctx.settings.max_upload_bytes).await?;
    let url = store_upload(
        &ctx,
        &ctx.settings.avatar_bucket,
        &principal.user_id,
        &file,
        AVATAR_DEFAULT_EXT,
    )?;

    let user = ctx
        .users()
        .update(&principal.user_id, &json!({ "avatar_url": url }))?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.into()))?;
    Ok(Json(user.into()))
}

/// `GET /api/users?skip&limit`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    ctx.gate.authorize(&principal, "list", "user")?;
    let users = ctx.users().get_multi(&page.query())?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// `GET /api/users/:id`
pub async fn read(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    ctx.gate.authorize(&principal, "read", "user")?;
    let user = ctx
        .users()
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.into()))?;
    Ok(Json(user.into()))
}

/// `PUT /api/users/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<Json<UserResponse>, ApiError> {
    let update: UserUpdate = ctx
        .gate
        .admit(&principal, "update", "user", body, &ctx.schemas.user_update)?;
    let user = apply_update(&ctx, &id, update).await?;
    info!(admin = %principal.user_id, user_id = %user.id, "user updated by administrator");
    Ok(Json(user))
}

/// `DELETE /api/users/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.gate.authorize(&principal, "delete", "user")?;
    if id == principal.user_id {
        return Err(ApiError::BadRequest("Cannot delete your own user account".into()));
    }
    if !ctx.users().delete(&id)? {
        return Err(ApiError::NotFound(USER_NOT_FOUND.into()));
    }
    info!(admin = %principal.user_id, user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Persist `update` on account `id`. A new password is hashed; a new email
/// must not belong to another account.
async fn apply_update(
    ctx: &ApiContext,
    id: &str,
    mut update: UserUpdate,
) -> Result<UserResponse, ApiError> {
    let password = update.password.take();
    let mut patch = serde_json::to_value(&update)
        .map_err(|e| ApiError::Internal(format!("user patch encode: {e}")))?;
    if let Some(password) = password {
        patch["hashed_password"] = Value::String(hash_password(ctx, password).await?);
    }

    let user = ctx
        .users()
        .update_unique(id, &patch, "email")
        .map_err(email_taken)?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.into()))?;
    Ok(user.into())
}
