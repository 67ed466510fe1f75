/// Avatar endpoints
///
/// Uploads arrive as multipart form data in a field named `avatar`.
/// Accepted files are normalized to a 250x250 PNG before storage, so the
/// public fetch endpoint always serves `image/png` regardless of what was
/// uploaded.
///
/// # Endpoints
///
/// - `POST /users/me/avatar` - Upload or replace own avatar
/// - `DELETE /users/me/avatar` - Remove own avatar
/// - `GET /users/:id/avatar` - Fetch any user's avatar (public)
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Extension,
};
use taskhub_shared::{
    avatar::{has_allowed_extension, normalize, AvatarError, MAX_AVATAR_BYTES},
    models::user::User,
};
use uuid::Uuid;

/// Upload or replace the caller's avatar
///
/// Reads the `avatar` field from the multipart body, checks the filename
/// extension and size, and stores the normalized PNG.
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, wrong file type, too large, or
///   bytes that do not decode as an image
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    mut multipart: Multipart,
) -> ApiResult<StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !has_allowed_extension(&filename) {
            return Err(AvatarError::UnsupportedFile.into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        if data.len() > MAX_AVATAR_BYTES {
            return Err(AvatarError::TooLarge.into());
        }

        let png = normalize(&data)?;
        User::set_avatar(&state.db, session.user.id, &png)
            .await
            .map_err(|err| ApiError::Internal(err.to_string()))?;

        tracing::debug!(user_id = %session.user.id, bytes = png.len(), "avatar stored");
        return Ok(StatusCode::OK);
    }

    Err(ApiError::BadRequest(
        "Missing avatar upload field.".to_string(),
    ))
}

/// Remove the caller's avatar
///
/// Succeeds even when no avatar was stored.
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    User::clear_avatar(&state.db, session.user.id)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(StatusCode::OK)
}

/// Fetch a user's avatar by user id, no authentication required
///
/// The id arrives as a plain string so a malformed id reads as a missing
/// avatar rather than a routing error.
///
/// # Errors
///
/// - `404 Not Found`: Unknown user, malformed id, or no avatar stored
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = Uuid::parse_str(&user_id).map_err(|_| ApiError::NotFound)?;

    let avatar = User::find_avatar(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(([(CONTENT_TYPE, "image/png")], avatar))
}
