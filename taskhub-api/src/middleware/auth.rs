//! Bearer-token authentication middleware.
//!
//! Every protected route runs through [`require_auth`]. The middleware
//! verifies the JWT signature, then checks that the exact token string is
//! still present in the user's stored token list. A token that was signed
//! correctly but has since been revoked by logout is rejected the same way
//! as a forged one.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use taskhub_shared::{auth::token::verify_token, models::user::User};

use crate::{app::AppState, error::ApiError};

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`] and read back by handlers.
///
/// Carries the token that authenticated this request so that logout can
/// revoke exactly the session it was called with.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Authenticates a request from its `Authorization: Bearer <token>` header.
///
/// All failure modes map to the same 401 response so the body never leaks
/// whether the token was missing, malformed, forged, or revoked. Database
/// errors during the lookup are the one exception and surface as 500.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?
        .to_string();

    let user_id =
        verify_token(&token, &state.config.jwt.secret).map_err(|_| ApiError::Unauthenticated)?;

    let user = User::find_by_id_and_token(&state.db, user_id, &token)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .ok_or(ApiError::Unauthenticated)?;

    request.extensions_mut().insert(AuthSession { user, token });

    Ok(next.run(request).await)
}
