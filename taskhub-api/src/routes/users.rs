/// User account endpoints
///
/// This module provides account lifecycle endpoints:
/// - Registration and login
/// - Session logout (single token or every token)
/// - Profile read, update, and deletion
///
/// # Endpoints
///
/// - `POST /users` - Register new user
/// - `POST /users/login` - Login and get a token
/// - `POST /users/logout` - Revoke the current session token
/// - `POST /users/logoutAll` - Revoke every session token
/// - `GET /users/me` - Read own profile
/// - `PATCH /users/me` - Update own profile
/// - `DELETE /users/me` - Delete account and all owned tasks
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::AuthSession,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{
        password::{hash_password, validate_password, verify_password},
        token::issue_token,
    },
    models::user::{CreateUser, UpdateUser, User},
};
use uuid::Uuid;
use validator::Validate;

/// Profile fields are the only part of a user account that ever leaves
/// the server. Password hashes, token lists, and avatar bytes stay out
/// of every response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Age in years
    pub age: i32,

    /// Email address
    pub email: String,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            age: user.age,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response for register and login: the profile plus the session token
/// minted for this session.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// User profile
    pub user: UserProfile,

    /// Session JWT
    pub token: String,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Email is invalid."))]
    pub email: String,

    /// Password (strength checked separately)
    pub password: String,

    /// Age in years, defaults to 0
    #[validate(range(min = 0, message = "Age must be a positive number."))]
    pub age: Option<i32>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Profile update request
///
/// Deserialized from the PATCH body only after the key allow-list check
/// has passed, so unknown fields can never reach this type.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: Option<String>,

    /// New email address
    #[validate(email(message = "Email is invalid."))]
    pub email: Option<String>,

    /// New password (strength checked separately)
    pub password: Option<String>,

    /// New age
    #[validate(range(min = 0, message = "Age must be a positive number."))]
    pub age: Option<i32>,
}

/// Fields a PATCH /users/me body may contain. Anything else fails the
/// whole request before any field is applied.
const USER_UPDATE_FIELDS: &[&str] = &["name", "email", "password", "age"];

/// Register a new user
///
/// Creates the account, fires a welcome email in the background, and
/// returns the first session token.
///
/// # Endpoint
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// {
///   "name": "Jess",
///   "email": "jess@example.com",
///   "password": "red12345!",
///   "age": 27
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed or email already in use
/// - `500 Internal Server Error`: Server error
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_lowercase();
    req.validate()?;
    validate_password(&req.password).map_err(|msg| ApiError::validation("password", msg))?;

    let password_hash = hash_password(&req.password)?;
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            age: req.age.unwrap_or(0),
            email: req.email,
            password_hash,
        },
    )
    .await?;

    let mailer = state.mailer.clone();
    let (email, name) = (user.email.clone(), user.name.clone());
    tokio::spawn(async move {
        if let Err(err) = mailer.send_welcome(&email, &name).await {
            tracing::warn!(error = %err, "failed to send welcome email");
        }
    });

    let token = issue_token(&state.db, user.id, &state.config.jwt.secret)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// Login with email and password
///
/// Issues a fresh token on every login, so each device holds its own
/// revocable session.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown email or wrong password, one shared body
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::LoginFailed)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::LoginFailed);
    }

    let token = issue_token(&state.db, user.id, &state.config.jwt.secret)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// Revoke the token that authenticated this request
///
/// Other sessions of the same user keep working.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    User::remove_token(&state.db, session.user.id, &session.token)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(StatusCode::OK)
}

/// Revoke every session token for this user
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<StatusCode> {
    User::clear_tokens(&state.db, session.user.id)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(StatusCode::OK)
}

/// Read own profile
pub async fn get_me(Extension(session): Extension<AuthSession>) -> Json<UserProfile> {
    Json(session.user.into())
}

/// Update own profile
///
/// The body must contain only keys from the allow-list. A body naming
/// any other key is rejected whole, even if some keys are valid.
///
/// # Errors
///
/// - `400 Bad Request`: Unknown key, validation failure, or email in use
/// - `500 Internal Server Error`: Server error
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<Json<UserProfile>> {
    let object = body.as_object().ok_or(ApiError::InvalidUpdate)?;
    if object
        .keys()
        .any(|key| !USER_UPDATE_FIELDS.contains(&key.as_str()))
    {
        return Err(ApiError::InvalidUpdate);
    }

    let mut req: UpdateProfileRequest =
        serde_json::from_value(body).map_err(|_| ApiError::InvalidUpdate)?;

    if let Some(name) = req.name.as_mut() {
        *name = name.trim().to_string();
    }
    if let Some(email) = req.email.as_mut() {
        *email = email.trim().to_lowercase();
    }
    req.validate()?;

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            validate_password(password).map_err(|msg| ApiError::validation("password", msg))?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        name: req.name,
        age: req.age,
        email: req.email,
        password_hash,
    };

    let user = User::update(&state.db, session.user.id, update)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(user.into()))
}

/// Delete own account
///
/// Removes the user and every task they own in one transaction, then
/// fires a cancellation email in the background. Returns the profile as
/// it was at deletion time.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<UserProfile>> {
    let user = session.user;

    let deleted = User::delete_with_tasks(&state.db, user.id).await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    let mailer = state.mailer.clone();
    let (email, name) = (user.email.clone(), user.name.clone());
    tokio::spawn(async move {
        if let Err(err) = mailer.send_cancellation(&email, &name).await {
            tracing::warn!(error = %err, "failed to send cancellation email");
        }
    });

    tracing::info!(user_id = %user.id, "user deleted");

    Ok(Json(user.into()))
}
