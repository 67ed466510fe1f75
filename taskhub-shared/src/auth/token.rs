/// Bearer token signing, verification, and issuance
///
/// Tokens are JWTs signed with HS256 that embed the user id as the `sub`
/// claim. There is deliberately no `exp` claim: a token stays valid until it
/// is removed from the owning user's token list, so logout takes effect
/// immediately instead of waiting out an expiry window. Signature
/// verification and revocation are therefore two separate checks. This
/// module covers the signature half, the authentication middleware consults
/// the store for the other half.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::token::{sign_token, verify_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "a-secret-key-at-least-32-bytes-long!";
///
/// let token = sign_token(user_id, secret)?;
/// assert_eq!(verify_token(&token, secret)?, user_id);
/// # Ok(())
/// # }
/// ```
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

/// Issuer claim stamped into and required from every token
const ISSUER: &str = "taskhub";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    Create(String),

    /// Signature or payload validation failed
    #[error("Invalid token: {0}")]
    InvalidSignature(String),

    /// Persisting the issued token failed
    #[error("Failed to persist token: {0}")]
    Store(#[from] sqlx::Error),

    /// The user the token was issued for does not exist
    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),
}

/// JWT claims carried by a session token
///
/// `exp` is intentionally absent; revocation is list-membership on the user
/// record, not signature expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: Uuid,

    /// Issuer - always "taskhub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Creates claims for a user
    pub fn new(user_id: Uuid) -> Self {
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: Utc::now().timestamp(),
        }
    }
}

/// Signs a session token for a user
///
/// Produces the token string only; see [`issue_token`] for the variant that
/// also records the token on the user's session list.
pub fn sign_token(user_id: Uuid, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &Claims::new(user_id), &key)
        .map_err(|e| TokenError::Create(format!("Token encoding failed: {}", e)))
}

/// Verifies a token's signature and decodes the user id
///
/// Checks the HS256 signature and the issuer claim. This does NOT confirm
/// the token is still active; a logged-out token passes this check and is
/// rejected by the middleware's store lookup instead.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    // No exp claim in our tokens; lifetime is governed by the revocation list.
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.set_issuer(&[ISSUER]);

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| TokenError::InvalidSignature(format!("Token validation failed: {}", e)))?;

    Ok(token_data.claims.sub)
}

/// Issues a new session token for a user
///
/// Signs a token and appends it to the user's token list in a single
/// `array_append` statement. The token string is returned only after the row
/// update succeeded, so every token a caller ever sees is already consultable
/// against the store, so a verify-without-persist race is not observable.
/// Concurrent logins for the same user each append atomically and cannot
/// clobber one another.
///
/// # Errors
///
/// Returns [`TokenError::UnknownUser`] if the user row no longer exists,
/// [`TokenError::Store`] on database failure.
pub async fn issue_token(pool: &PgPool, user_id: Uuid, secret: &str) -> Result<String, TokenError> {
    let token = sign_token(user_id, secret)?;

    let appended = User::append_token(pool, user_id, &token).await?;
    if !appended {
        return Err(TokenError::UnknownUser(user_id));
    }

    Ok(token)
}
