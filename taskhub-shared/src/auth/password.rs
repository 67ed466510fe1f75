/// Password hashing and policy checks using Argon2id
///
/// Plaintext passwords are hashed exactly once, at the moment they enter the
/// system (registration or a profile update that includes a `password`
/// field). The model layer only ever handles finished hashes, so re-saving a
/// user can never re-hash an already-hashed value.
///
/// # Security
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Salt**: 16 random bytes from the OS RNG
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("horse-battery-staple")?;
/// assert!(verify_password("horse-battery-staple", &hash)?);
/// assert!(!verify_password("wrong-guess", &hash)?);
/// # Ok(())
/// # }
/// ```
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password using Argon2id with fixed parameters
///
/// Returns a PHC string (`$argon2id$v=19$m=65536,t=3,p=4$...`) that embeds
/// the algorithm, parameters, and salt alongside the hash.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Uses the Argon2 verifier (constant-time), never plaintext equality.
/// `Ok(false)` means the password does not match; `Err` means the stored
/// hash itself is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters are embedded in the PHC string
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}

/// Validates a password against the account policy
///
/// Requirements:
/// - At least 7 characters
/// - Must not contain the substring "password" (case-insensitive)
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::validate_password;
///
/// assert!(validate_password("example123").is_ok());
/// assert!(validate_password("short").is_err());
/// assert!(validate_password("MyPassword1").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 7 {
        return Err("Password must be at least 7 characters long.".to_string());
    }

    if password.to_lowercase().contains("password") {
        return Err("Password must not contain the word \"password\".".to_string());
    }

    Ok(())
}
