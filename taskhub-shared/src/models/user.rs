/// User model and database operations
///
/// Users own tasks and hold a list of active session tokens. Passwords are
/// stored as Argon2id hashes only; this struct deliberately does NOT derive
/// `Serialize` so the hash, token list, and avatar can never leak into a
/// response body. API responses go through `UserProfile` in the api crate.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     tokens TEXT[] NOT NULL DEFAULT '{}',
///     avatar BYTEA,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The avatar blob is not part of the `User` struct: authentication looks a
/// user up on every protected request and should not drag megabytes of image
/// bytes along. Avatar bytes move only through the dedicated
/// `set_avatar` / `clear_avatar` / `find_avatar` operations.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Columns fetched for user queries (avatar intentionally excluded)
const USER_COLUMNS: &str =
    "id, name, age, email, password_hash, tokens, created_at, updated_at";

/// User account record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user id (UUID v4)
    pub id: Uuid,

    /// Display name, trimmed by the handler before storage
    pub name: String,

    /// Non-negative age, defaults to 0
    pub age: i32,

    /// Email address, trimmed and lowercased before storage, globally unique
    pub email: String,

    /// Argon2id password hash (PHC string)
    pub password_hash: String,

    /// Active session tokens in issue order; membership here is what keeps a
    /// signed token valid
    pub tokens: Vec<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Display name (already trimmed)
    pub name: String,

    /// Age, defaulting to 0 when the caller omitted it
    pub age: i32,

    /// Email (already trimmed and lowercased)
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,
}

/// Input for updating a user profile
///
/// Only `Some` fields are written. The handler is responsible for enforcing
/// the field allow-list and for hashing a new password before it gets here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New age
    pub age: Option<i32>,

    /// New email
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns a database error on connection failure or when the email
    /// violates the unique constraint.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, age, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.age)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by id
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Callers lowercase the email before lookup, matching how it is stored.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolves a bearer token to a live session
    ///
    /// The predicate is the conjunction of user id AND current token-list
    /// membership, so a deleted account and a logged-out token both resolve
    /// to `None` with no distinction between the two.
    pub async fn find_by_id_and_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND $2 = ANY(tokens)",
        ))
        .bind(id)
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Updates a user's profile fields
    ///
    /// Builds the UPDATE dynamically from the fields present in `data` and
    /// always bumps `updated_at`. Returns `None` if the user no longer
    /// exists.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.age.is_some() {
            bind_count += 1;
            query.push_str(&format!(", age = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(age) = data.age {
            q = q.bind(age);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Appends a session token to the user's token list
    ///
    /// Single-statement `array_append`, so concurrent logins each land their
    /// own token without a read-modify-write window.
    ///
    /// Returns `false` if the user does not exist.
    pub async fn append_token(pool: &PgPool, id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = array_append(tokens, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes exactly one session token, leaving other sessions intact
    pub async fn remove_token(pool: &PgPool, id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = array_remove(tokens, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears the entire token list, ending every session
    pub async fn clear_tokens(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = '{}', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores normalized avatar bytes for a user
    pub async fn set_avatar(pool: &PgPool, id: Uuid, png: &[u8]) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(png)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears a user's stored avatar
    pub async fn clear_avatar(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetches a user's avatar bytes, if any
    ///
    /// Returns `None` when the user does not exist OR has no avatar; the
    /// public avatar endpoint treats both as not-found.
    pub async fn find_avatar(pool: &PgPool, id: Uuid) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT avatar FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(row.and_then(|(avatar,)| avatar))
    }

    /// Deletes a user and every task they own, atomically
    ///
    /// The task delete and the user delete run in one transaction: either
    /// the account and all its tasks are gone, or nothing changed. Tasks
    /// belonging to other users are untouched.
    ///
    /// Returns `false` if the user did not exist (nothing is committed).
    pub async fn delete_with_tasks(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
