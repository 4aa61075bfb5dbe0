use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::SqlitePool;
use tracing::warn;

use crate::database::{session_repo, user_repo};
use crate::error::UserError;
use crate::models::UsersRow;

pub struct UserListItem {
    pub id: i64,
    pub username: String,
}

pub fn hash_password(password: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Returns the user when `password` matches. Unknown users and wrong
/// passwords both come back as `None`.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> sqlx::Result<Option<UsersRow>> {
    let Some(user) = user_repo::find_by_username(pool, username.trim()).await? else {
        return Ok(None);
    };
    if verify_password(password, &user.password_hash) {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<UserListItem>> {
    let rows = user_repo::list_users(pool).await?;
    Ok(rows
        .into_iter()
        .map(|r| UserListItem {
            id: r.id,
            username: r.username,
        })
        .collect())
}

pub async fn create_user(pool: &SqlitePool, username: &str, password: &str) -> Result<i64, UserError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(UserError::Invalid("Username is required"));
    }
    if password.is_empty() {
        return Err(UserError::Invalid("Password is required"));
    }
    if user_repo::find_by_username(pool, username).await?.is_some() {
        return Err(UserError::AlreadyExists);
    }

    let hash = hash_password(password)?;
    Ok(user_repo::insert_user(pool, username, &hash).await?)
}

/// Renames a user; a non-empty `password` also resets the password and
/// signs the user out everywhere.
pub async fn edit_user(
    pool: &SqlitePool,
    id: i64,
    username: &str,
    password: &str,
) -> Result<(), UserError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(UserError::Invalid("Username is required"));
    }
    if let Some(existing) = user_repo::find_by_username(pool, username).await? {
        if existing.id != id {
            return Err(UserError::AlreadyExists);
        }
    }

    let hash = if password.is_empty() {
        None
    } else {
        Some(hash_password(password)?)
    };

    let updated = user_repo::update_user(pool, id, username, hash.as_deref()).await?;
    if updated == 0 {
        return Err(UserError::Invalid("Unknown user"));
    }
    if hash.is_some() {
        session_repo::delete_sessions_for_user(pool, id).await?;
    }
    Ok(())
}

pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<(), UserError> {
    session_repo::delete_sessions_for_user(pool, id).await?;
    user_repo::delete_user(pool, id).await?;
    Ok(())
}
