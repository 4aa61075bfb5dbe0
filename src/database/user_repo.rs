use sqlx::SqlitePool;

use crate::models::UsersRow;

const SQL_LIST_USERS: &str = r#"
SELECT
  id,
  username,
  password_hash
FROM users
ORDER BY username ASC
"#;

pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_LIST_USERS)
        .fetch_all(pool)
        .await
}

const SQL_FIND_USER_BY_USERNAME: &str = r#"
SELECT
  id,
  username,
  password_hash
FROM users
WHERE username = ?1
LIMIT 1
"#;

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<UsersRow>> {
    sqlx::query_as::<_, UsersRow>(SQL_FIND_USER_BY_USERNAME)
        .bind(username)
        .fetch_optional(pool)
        .await
}

const SQL_INSERT_USER: &str = r#"
INSERT INTO users (username, password_hash) VALUES (?1, ?2)
"#;

pub async fn insert_user(pool: &SqlitePool, username: &str, password_hash: &str) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_USER)
        .bind(username)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_UPDATE_USERNAME: &str = r#"
UPDATE users SET username = ?2 WHERE id = ?1
"#;

const SQL_UPDATE_USER: &str = r#"
UPDATE users SET username = ?2, password_hash = ?3 WHERE id = ?1
"#;

/// Renames the user, and replaces the password hash when one is given.
pub async fn update_user(
    pool: &SqlitePool,
    id: i64,
    username: &str,
    password_hash: Option<&str>,
) -> sqlx::Result<u64> {
    let res = match password_hash {
        Some(hash) => {
            sqlx::query(SQL_UPDATE_USER)
                .bind(id)
                .bind(username)
                .bind(hash)
                .execute(pool)
                .await?
        }
        None => {
            sqlx::query(SQL_UPDATE_USERNAME)
                .bind(id)
                .bind(username)
                .execute(pool)
                .await?
        }
    };
    Ok(res.rows_affected())
}

const SQL_DELETE_USER: &str = r#"
DELETE FROM users WHERE id = ?1
"#;

pub async fn delete_user(pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_USER).bind(id).execute(pool).await?;
    Ok(res.rows_affected())
}
