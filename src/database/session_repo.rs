use sqlx::SqlitePool;

use crate::models::SessionUserRow;

const SQL_INSERT_SESSION: &str = r#"
INSERT INTO sessions (token, user_id) VALUES (?1, ?2)
"#;

pub async fn insert_session(pool: &SqlitePool, token: &str, user_id: i64) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_SESSION)
        .bind(token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_LOAD_SESSION_USER: &str = r#"
SELECT
  u.id AS user_id,
  u.username AS username
FROM sessions s
JOIN users u ON u.id = s.user_id
WHERE s.token = ?1
  AND datetime(s.created_at) >= datetime('now', ?2)
LIMIT 1
"#;

/// Resolves a session token to its user, ignoring sessions older than `ttl_hours`.
pub async fn load_session_user(
    pool: &SqlitePool,
    token: &str,
    ttl_hours: u32,
) -> sqlx::Result<Option<SessionUserRow>> {
    sqlx::query_as::<_, SessionUserRow>(SQL_LOAD_SESSION_USER)
        .bind(token)
        .bind(format!("-{} hours", ttl_hours))
        .fetch_optional(pool)
        .await
}

const SQL_DELETE_SESSION: &str = r#"
DELETE FROM sessions WHERE token = ?1
"#;

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_DELETE_SESSION)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_DELETE_SESSIONS_FOR_USER: &str = r#"
DELETE FROM sessions WHERE user_id = ?1
"#;

pub async fn delete_sessions_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SESSIONS_FOR_USER)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_EXPIRED_SESSIONS: &str = r#"
DELETE FROM sessions WHERE datetime(created_at) < datetime('now', ?1)
"#;

/// Deletes every session older than `ttl_hours`, returning how many went.
pub async fn delete_expired_sessions(pool: &SqlitePool, ttl_hours: u32) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_EXPIRED_SESSIONS)
        .bind(format!("-{} hours", ttl_hours))
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{memory_pool, user_repo};

    #[tokio::test]
    async fn session_resolves_until_deleted() {
        let pool = memory_pool().await;
        let user_id = user_repo::insert_user(&pool, "admin", "x").await.unwrap();

        insert_session(&pool, "tok-1", user_id).await.unwrap();
        let row = load_session_user(&pool, "tok-1", 24).await.unwrap().unwrap();
        assert_eq!(row.user_id, user_id);
        assert_eq!(row.username, "admin");

        assert!(load_session_user(&pool, "nope", 24).await.unwrap().is_none());

        delete_session(&pool, "tok-1").await.unwrap();
        assert!(load_session_user(&pool, "tok-1", 24).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_sessions_are_ignored() {
        let pool = memory_pool().await;
        let user_id = user_repo::insert_user(&pool, "admin", "x").await.unwrap();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at) VALUES ('old', ?1, datetime('now', '-3 days'))",
        )
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

        assert!(load_session_user(&pool, "old", 24).await.unwrap().is_none());
        assert!(load_session_user(&pool, "old", 168).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_sessions_are_purged() {
        let pool = memory_pool().await;
        let user_id = user_repo::insert_user(&pool, "admin", "x").await.unwrap();
        insert_session(&pool, "fresh", user_id).await.unwrap();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at) VALUES ('stale', ?1, datetime('now', '-3 days'))",
        )
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

        assert_eq!(delete_expired_sessions(&pool, 168).await.unwrap(), 0);
        assert_eq!(delete_expired_sessions(&pool, 24).await.unwrap(), 1);
        assert!(load_session_user(&pool, "fresh", 24).await.unwrap().is_some());
        assert!(load_session_user(&pool, "stale", 168).await.unwrap().is_none());
    }
}
