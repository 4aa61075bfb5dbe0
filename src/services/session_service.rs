use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::database::session_repo;
use crate::models::SessionUserRow;

/// Opens a session for `user_id` and returns its token.
pub async fn start_session(pool: &SqlitePool, user_id: i64) -> sqlx::Result<String> {
    let token = Uuid::new_v4().simple().to_string();
    session_repo::insert_session(pool, &token, user_id).await?;
    Ok(token)
}

pub async fn resolve_session(
    pool: &SqlitePool,
    token: &str,
    ttl_hours: u32,
) -> sqlx::Result<Option<SessionUserRow>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }
    session_repo::load_session_user(pool, token, ttl_hours).await
}

pub async fn end_session(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    session_repo::delete_session(pool, token).await
}

/// Drops sessions past their lifetime; they would never resolve again.
pub async fn purge_expired(pool: &SqlitePool, ttl_hours: u32) -> sqlx::Result<u64> {
    let purged = session_repo::delete_expired_sessions(pool, ttl_hours).await?;
    if purged > 0 {
        debug!(purged, "Expired sessions removed");
    }
    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{memory_pool, user_repo};

    #[tokio::test]
    async fn tokens_are_unique_and_resolvable() {
        let pool = memory_pool().await;
        let id = user_repo::insert_user(&pool, "admin", "x").await.unwrap();

        let a = start_session(&pool, id).await.unwrap();
        let b = start_session(&pool, id).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);

        assert!(resolve_session(&pool, &a, 1).await.unwrap().is_some());
        assert!(resolve_session(&pool, "", 1).await.unwrap().is_none());

        end_session(&pool, &a).await.unwrap();
        assert!(resolve_session(&pool, &a, 1).await.unwrap().is_none());
        assert!(resolve_session(&pool, &b, 1).await.unwrap().is_some());
    }
}
