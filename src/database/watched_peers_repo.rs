use sqlx::SqlitePool;

use crate::models::WatchedPeerRow;

pub struct WatchedPeerFields<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub discord_webhook_url: Option<&'a str>,
}

const SQL_LIST_WATCHED_PEERS: &str = r#"
SELECT
  peer_id,
  name,
  email,
  phone,
  discord_webhook_url
FROM watched_peers
ORDER BY peer_id ASC
"#;

pub async fn list_watched_peers(pool: &SqlitePool) -> sqlx::Result<Vec<WatchedPeerRow>> {
    sqlx::query_as::<_, WatchedPeerRow>(SQL_LIST_WATCHED_PEERS)
        .fetch_all(pool)
        .await
}

const SQL_INSERT_WATCHED_PEER: &str = r#"
INSERT INTO watched_peers (
  peer_id,
  name,
  email,
  phone,
  discord_webhook_url
) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub async fn add_watched_peer(
    pool: &SqlitePool,
    peer_id: &str,
    fields: WatchedPeerFields<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_WATCHED_PEER)
        .bind(peer_id)
        .bind(fields.name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.discord_webhook_url)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_UPDATE_WATCHED_PEER: &str = r#"
UPDATE watched_peers
SET name = ?2,
    email = ?3,
    phone = ?4,
    discord_webhook_url = ?5
WHERE peer_id = ?1
"#;

pub async fn update_watched_peer(
    pool: &SqlitePool,
    peer_id: &str,
    fields: WatchedPeerFields<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_WATCHED_PEER)
        .bind(peer_id)
        .bind(fields.name)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.discord_webhook_url)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

const SQL_DELETE_WATCHED_PEER: &str = r#"
DELETE FROM watched_peers WHERE peer_id = ?1
"#;

pub async fn delete_watched_peer(pool: &SqlitePool, peer_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_WATCHED_PEER)
        .bind(peer_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
