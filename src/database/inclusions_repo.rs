use sqlx::SqlitePool;

use crate::models::PeerMapInclusionRow;

const SQL_LIST_INCLUSIONS: &str = r#"
SELECT
  id,
  peer_id
FROM peer_map_inclusions
ORDER BY id ASC
"#;

pub async fn list_inclusions(pool: &SqlitePool) -> sqlx::Result<Vec<PeerMapInclusionRow>> {
    sqlx::query_as::<_, PeerMapInclusionRow>(SQL_LIST_INCLUSIONS)
        .fetch_all(pool)
        .await
}

const SQL_INSERT_INCLUSION: &str = r#"
INSERT INTO peer_map_inclusions (peer_id) VALUES (?1)
"#;

pub async fn add_inclusion(pool: &SqlitePool, peer_id: &str) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_INCLUSION)
        .bind(peer_id)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

const SQL_DELETE_INCLUSION: &str = r#"
DELETE FROM peer_map_inclusions WHERE id = ?1
"#;

pub async fn delete_inclusion(pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_INCLUSION)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
