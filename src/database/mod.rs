pub mod inclusions_repo;
pub mod schema;
pub mod session_repo;
pub mod user_repo;
pub mod watched_peers_repo;

#[cfg(test)]
pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    schema::bootstrap(&pool).await.expect("schema bootstrap");
    pool
}
