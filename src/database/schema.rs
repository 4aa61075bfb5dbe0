use sqlx::SqlitePool;

const SQL_BOOTSTRAP: [&str; 4] = [
    r#"
CREATE TABLE IF NOT EXISTS peer_map_inclusions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  peer_id TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS watched_peers (
  peer_id TEXT PRIMARY KEY,
  name TEXT,
  email TEXT,
  phone TEXT,
  discord_webhook_url TEXT
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  username TEXT NOT NULL UNIQUE,
  password_hash TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS sessions (
  token TEXT PRIMARY KEY,
  user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#,
];

pub async fn bootstrap(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SQL_BOOTSTRAP {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
