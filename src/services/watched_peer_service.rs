use sqlx::SqlitePool;

use crate::database::watched_peers_repo::{self, WatchedPeerFields};
use crate::error::WatchedPeerError;

pub struct WatchedPeerView {
    pub peer_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub discord_webhook_url: String,
}

/// Raw form input for a watched peer; blank fields are stored as NULL.
#[derive(Debug, Default)]
pub struct WatchedPeerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub discord_webhook_url: Option<String>,
}

impl WatchedPeerInput {
    fn fields(&self) -> WatchedPeerFields<'_> {
        WatchedPeerFields {
            name: non_blank(&self.name),
            email: non_blank(&self.email),
            phone: non_blank(&self.phone),
            discord_webhook_url: non_blank(&self.discord_webhook_url),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub async fn load_watched_peers(pool: &SqlitePool) -> sqlx::Result<Vec<WatchedPeerView>> {
    let rows = watched_peers_repo::list_watched_peers(pool).await?;
    Ok(rows
        .into_iter()
        .map(|r| WatchedPeerView {
            peer_id: r.peer_id,
            name: r.name.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            phone: r.phone.unwrap_or_default(),
            discord_webhook_url: r.discord_webhook_url.unwrap_or_default(),
        })
        .collect())
}

pub async fn add_watched_peer(
    pool: &SqlitePool,
    peer_id: &str,
    input: &WatchedPeerInput,
) -> Result<(), WatchedPeerError> {
    let peer_id = peer_id.trim();
    if peer_id.is_empty() {
        return Err(WatchedPeerError::Invalid("Peer id is required"));
    }
    match watched_peers_repo::add_watched_peer(pool, peer_id, input.fields()).await {
        Ok(()) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(WatchedPeerError::AlreadyWatched)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update_watched_peer(
    pool: &SqlitePool,
    peer_id: &str,
    input: &WatchedPeerInput,
) -> sqlx::Result<u64> {
    watched_peers_repo::update_watched_peer(pool, peer_id.trim(), input.fields()).await
}

pub async fn delete_watched_peer(pool: &SqlitePool, peer_id: &str) -> sqlx::Result<u64> {
    watched_peers_repo::delete_watched_peer(pool, peer_id.trim()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;

    #[tokio::test]
    async fn blank_fields_become_empty_labels() {
        let pool = memory_pool().await;
        let input = WatchedPeerInput {
            name: Some("  Site A ".to_string()),
            email: Some("   ".to_string()),
            ..WatchedPeerInput::default()
        };
        add_watched_peer(&pool, " 9000123 ", &input).await.unwrap();
        assert!(matches!(
            add_watched_peer(&pool, "9000123", &input).await.unwrap_err(),
            WatchedPeerError::AlreadyWatched
        ));

        let views = load_watched_peers(&pool).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].peer_id, "9000123");
        assert_eq!(views[0].name, "Site A");
        assert_eq!(views[0].email, "");
    }

    #[tokio::test]
    async fn blank_peer_id_is_rejected() {
        let pool = memory_pool().await;
        let err = add_watched_peer(&pool, " ", &WatchedPeerInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WatchedPeerError::Invalid(_)));
        assert_eq!(err.to_string(), "Peer id is required");
    }
}
