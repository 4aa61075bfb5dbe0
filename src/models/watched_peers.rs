// Contact details for a peer the operators want to be notified about.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WatchedPeerRow {
    pub peer_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub discord_webhook_url: Option<String>,
}
