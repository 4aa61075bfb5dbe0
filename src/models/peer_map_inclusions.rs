use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PeerMapInclusionRow {
    pub id: i64,
    pub peer_id: String,
}
