pub mod fne_peer;
pub mod fne_reports;
pub mod peer_map_inclusions;
pub mod sessions;
pub mod talkgroup_rules;
pub mod users;
pub mod watched_peers;

pub use fne_peer::{Peer, PeerConfig, PeerId, PeerInfo, PeerList};
pub use fne_reports::{Affiliation, AffiliationReport, PeerAffiliations, RidEntry, RidList};
pub use peer_map_inclusions::PeerMapInclusionRow;
pub use sessions::SessionUserRow;
pub use talkgroup_rules::{TalkgroupConfig, TalkgroupRule, TalkgroupRules, TalkgroupSource};
pub use users::UsersRow;
pub use watched_peers::WatchedPeerRow;
