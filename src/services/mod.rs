pub mod fne_client;
pub mod peer_map_service;
pub mod session_service;
pub mod tg_rules_service;
pub mod user_service;
pub mod watched_peer_service;
