pub mod api;
pub mod auth;
pub mod fne;
pub mod inclusions;
pub mod pages;
pub mod peer_map;
pub mod talkgroups;
pub mod users;
pub mod watched_peers;
