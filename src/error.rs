//! Error types shared across services and routes.

use thiserror::Error;

/// Failures talking to the FNE REST API.
#[derive(Error, Debug)]
pub enum FneError {
    #[error("FNE unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("FNE returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("FNE rejected authentication")]
    AuthRejected,

    #[error("FNE response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a peer map could not be built. The aggregator itself never fails;
/// these all come from the two fetches that precede it.
#[derive(Error, Debug)]
pub enum PeerMapError {
    #[error("Error getting peer list: {0}")]
    UpstreamFetch(#[from] FneError),

    #[error("Error getting peer list: FNE response carried no peers")]
    MissingPeerList,

    #[error("Error retrieving inclusions: {0}")]
    InclusionLookup(#[source] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User already exists")]
    AlreadyExists,

    #[error("{0}")]
    Invalid(&'static str),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<argon2::password_hash::Error> for UserError {
    fn from(err: argon2::password_hash::Error) -> Self {
        UserError::Hash(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum WatchedPeerError {
    #[error("{0}")]
    Invalid(&'static str),

    #[error("Peer is already watched")]
    AlreadyWatched,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures reading or writing the talkgroup rules file.
#[derive(Error, Debug)]
pub enum RulesError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse talkgroup rules: {0}")]
    Parse(#[from] serde_yaml::Error),
}
