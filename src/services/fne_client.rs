use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::FneConfig;
use crate::error::FneError;
use crate::models::{AffiliationReport, PeerList, RidList};

const AUTH_TOKEN_HEADER: &str = "X-DVM-Auth-Token";

const PATH_PEER_QUERY: &str = "/peer/query";
const PATH_STATUS: &str = "/status";
const PATH_STATS: &str = "/stats";
const PATH_AFFILIATIONS: &str = "/report-affiliations";
const PATH_RID_QUERY: &str = "/rid/query";

/// Read side of the FNE REST API the console depends on.
#[async_trait]
pub trait FneSource: Send + Sync {
    async fn fetch_peer_list(&self) -> Result<PeerList, FneError>;

    async fn fetch_status(&self) -> Result<Value, FneError>;

    /// Traffic counters, passed through untouched.
    async fn fetch_stats(&self) -> Result<Value, FneError>;

    async fn fetch_affiliations(&self) -> Result<AffiliationReport, FneError>;

    async fn fetch_rid_acl(&self) -> Result<RidList, FneError>;
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    token: Option<String>,
}

/// Client for the FNE REST API. Authenticates lazily and caches the token
/// until the FNE answers 401.
pub struct FneClient {
    http: reqwest::Client,
    base_url: String,
    password_hash: String,
    token: Mutex<Option<String>>,
}

impl FneClient {
    pub fn new(config: &FneConfig) -> Result<Self, FneError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url(config),
            password_hash: hash_password(&config.password),
            token: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn authenticate(&self) -> Result<String, FneError> {
        let url = format!("{}/auth", self.base_url);
        let resp = self
            .http
            .put(&url)
            .json(&serde_json::json!({ "auth": self.password_hash }))
            .send()
            .await
            .map_err(|e| {
                warn!("FNE auth request failed: {}", e);
                FneError::Transport(e)
            })?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(FneError::AuthRejected);
        }
        if !resp.status().is_success() {
            return Err(FneError::Status(resp.status()));
        }

        let body = resp.text().await?;
        let parsed: AuthResponse = serde_json::from_str(&body)?;
        match (parsed.status, parsed.token) {
            (Some(200) | None, Some(token)) if !token.is_empty() => {
                debug!("FNE auth token acquired");
                Ok(token)
            }
            _ => Err(FneError::AuthRejected),
        }
    }

    async fn current_token(&self) -> Result<String, FneError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.authenticate().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FneError> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 0..2 {
            let token = self.current_token().await?;
            let resp = self
                .http
                .get(&url)
                .header(AUTH_TOKEN_HEADER, token)
                .send()
                .await
                .map_err(|e| {
                    warn!("FNE request {} failed: {}", path, e);
                    FneError::Transport(e)
                })?;

            if resp.status() == StatusCode::UNAUTHORIZED {
                *self.token.lock().await = None;
                if attempt == 0 {
                    debug!("FNE token expired, re-authenticating");
                    continue;
                }
                return Err(FneError::AuthRejected);
            }
            if !resp.status().is_success() {
                warn!("FNE {} returned {}", path, resp.status());
                return Err(FneError::Status(resp.status()));
            }

            let body = resp.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        Err(FneError::AuthRejected)
    }
}

#[async_trait]
impl FneSource for FneClient {
    async fn fetch_peer_list(&self) -> Result<PeerList, FneError> {
        self.get_json(PATH_PEER_QUERY).await
    }

    async fn fetch_status(&self) -> Result<Value, FneError> {
        self.get_json(PATH_STATUS).await
    }

    async fn fetch_stats(&self) -> Result<Value, FneError> {
        self.get_json(PATH_STATS).await
    }

    async fn fetch_affiliations(&self) -> Result<AffiliationReport, FneError> {
        self.get_json(PATH_AFFILIATIONS).await
    }

    async fn fetch_rid_acl(&self) -> Result<RidList, FneError> {
        self.get_json(PATH_RID_QUERY).await
    }
}

fn base_url(config: &FneConfig) -> String {
    let scheme = if config.https { "https" } else { "http" };
    format!(
        "{}://{}:{}",
        scheme,
        config.address.trim().trim_end_matches('/'),
        config.port
    )
}

/// The FNE expects the SHA-256 of the password, hex encoded.
fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_sent_as_sha256_hex() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn base_url_follows_scheme_and_port() {
        let mut cfg = FneConfig {
            address: " fne.example.net/ ".to_string(),
            port: 9990,
            ..FneConfig::default()
        };
        assert_eq!(base_url(&cfg), "http://fne.example.net:9990");
        cfg.https = true;
        assert_eq!(base_url(&cfg), "https://fne.example.net:9990");
    }

    #[tokio::test]
    async fn unreachable_fne_is_a_transport_error() {
        let cfg = FneConfig {
            address: "127.0.0.1".to_string(),
            port: 1,
            timeout_ms: 500,
            ..FneConfig::default()
        };
        let client = FneClient::new(&cfg).unwrap();
        let err = client.fetch_peer_list().await.unwrap_err();
        assert!(matches!(err, FneError::Transport(_)), "got {:?}", err);
    }
}
