use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Peer identifier as reported by the FNE. The REST API sends numbers; strings
/// show up in older builds and hand-edited fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PeerId {
    Number(u64),
    Text(String),
}

impl PeerId {
    /// Trimmed string form used for inclusion lookups.
    pub fn as_key(&self) -> String {
        match self {
            PeerId::Number(n) => n.to_string(),
            PeerId::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

impl From<u64> for PeerId {
    fn from(value: u64) -> Self {
        PeerId::Number(value)
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        PeerId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PeerInfo {
    #[serde(
        default,
        deserialize_with = "lenient_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PeerConfig {
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub identity: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub software: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_info",
        skip_serializing_if = "Option::is_none"
    )]
    pub info: Option<PeerInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Peer {
    #[serde(rename = "peerId")]
    pub peer_id: PeerId,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected: Option<bool>,
    #[serde(default, deserialize_with = "lenient_config")]
    pub config: PeerConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Peer {
    pub fn new(peer_id: impl Into<PeerId>) -> Self {
        Self {
            peer_id: peer_id.into(),
            address: None,
            port: None,
            connected: None,
            config: PeerConfig::default(),
            extra: Map::new(),
        }
    }

    pub fn info(&self) -> Option<&PeerInfo> {
        self.config.info.as_ref()
    }

    /// `(latitude, longitude)` when both are reported.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let info = self.info()?;
        Some((info.latitude?, info.longitude?))
    }

    pub fn identity(&self) -> &str {
        self.config.identity.as_deref().unwrap_or("")
    }

    pub fn software(&self) -> &str {
        self.config.software.as_deref().unwrap_or("")
    }

    pub fn location_label(&self) -> &str {
        self.info()
            .and_then(|i| i.location.as_deref())
            .unwrap_or("")
    }

    pub fn endpoint_label(&self) -> String {
        match (self.address.as_deref(), self.port) {
            (Some(addr), Some(port)) => format!("{}:{}", addr, port),
            (Some(addr), None) => addr.to_string(),
            _ => String::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.unwrap_or(false)
    }
}

/// Body of `GET /peer/query`. Entries that cannot be read as a peer are
/// dropped with a warning instead of failing the whole roster.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PeerList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(
        default,
        deserialize_with = "lenient_peers",
        skip_serializing_if = "Option::is_none"
    )]
    pub peers: Option<Vec<Peer>>,
}

fn lenient_peers<'de, D>(deserializer: D) -> Result<Option<Vec<Peer>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(entries) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let peers = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Peer>(entry) {
            Ok(peer) => Some(peer),
            Err(e) => {
                warn!("Dropped unreadable peer entry #{}: {}", index, e);
                None
            }
        })
        .collect();
    Ok(Some(peers))
}

// Strings as-is, numbers and booleans in their JSON spelling.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|p| u32::try_from(p).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0),
        Some(Value::String(s)) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_info<'de, D>(deserializer: D) -> Result<Option<PeerInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn lenient_config<'de, D>(deserializer: D) -> Result<PeerConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => PeerConfig::default(),
    })
}

// Accepts numbers and numeric strings; anything else reads as absent.
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
