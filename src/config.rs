use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "FNE_MANAGER_";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub fne: FneConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub bind_address: String,
    pub port: u16,
    pub session_ttl_hours: u32,
    pub public_dir: String,
    pub fne_type: FneKind,
    pub rule_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "FNE Manager".to_string(),
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            session_ttl_hours: 168,
            public_dir: "public".to_string(),
            fne_type: FneKind::Fne2,
            rule_path: "talkgroup_rules.yml".to_string(),
        }
    }
}

/// Which FNE flavour the rules file belongs to; decides how rules are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FneKind {
    Fne2,
    Cfne,
}

impl FneKind {
    pub fn label(self) -> &'static str {
        match self {
            FneKind::Fne2 => "FNE2",
            FneKind::Cfne => "CFNE",
        }
    }
}

impl std::str::FromStr for FneKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FNE2" => Ok(FneKind::Fne2),
            "CFNE" => Ok(FneKind::Cfne),
            other => Err(ConfigError::Invalid(format!("unknown FNE type {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://fne-manager.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FneConfig {
    pub address: String,
    pub port: u16,
    pub password: String,
    pub https: bool,
    pub timeout_ms: u64,
}

impl Default for FneConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 9990,
            password: String::new(),
            https: false,
            timeout_ms: 5000,
        }
    }
}

/// JSON API access. With no key configured and auth not disabled, every API
/// request is rejected.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    pub key: Option<String>,
    pub auth_disabled: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str::<Config>(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `FNE_MANAGER_*` overrides (and the bare `DATABASE_URL`) from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(val) = var("SERVER_NAME") {
            self.server.name = val;
        }
        if let Some(val) = var("BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(port) = var("PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(hours) = var("SESSION_TTL_HOURS").and_then(|v| v.parse().ok()) {
            self.server.session_ttl_hours = hours;
        }
        if let Some(kind) = var("FNE_TYPE").and_then(|v| v.parse().ok()) {
            self.server.fne_type = kind;
        }
        if let Some(val) = var("RULE_PATH") {
            self.server.rule_path = val;
        }

        if let Some(val) = lookup("DATABASE_URL").or_else(|| var("DATABASE_URL")) {
            self.database.url = val;
        }

        if let Some(val) = var("FNE_ADDRESS") {
            self.fne.address = val;
        }
        if let Some(port) = var("FNE_PORT").and_then(|v| v.parse().ok()) {
            self.fne.port = port;
        }
        if let Some(val) = var("FNE_PASSWORD") {
            self.fne.password = val;
        }
        if let Some(val) = var("FNE_HTTPS") {
            self.fne.https = val.parse().unwrap_or(false);
        }

        if let Some(val) = var("API_KEY") {
            self.api.key = Some(val);
        }
        if let Some(val) = var("API_AUTH_DISABLED") {
            self.api.auth_disabled = val.parse().unwrap_or(false);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.server.session_ttl_hours == 0 {
            return Err(ConfigError::Invalid(
                "server.session_ttl_hours must be non-zero".into(),
            ));
        }
        if self.server.rule_path.trim().is_empty() {
            return Err(ConfigError::Invalid("server.rule_path must be set".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must be set".into()));
        }
        if self.fne.address.trim().is_empty() {
            return Err(ConfigError::Invalid("fne.address must be set".into()));
        }
        if self.fne.port == 0 {
            return Err(ConfigError::Invalid("fne.port must be non-zero".into()));
        }
        if self.fne.timeout_ms < 100 {
            return Err(ConfigError::Invalid("fne.timeout_ms must be >= 100".into()));
        }
        if let Some(key) = &self.api.key {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "api.key must not be blank when set".into(),
                ));
            }
        }
        Ok(())
    }
}

fn config_path() -> PathBuf {
    env::var(format!("{}CONFIG", ENV_PREFIX))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_serializes() {
        let cfg = Config::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        parsed.validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [fne]
            address = "fne.example.net"
            password = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fne.address, "fne.example.net");
        assert_eq!(cfg.fne.port, 9990);
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.api.key.is_none());
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("FNE_MANAGER_PORT", "8080"),
            ("FNE_MANAGER_FNE_HTTPS", "true"),
            ("FNE_MANAGER_API_KEY", "secret"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("FNE_MANAGER_FNE_PORT", "not-a-port"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.fne.https);
        assert_eq!(cfg.api.key.as_deref(), Some("secret"));
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.fne.port, 9990);
    }

    #[test]
    fn fne_type_reads_from_file_and_env() {
        let cfg: Config = toml::from_str(
            r#"
            [server]
            fne_type = "CFNE"
            rule_path = "/etc/dvm/rules.yml"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.fne_type, FneKind::Cfne);
        assert_eq!(cfg.server.rule_path, "/etc/dvm/rules.yml");
        assert!(toml::from_str::<Config>("[server]\nfne_type = \"XYZ\"").is_err());

        let mut cfg = Config::default();
        cfg.apply_overrides(|k| (k == "FNE_MANAGER_FNE_TYPE").then(|| "cfne".to_string()));
        assert_eq!(cfg.server.fne_type, FneKind::Cfne);
        cfg.apply_overrides(|k| (k == "FNE_MANAGER_FNE_TYPE").then(|| "bogus".to_string()));
        assert_eq!(cfg.server.fne_type, FneKind::Cfne);
    }

    #[test]
    fn validate_rejects_zero_ports() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());
        cfg.server.port = 3000;
        cfg.fne.port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_api_key() {
        let mut cfg = Config::default();
        cfg.api.key = Some("   ".to_string());
        assert!(cfg.validate().is_err());
        cfg.api.key = Some("k".to_string());
        assert!(cfg.validate().is_ok());
    }
}
