use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Contents of the FNE `talkgroup_rules.yml`. Keys this console does not know
/// about are carried in `extra` so a write never drops them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TalkgroupRules {
    #[serde(rename = "groupHangTime", default, skip_serializing_if = "Option::is_none")]
    pub group_hang_time: Option<u32>,
    #[serde(rename = "sendTalkgroups", default, skip_serializing_if = "Option::is_none")]
    pub send_talkgroups: Option<bool>,
    #[serde(rename = "groupVoice", default)]
    pub group_voice: Vec<TalkgroupRule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TalkgroupRule {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub config: TalkgroupConfig,
    #[serde(default)]
    pub source: TalkgroupSource,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TalkgroupConfig {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub affiliated: bool,
    #[serde(default)]
    pub inclusion: Vec<u64>,
    #[serde(default)]
    pub exclusion: Vec<u64>,
    #[serde(default)]
    pub rewrite: Vec<Value>,
    #[serde(default)]
    pub preferred: Vec<u64>,
    #[serde(rename = "permittedRids", default)]
    pub permitted_rids: Vec<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TalkgroupSource {
    #[serde(default)]
    pub tgid: u64,
    #[serde(default)]
    pub slot: u8,
}

impl TalkgroupRules {
    pub fn total_talkgroups(&self) -> usize {
        self.group_voice.len()
    }
}

fn id_list(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TalkgroupRule {
    pub fn alias_label(&self) -> &str {
        self.alias.as_deref().unwrap_or("")
    }

    pub fn inclusion_label(&self) -> String {
        id_list(&self.config.inclusion)
    }

    pub fn exclusion_label(&self) -> String {
        id_list(&self.config.exclusion)
    }

    pub fn preferred_label(&self) -> String {
        id_list(&self.config.preferred)
    }

    pub fn permitted_rids_label(&self) -> String {
        id_list(&self.config.permitted_rids)
    }
}
