use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::fne_peer::PeerId;

/// One radio affiliated to a talkgroup through a peer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Affiliation {
    #[serde(rename = "srcId", default, deserialize_with = "lenient_id")]
    pub src_id: Option<u64>,
    #[serde(rename = "dstId", default, deserialize_with = "lenient_id")]
    pub dst_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PeerAffiliations {
    #[serde(rename = "peerId")]
    pub peer_id: PeerId,
    #[serde(default)]
    pub affiliations: Vec<Affiliation>,
}

/// Body of `GET /report-affiliations`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AffiliationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliations: Option<Vec<PeerAffiliations>>,
}

impl AffiliationReport {
    pub fn total_affiliations(&self) -> usize {
        self.affiliations
            .iter()
            .flatten()
            .map(|p| p.affiliations.len())
            .sum()
    }
}

/// One radio ID from the FNE access-control list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RidEntry {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub alias: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `GET /rid/query`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RidList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rids: Option<Vec<RidEntry>>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_affiliation_report() {
        let raw = r#"{
            "status": 200,
            "affiliations": [
                { "peerId": 9000123, "affiliations": [ { "srcId": 3112001, "dstId": 31665 }, { "srcId": "3112002", "dstId": 9 } ] },
                { "peerId": 9000124 }
            ]
        }"#;
        let report: AffiliationReport = serde_json::from_str(raw).unwrap();
        let peers = report.affiliations.as_ref().unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].affiliations[1].src_id, Some(3112002));
        assert!(peers[1].affiliations.is_empty());
        assert_eq!(report.total_affiliations(), 2);
    }

    #[test]
    fn parses_rid_acl() {
        let raw = r#"{ "status": 200, "rids": [ { "id": 3112001, "enabled": true, "alias": "KO4UYJ" }, { "id": 3112002 } ] }"#;
        let list: RidList = serde_json::from_str(raw).unwrap();
        let rids = list.rids.unwrap();
        assert_eq!(rids[0].alias, "KO4UYJ");
        assert!(rids[0].enabled);
        assert!(!rids[1].enabled);
    }
}
