//! Peer map: groups FNE peers into map markers by rounded coordinate and
//! hides peers that are not on the inclusion list from anonymous viewers.

use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::warn;

use crate::database::inclusions_repo;
use crate::error::PeerMapError;
use crate::models::{Peer, PeerMapInclusionRow};
use crate::services::fne_client::FneSource;

const FIXED_SCALE: u64 = 10_000;

/// A coordinate rounded to four decimal places (~11 m), held as
/// ten-thousandths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedCoord(i64);

impl FixedCoord {
    /// Rounds half away from zero on the exact decimal value of `value`, so a
    /// tie such as `35.03125` becomes `35.0313`. Non-finite or absurd values
    /// yield `None`.
    pub fn from_degrees(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        // Every finite f64 has a terminating expansion within this many digits.
        let exact = format!("{:.1074}", value.abs());
        let (whole, fraction) = exact.split_once('.')?;
        let whole: i64 = whole.parse().ok()?;
        let kept: i64 = fraction.get(..4)?.parse().ok()?;
        let round_up = fraction.as_bytes().get(4).is_some_and(|d| *d >= b'5');

        let magnitude = whole
            .checked_mul(FIXED_SCALE as i64)?
            .checked_add(kept + i64::from(round_up))?;
        Some(Self(if value.is_sign_negative() {
            -magnitude
        } else {
            magnitude
        }))
    }
}

impl fmt::Display for FixedCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:04}", sign, abs / FIXED_SCALE, abs % FIXED_SCALE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    pub latitude: FixedCoord,
    pub longitude: FixedCoord,
}

impl CoordinateKey {
    pub fn from_degrees(latitude: f64, longitude: f64) -> Option<Self> {
        Some(Self {
            latitude: FixedCoord::from_degrees(latitude)?,
            longitude: FixedCoord::from_degrees(longitude)?,
        })
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// One map marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedLocation {
    pub key: String,
    pub latitude: String,
    pub longitude: String,
    pub location: Option<String>,
    pub peers: Vec<Peer>,
}

impl GroupedLocation {
    fn new(key: CoordinateKey, location: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            latitude: key.latitude.to_string(),
            longitude: key.longitude.to_string(),
            location,
            peers: Vec::new(),
        }
    }

    pub fn location_label(&self) -> &str {
        self.location.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerMap {
    pub locations: Vec<GroupedLocation>,
    pub inclusions: Vec<PeerMapInclusionRow>,
}

impl PeerMap {
    pub fn peer_count(&self) -> usize {
        self.locations.iter().map(|l| l.peers.len()).sum()
    }
}

// Insertion-ordered grouping keyed by rounded coordinate.
#[derive(Default)]
struct LocationGroups {
    index: HashMap<CoordinateKey, usize>,
    groups: Vec<GroupedLocation>,
}

impl LocationGroups {
    fn push(&mut self, key: CoordinateKey, peer: &Peer) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                // first location label seen for a key wins
                let location = peer.info().and_then(|i| i.location.clone());
                self.groups.push(GroupedLocation::new(key, location));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].peers.push(peer.clone());
    }

    fn into_locations(self) -> Vec<GroupedLocation> {
        self.groups
    }
}

pub fn inclusion_set(inclusions: &[PeerMapInclusionRow]) -> HashSet<String> {
    inclusions
        .iter()
        .map(|row| row.peer_id.trim().to_string())
        .collect()
}

/// Builds the map view model. Anonymous viewers only see included peers;
/// peers without both coordinates are skipped with a warning.
pub fn build_peer_map(
    peers: &[Peer],
    inclusions: Vec<PeerMapInclusionRow>,
    authenticated: bool,
) -> PeerMap {
    let allowed = inclusion_set(&inclusions);
    let mut groups = LocationGroups::default();

    let visible = peers
        .iter()
        .filter(|peer| authenticated || allowed.contains(&peer.peer_id.as_key()));

    for peer in visible {
        let key = peer
            .coordinates()
            .and_then(|(lat, lng)| CoordinateKey::from_degrees(lat, lng));
        let Some(key) = key else {
            warn!("Skipped peer with incomplete info: {}", peer.peer_id);
            continue;
        };
        groups.push(key, peer);
    }

    PeerMap {
        locations: groups.into_locations(),
        inclusions,
    }
}

/// Fetches the roster and the inclusion list, then builds the map. Fails
/// closed: if the inclusion list cannot be read nothing is rendered.
pub async fn load_peer_map(
    source: &dyn FneSource,
    pool: &SqlitePool,
    authenticated: bool,
) -> Result<PeerMap, PeerMapError> {
    let (peer_list, inclusions) = tokio::join!(
        source.fetch_peer_list(),
        inclusions_repo::list_inclusions(pool)
    );

    let peers = peer_list?.peers.ok_or(PeerMapError::MissingPeerList)?;
    let inclusions = inclusions.map_err(PeerMapError::InclusionLookup)?;

    Ok(build_peer_map(&peers, inclusions, authenticated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::error::FneError;
    use crate::models::{AffiliationReport, PeerId, PeerInfo, PeerList, RidList};
    use async_trait::async_trait;
    use serde_json::Value;

    fn peer(id: u64, lat: Option<f64>, lng: Option<f64>, location: &str) -> Peer {
        let mut p = Peer::new(id);
        p.config.info = Some(PeerInfo {
            latitude: lat,
            longitude: lng,
            location: Some(location.to_string()),
            ..PeerInfo::default()
        });
        p
    }

    fn inclusion(id: i64, peer_id: &str) -> PeerMapInclusionRow {
        PeerMapInclusionRow {
            id,
            peer_id: peer_id.to_string(),
        }
    }

    fn ids(location: &GroupedLocation) -> Vec<String> {
        location.peers.iter().map(|p| p.peer_id.as_key()).collect()
    }

    fn sample_pair() -> Vec<Peer> {
        vec![
            peer(1, Some(35.12341), Some(-80.50001), "Charlotte"),
            peer(2, Some(35.12339), Some(-80.50002), "Charlotte North"),
        ]
    }

    #[test]
    fn fixed_coord_rounds_to_four_places() {
        assert_eq!(FixedCoord::from_degrees(35.12341).unwrap().to_string(), "35.1234");
        assert_eq!(FixedCoord::from_degrees(-80.50001).unwrap().to_string(), "-80.5000");
        assert_eq!(FixedCoord::from_degrees(0.0).unwrap().to_string(), "0.0000");
        assert_eq!(FixedCoord::from_degrees(-0.00001).unwrap().to_string(), "0.0000");
        assert_eq!(FixedCoord::from_degrees(-0.5).unwrap().to_string(), "-0.5000");
        assert_eq!(FixedCoord::from_degrees(179.99999).unwrap().to_string(), "180.0000");
        assert!(FixedCoord::from_degrees(f64::NAN).is_none());
        assert!(FixedCoord::from_degrees(f64::INFINITY).is_none());
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(FixedCoord::from_degrees(35.03125).unwrap().to_string(), "35.0313");
        assert_eq!(FixedCoord::from_degrees(-0.03125).unwrap().to_string(), "-0.0313");
        assert_eq!(FixedCoord::from_degrees(0.00005).unwrap().to_string(), "0.0001");
        // the stored doubles sit just off the tie
        assert_eq!(FixedCoord::from_degrees(1.00005).unwrap().to_string(), "1.0001");
        assert_eq!(FixedCoord::from_degrees(2.00005).unwrap().to_string(), "2.0000");
        assert_eq!(
            CoordinateKey::from_degrees(35.03125, -80.03125).unwrap().to_string(),
            "35.0313,-80.0313"
        );
    }

    #[test]
    fn authenticated_view_groups_nearby_peers() {
        let map = build_peer_map(&sample_pair(), vec![], true);
        assert_eq!(map.locations.len(), 1);
        let group = &map.locations[0];
        assert_eq!(group.key, "35.1234,-80.5000");
        assert_eq!(group.latitude, "35.1234");
        assert_eq!(group.longitude, "-80.5000");
        assert_eq!(ids(group), vec!["1", "2"]);
    }

    #[test]
    fn anonymous_view_only_shows_included_peers() {
        let map = build_peer_map(&sample_pair(), vec![inclusion(1, "1")], false);
        assert_eq!(map.locations.len(), 1);
        assert_eq!(map.locations[0].key, "35.1234,-80.5000");
        assert_eq!(ids(&map.locations[0]), vec!["1"]);
    }

    #[test]
    fn anonymous_view_with_no_inclusions_is_empty() {
        let map = build_peer_map(&sample_pair(), vec![], false);
        assert!(map.locations.is_empty());
    }

    #[test]
    fn authenticated_view_ignores_inclusions() {
        let map = build_peer_map(&sample_pair(), vec![inclusion(1, "2")], true);
        assert_eq!(map.peer_count(), 2);
    }

    #[test]
    fn inclusion_ids_are_trimmed_on_both_sides() {
        let mut padded = Peer::new(PeerId::Text(" 7 ".to_string()));
        padded.config.info = Some(PeerInfo {
            latitude: Some(1.0),
            longitude: Some(2.0),
            ..PeerInfo::default()
        });
        let map = build_peer_map(&[padded], vec![inclusion(1, "  7\t")], false);
        assert_eq!(map.peer_count(), 1);
    }

    #[test]
    fn peers_missing_a_coordinate_are_skipped() {
        let peers = vec![
            peer(1, Some(35.0), None, "no lng"),
            peer(2, None, Some(-80.0), "no lat"),
            Peer::new(3),
            peer(4, Some(35.0), Some(-80.0), "ok"),
        ];
        let map = build_peer_map(&peers, vec![], true);
        assert_eq!(map.locations.len(), 1);
        assert_eq!(ids(&map.locations[0]), vec!["4"]);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn skipped_peers_are_logged_by_id() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let map = tracing::subscriber::with_default(subscriber, || {
            let peers = vec![peer(1, Some(35.0), Some(-80.0), "ok"), Peer::new(9000777)];
            build_peer_map(&peers, vec![], true)
        });
        assert_eq!(map.peer_count(), 1);

        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("WARN"));
        assert!(logged.contains("Skipped peer with incomplete info: 9000777"));
    }

    #[test]
    fn zero_is_a_valid_coordinate() {
        let map = build_peer_map(&[peer(1, Some(0.0), Some(0.0), "Null Island")], vec![], true);
        assert_eq!(map.locations.len(), 1);
        assert_eq!(map.locations[0].key, "0.0000,0.0000");
    }

    #[test]
    fn groups_partition_peers_in_first_seen_order() {
        let peers = vec![
            peer(1, Some(10.0), Some(10.0), "A"),
            peer(2, Some(20.0), Some(20.0), "B"),
            peer(3, Some(10.00001), Some(9.99999), "A2"),
            peer(4, Some(30.0), Some(30.0), "C"),
            peer(5, Some(20.00004), Some(20.0), "B2"),
        ];
        let map = build_peer_map(&peers, vec![], true);

        let keys: Vec<&str> = map.locations.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["10.0000,10.0000", "20.0000,20.0000", "30.0000,30.0000"]);
        assert_eq!(ids(&map.locations[0]), vec!["1", "3"]);
        assert_eq!(ids(&map.locations[1]), vec!["2", "5"]);
        assert_eq!(ids(&map.locations[2]), vec!["4"]);

        let unique: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
        assert_eq!(map.peer_count(), peers.len());
    }

    #[test]
    fn first_location_label_wins() {
        let map = build_peer_map(&sample_pair(), vec![], true);
        assert_eq!(map.locations[0].location_label(), "Charlotte");
    }

    #[test]
    fn building_twice_gives_identical_output() {
        let peers = vec![
            peer(1, Some(10.0), Some(10.0), "A"),
            peer(2, Some(20.0), Some(20.0), "B"),
            peer(3, Some(10.0), Some(10.0), "A"),
        ];
        let rows = vec![inclusion(1, "1"), inclusion(2, "3")];
        let first = build_peer_map(&peers, rows.clone(), false);
        let second = build_peer_map(&peers, rows.clone(), false);
        assert_eq!(first, second);
        assert_eq!(first.inclusions, rows);
    }

    struct FakeSource {
        result: fn() -> Result<PeerList, FneError>,
    }

    #[async_trait]
    impl FneSource for FakeSource {
        async fn fetch_peer_list(&self) -> Result<PeerList, FneError> {
            (self.result)()
        }

        async fn fetch_status(&self) -> Result<Value, FneError> {
            Ok(Value::Null)
        }

        async fn fetch_stats(&self) -> Result<Value, FneError> {
            Ok(Value::Null)
        }

        async fn fetch_affiliations(&self) -> Result<AffiliationReport, FneError> {
            Ok(AffiliationReport::default())
        }

        async fn fetch_rid_acl(&self) -> Result<RidList, FneError> {
            Ok(RidList::default())
        }
    }

    fn roster() -> Result<PeerList, FneError> {
        Ok(PeerList {
            status: Some(200),
            peers: Some(vec![
                peer(9000123, Some(35.12341), Some(-80.50001), "Charlotte"),
                peer(9000124, Some(36.0), Some(-81.0), "Boone"),
            ]),
        })
    }

    #[tokio::test]
    async fn load_filters_with_stored_inclusions() {
        let pool = memory_pool().await;
        inclusions_repo::add_inclusion(&pool, "9000124").await.unwrap();

        let source = FakeSource { result: roster };
        let map = load_peer_map(&source, &pool, false).await.unwrap();
        assert_eq!(map.locations.len(), 1);
        assert_eq!(map.locations[0].location_label(), "Boone");
        assert_eq!(map.inclusions.len(), 1);

        let full = load_peer_map(&source, &pool, true).await.unwrap();
        assert_eq!(full.peer_count(), 2);
    }

    fn mixed_roster() -> Result<PeerList, FneError> {
        Ok(serde_json::from_str(
            r#"{
                "status": 200,
                "peers": [
                    { "peerId": 1, "config": { "info": { "latitude": 35.0, "longitude": -80.0, "location": "Charlotte" } } },
                    { "peerId": 2, "port": "62031", "config": { "info": { "latitude": 36.0, "longitude": -81.0, "location": 12345 } } },
                    { "peerId": { "bad": true } }
                ]
            }"#,
        )?)
    }

    #[tokio::test]
    async fn one_malformed_peer_does_not_blank_the_map() {
        let pool = memory_pool().await;
        let source = FakeSource {
            result: mixed_roster,
        };
        let map = load_peer_map(&source, &pool, true).await.unwrap();
        assert_eq!(map.locations.len(), 2);
        assert_eq!(map.locations[1].location_label(), "12345");
    }

    #[tokio::test]
    async fn load_reports_upstream_failure() {
        let pool = memory_pool().await;
        let source = FakeSource {
            result: || Err(FneError::AuthRejected),
        };
        let err = load_peer_map(&source, &pool, true).await.unwrap_err();
        assert!(matches!(err, PeerMapError::UpstreamFetch(_)));
    }

    #[tokio::test]
    async fn load_reports_missing_peer_list() {
        let pool = memory_pool().await;
        let source = FakeSource {
            result: || Ok(PeerList::default()),
        };
        let err = load_peer_map(&source, &pool, true).await.unwrap_err();
        assert!(matches!(err, PeerMapError::MissingPeerList));
    }

    #[tokio::test]
    async fn load_fails_closed_when_inclusions_are_unreadable() {
        let pool = memory_pool().await;
        sqlx::query("DROP TABLE peer_map_inclusions")
            .execute(&pool)
            .await
            .unwrap();

        let source = FakeSource { result: roster };
        let err = load_peer_map(&source, &pool, false).await.unwrap_err();
        assert!(matches!(err, PeerMapError::InclusionLookup(_)));
    }
}
