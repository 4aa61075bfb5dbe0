use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use tracing::{error, warn};

use crate::error::PeerMapError;
use crate::models::PeerMapInclusionRow;
use crate::services::peer_map_service::{self, GroupedLocation};
use crate::web::middleware::auth::CurrentUser;
use crate::web::{render, AppState, PageContext};

#[derive(Template)]
#[template(path = "peer_map.html")]
pub struct PeerMapTemplate {
    pub page: PageContext,
    pub locations: Vec<GroupedLocation>,
    pub inclusions: Vec<PeerMapInclusionRow>,
    pub markers_json: String,
}

pub async fn peer_map_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let map = match peer_map_service::load_peer_map(
        state.fne.as_ref(),
        &state.pool,
        current.is_authenticated(),
    )
    .await
    {
        Ok(map) => map,
        Err(e) => return peer_map_error_response(&e),
    };

    let markers_json = markers_json(&map.locations);
    render(&PeerMapTemplate {
        page: PageContext::new(&state, &current),
        locations: map.locations,
        inclusions: map.inclusions,
        markers_json,
    })
}

pub fn peer_map_error_response(err: &PeerMapError) -> Response {
    match err {
        PeerMapError::UpstreamFetch(_) | PeerMapError::MissingPeerList => {
            warn!("Peer map unavailable: {}", err);
            (StatusCode::BAD_GATEWAY, "Error getting peer list").into_response()
        }
        PeerMapError::InclusionLookup(_) => {
            error!("Peer map unavailable: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving inclusions").into_response()
        }
    }
}

/// Marker data for the map script. `<` is escaped so peer-supplied labels
/// cannot close the surrounding `<script>` element.
fn markers_json(locations: &[GroupedLocation]) -> String {
    let markers: Vec<serde_json::Value> = locations
        .iter()
        .map(|l| {
            serde_json::json!({
                "lat": l.latitude,
                "lng": l.longitude,
                "location": l.location_label(),
                "peers": l.peers.iter().map(|p| serde_json::json!({
                    "peerId": p.peer_id.as_key(),
                    "identity": p.identity(),
                    "software": p.software(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    serde_json::to_string(&markers)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Peer, PeerInfo};
    use crate::services::peer_map_service::build_peer_map;

    #[test]
    fn markers_escape_script_breakouts() {
        let mut peer = Peer::new(1);
        peer.config.identity = Some("</script><b>".to_string());
        peer.config.info = Some(PeerInfo {
            latitude: Some(1.0),
            longitude: Some(2.0),
            location: Some("Town".to_string()),
            ..PeerInfo::default()
        });
        let map = build_peer_map(&[peer], vec![], true);
        let json = markers_json(&map.locations);
        assert!(!json.contains('<'));
        assert!(json.contains("\\u003c/script>"));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["lat"], "1.0000");
        assert_eq!(parsed[0]["peers"][0]["identity"], "</script><b>");
    }
}
