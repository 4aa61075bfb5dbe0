use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::warn;

use crate::models::{Peer, PeerAffiliations};
use crate::web::middleware::auth::CurrentUser;
use crate::web::{render, AppState, PageContext};

#[derive(Template)]
#[template(path = "peer_list.html")]
pub struct PeerListTemplate {
    pub page: PageContext,
    pub peers: Vec<Peer>,
}

pub async fn peer_list_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let peers = match state.fne.fetch_peer_list().await {
        Ok(list) => list.peers,
        Err(e) => {
            warn!("FNE peer list failed: {}", e);
            None
        }
    };

    let Some(peers) = peers else {
        return (StatusCode::BAD_GATEWAY, "Error getting peer list").into_response();
    };

    render(&PeerListTemplate {
        page: PageContext::new(&state, &current),
        peers,
    })
}

#[derive(Template)]
#[template(path = "affiliation_list.html")]
pub struct AffiliationListTemplate {
    pub page: PageContext,
    pub peers: Vec<PeerAffiliations>,
    pub total: usize,
}

pub async fn affiliation_list_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let report = match state.fne.fetch_affiliations().await {
        Ok(report) => report,
        Err(e) => {
            warn!("FNE affiliation list failed: {}", e);
            return (StatusCode::BAD_GATEWAY, "Error getting affiliation list").into_response();
        }
    };

    let total = report.total_affiliations();
    let Some(peers) = report.affiliations else {
        return (StatusCode::BAD_GATEWAY, "Error getting affiliation list").into_response();
    };

    render(&AffiliationListTemplate {
        page: PageContext::new(&state, &current),
        peers,
        total,
    })
}

pub async fn status_handler(State(state): State<AppState>) -> Response {
    match state.fne.fetch_status().await {
        Ok(status) => Json(status).into_response(),
        Err(e) => {
            warn!("FNE status failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string(), "status": 502 })),
            )
                .into_response()
        }
    }
}
