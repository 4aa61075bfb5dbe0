use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::database::inclusions_repo;
use crate::models::PeerMapInclusionRow;
use crate::web::middleware::auth::CurrentUser;
use crate::web::{notice_redirect, render, AppState, NoticeQuery, PageContext};

#[derive(Template)]
#[template(path = "peer_map_inclusions.html")]
pub struct InclusionsTemplate {
    pub page: PageContext,
    pub inclusions: Vec<PeerMapInclusionRow>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddInclusionForm {
    #[serde(rename = "PeerMapInclusions")]
    pub peer_id: String,
}

pub async fn list_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<NoticeQuery>,
) -> Response {
    match inclusions_repo::list_inclusions(&state.pool).await {
        Ok(inclusions) => render(&InclusionsTemplate {
            page: PageContext::new(&state, &current),
            inclusions,
            error: query.error,
        }),
        Err(e) => {
            error!("Listing inclusions failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error retrieving inclusions").into_response()
        }
    }
}

pub async fn add_handler(State(state): State<AppState>, Form(form): Form<AddInclusionForm>) -> Response {
    let peer_id = form.peer_id.trim();
    if peer_id.is_empty() {
        return Redirect::to(&notice_redirect("/peerMapInclusions", "error", "Peer id is required"))
            .into_response();
    }

    match inclusions_repo::add_inclusion(&state.pool, peer_id).await {
        Ok(id) => {
            info!(id, peer_id, "Peer map inclusion added");
            Redirect::to("/peerMapInclusions").into_response()
        }
        Err(e) => {
            error!("Adding inclusion {} failed: {}", peer_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error adding PeerMapInclusion").into_response()
        }
    }
}

pub async fn delete_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match inclusions_repo::delete_inclusion(&state.pool, id).await {
        Ok(_) => Redirect::to("/peerMapInclusions").into_response(),
        Err(e) => {
            error!("Deleting inclusion {} failed: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error deleting PeerMapInclusion").into_response()
        }
    }
}
